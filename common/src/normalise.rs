//! Package-name and version normalisation.
//!
//! Every function here is pure: it returns the normalised value together with
//! the original input and the rule that forced a change, and leaves it to the
//! caller to decide how to surface the change (the packager logs a warning per
//! modifying pass).

use crate::grammar::{PACKAGE_NAME, VERSION};
use std::fmt;

/// The identifier a [`Normalised`] value was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The package name.
    PackageName,
    /// The package version.
    Version,
}

impl Field {
    /// Human-readable field name used in warnings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PackageName => "package name",
            Self::Version => "version",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The grammar rule an input violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// The package name contained characters outside [`PACKAGE_NAME`].
    PackageNameCharset,
    /// The version contained `-`, which orders a pre-release after its release.
    VersionDash,
    /// The version contained characters outside [`VERSION`].
    VersionCharset,
}

impl Rule {
    /// Human-readable description of the violated rule.
    #[must_use]
    pub fn description(self) -> String {
        match self {
            Self::PackageNameCharset => format!(
                "package names may only contain {}; other characters were replaced with '{}'",
                PACKAGE_NAME.name(),
                PACKAGE_NAME.filler()
            ),
            Self::VersionDash => concat!(
                "'-' sorts a pre-release as newer than its release; ",
                "each '-' was replaced with '~'"
            )
            .to_owned(),
            Self::VersionCharset => format!(
                "versions may only contain {}; other characters were replaced with '{}'",
                VERSION.name(),
                VERSION.filler()
            ),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Outcome of one normalisation pass.
///
/// `original` always holds the raw, caller-supplied value so that warnings
/// can reference it even for later passes of a multi-pass normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalised {
    field: Field,
    original: String,
    value: String,
    rule: Option<Rule>,
}

impl Normalised {
    fn unchanged(field: Field, original: &str, value: String) -> Self {
        Self {
            field,
            original: original.to_owned(),
            value,
            rule: None,
        }
    }

    fn changed(field: Field, original: &str, value: String, rule: Rule) -> Self {
        Self {
            field,
            original: original.to_owned(),
            value,
            rule: Some(rule),
        }
    }

    /// The field this value belongs to.
    #[must_use]
    pub const fn field(&self) -> Field {
        self.field
    }

    /// The raw value supplied by the caller.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The normalised value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this pass altered its input.
    #[must_use]
    pub const fn was_modified(&self) -> bool {
        self.rule.is_some()
    }

    /// The rule that forced the change, if any.
    #[must_use]
    pub const fn rule(&self) -> Option<Rule> {
        self.rule
    }

    /// Consume the result and return the normalised value.
    #[must_use]
    pub fn into_value(self) -> String {
        self.value
    }
}

/// Normalise a package name into [`PACKAGE_NAME`].
///
/// Names already in the grammar are returned unchanged. Anything else is
/// lowercased and each run of disallowed characters becomes a single `-`.
///
/// # Examples
///
/// ```
/// use omnibus_docker_common::normalise::normalise_package_name;
///
/// let name = normalise_package_name("My_Cool_App!!");
/// assert_eq!(name.value(), "my-cool-app-");
/// assert!(name.was_modified());
/// ```
#[must_use]
pub fn normalise_package_name(raw: &str) -> Normalised {
    if PACKAGE_NAME.matches(raw) {
        return Normalised::unchanged(Field::PackageName, raw, raw.to_owned());
    }

    let converted = PACKAGE_NAME.collapse(&raw.to_lowercase());
    if converted == raw {
        Normalised::unchanged(Field::PackageName, raw, converted)
    } else {
        Normalised::changed(Field::PackageName, raw, converted, Rule::PackageNameCharset)
    }
}

/// Both passes of a version normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNormalisation {
    dash: Normalised,
    charset: Normalised,
}

impl VersionNormalisation {
    /// The dash pass (`-` to `~`).
    #[must_use]
    pub const fn dash(&self) -> &Normalised {
        &self.dash
    }

    /// The grammar pass applied to the dash pass output.
    #[must_use]
    pub const fn charset(&self) -> &Normalised {
        &self.charset
    }

    /// The final normalised version.
    #[must_use]
    pub fn value(&self) -> &str {
        self.charset.value()
    }

    /// The raw version supplied by the caller.
    #[must_use]
    pub fn original(&self) -> &str {
        self.dash.original()
    }

    /// Whether either pass altered the version.
    #[must_use]
    pub const fn was_modified(&self) -> bool {
        self.dash.was_modified() || self.charset.was_modified()
    }

    /// Both passes in the order they ran.
    pub fn passes(&self) -> impl Iterator<Item = &Normalised> {
        [&self.dash, &self.charset].into_iter()
    }

    /// Consume the result and return the final normalised version.
    #[must_use]
    pub fn into_value(self) -> String {
        self.charset.into_value()
    }
}

/// Normalise a version string in two passes.
///
/// The dash pass replaces every `-` with `~` so pre-releases sort before the
/// release they precede. The grammar pass then collapses each run of
/// characters outside [`VERSION`] into a single `_`. Each pass records its
/// own modification flag; both report the raw version as their original.
///
/// # Examples
///
/// ```
/// use omnibus_docker_common::normalise::normalise_version;
///
/// let version = normalise_version("12.0.0-rc.6");
/// assert_eq!(version.dash().value(), "12.0.0~rc.6");
/// assert_eq!(version.value(), "12.0.0~rc.6");
/// assert!(version.dash().was_modified());
/// assert!(!version.charset().was_modified());
/// ```
#[must_use]
pub fn normalise_version(raw: &str) -> VersionNormalisation {
    let dash = if raw.contains('-') {
        Normalised::changed(Field::Version, raw, raw.replace('-', "~"), Rule::VersionDash)
    } else {
        Normalised::unchanged(Field::Version, raw, raw.to_owned())
    };

    let dashed = dash.value();
    let charset = if VERSION.matches(dashed) {
        Normalised::unchanged(Field::Version, raw, dashed.to_owned())
    } else {
        let converted = VERSION.collapse(dashed);
        if converted == dashed {
            Normalised::unchanged(Field::Version, raw, converted)
        } else {
            Normalised::changed(Field::Version, raw, converted, Rule::VersionCharset)
        }
    };

    VersionNormalisation { dash, charset }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::already_valid("libfoo+bar-1.0", "libfoo+bar-1.0", false)]
    #[case::uppercase("MyApp", "myapp", true)]
    #[case::collapsing("My_Cool_App!!", "my-cool-app-", true)]
    #[case::underscore("foo_bar", "foo-bar", true)]
    #[case::empty("", "", false)]
    fn package_name_cases(#[case] raw: &str, #[case] expected: &str, #[case] modified: bool) {
        let result = normalise_package_name(raw);
        assert_eq!(result.value(), expected);
        assert_eq!(result.was_modified(), modified);
        assert_eq!(result.original(), raw);
        assert_eq!(result.field(), Field::PackageName);
    }

    #[test]
    fn package_name_change_records_rule() {
        let result = normalise_package_name("Foo Bar");
        assert_eq!(result.rule(), Some(Rule::PackageNameCharset));
    }

    #[test]
    fn dash_pass_replaces_every_dash_without_collapsing() {
        let result = normalise_version("1.0--rc-1");
        assert_eq!(result.dash().value(), "1.0~~rc~1");
        assert_eq!(result.value(), "1.0~~rc~1");
        assert!(!result.charset().was_modified());
    }

    #[test]
    fn charset_pass_reports_raw_original() {
        let result = normalise_version("1.0-beta 2");
        assert_eq!(result.dash().value(), "1.0~beta 2");
        assert_eq!(result.charset().value(), "1.0~beta_2");
        assert_eq!(result.charset().original(), "1.0-beta 2");
        assert_eq!(result.charset().rule(), Some(Rule::VersionCharset));
        assert_eq!(result.passes().filter(|p| p.was_modified()).count(), 2);
    }

    #[test]
    fn valid_version_is_untouched() {
        let result = normalise_version("2:1.2.3+git~1");
        assert_eq!(result.value(), "2:1.2.3+git~1");
        assert!(!result.was_modified());
    }

    #[test]
    fn filler_in_input_is_not_reported_as_change() {
        let result = normalise_version("1.0_beta");
        assert_eq!(result.value(), "1.0_beta");
        assert!(!result.was_modified());
    }

    #[rstest]
    #[case::package_name(Rule::PackageNameCharset, "package names")]
    #[case::dash(Rule::VersionDash, "pre-release")]
    #[case::charset(Rule::VersionCharset, "versions")]
    fn rule_descriptions_are_readable(#[case] rule: Rule, #[case] fragment: &str) {
        assert!(rule.to_string().contains(fragment));
    }
}
