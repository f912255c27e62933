//! Allow-list grammars for package identifiers.
//!
//! A [`Grammar`] names the characters an identifier may contain and the filler
//! used when a run of anything else has to be replaced. Normalisation never
//! deletes disallowed characters outright: each maximal run collapses to one
//! filler so that `foo_bar` becomes `foo-bar` rather than `foobar`.

/// An allow-listed character set plus the filler that replaces disallowed runs.
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    name: &'static str,
    allows: fn(char) -> bool,
    filler: char,
}

/// Package names: lowercase ASCII letters, digits, `.`, `+` and `-`.
pub const PACKAGE_NAME: Grammar = Grammar {
    name: "lowercase letters, digits, '.', '+' and '-'",
    allows: is_package_name_char,
    filler: '-',
};

/// Versions: ASCII letters of either case, digits, `.`, `+`, `:` and `~`.
pub const VERSION: Grammar = Grammar {
    name: "letters, digits, '.', '+', ':' and '~'",
    allows: is_version_char,
    filler: '_',
};

/// Image repository names as accepted by OCI image references.
pub const IMAGE_REPOSITORY: Grammar = Grammar {
    name: "lowercase letters, digits, '.', '_' and '-'",
    allows: is_repository_char,
    filler: '-',
};

/// Image tags as accepted by OCI image references.
pub const IMAGE_TAG: Grammar = Grammar {
    name: "letters, digits, '.', '_' and '-'",
    allows: is_tag_char,
    filler: '_',
};

const fn is_package_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '+' | '-')
}

const fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | ':' | '~')
}

const fn is_repository_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
}

const fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

impl Grammar {
    /// Human-readable description of the allowed characters.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The character substituted for each run of disallowed characters.
    #[must_use]
    pub const fn filler(&self) -> char {
        self.filler
    }

    /// Return `true` if `c` belongs to the grammar.
    #[must_use]
    pub fn allows(&self, c: char) -> bool {
        (self.allows)(c)
    }

    /// Return `true` if every character of `value` belongs to the grammar.
    ///
    /// The empty string matches vacuously.
    ///
    /// # Examples
    ///
    /// ```
    /// use omnibus_docker_common::grammar::PACKAGE_NAME;
    ///
    /// assert!(PACKAGE_NAME.matches("libfoo+bar-1.0"));
    /// assert!(!PACKAGE_NAME.matches("LibFoo"));
    /// ```
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        value.chars().all(self.allows)
    }

    /// Replace every maximal run of disallowed characters with one filler.
    ///
    /// The output contains only allowed characters and the filler.
    ///
    /// # Examples
    ///
    /// ```
    /// use omnibus_docker_common::grammar::PACKAGE_NAME;
    ///
    /// assert_eq!(PACKAGE_NAME.collapse("my__app!!"), "my-app-");
    /// ```
    #[must_use]
    pub fn collapse(&self, value: &str) -> String {
        let mut collapsed = String::with_capacity(value.len());
        let mut in_run = false;

        for c in value.chars() {
            if self.allows(c) {
                collapsed.push(c);
                in_run = false;
            } else if !in_run {
                collapsed.push(self.filler);
                in_run = true;
            }
        }

        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::underscore("foo_bar", "foo-bar")]
    #[case::long_run("a!@#$b", "a-b")]
    #[case::leading_and_trailing("  a  ", "-a-")]
    #[case::unicode("caf\u{e9}", "caf-")]
    #[case::empty("", "")]
    fn package_name_collapse(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(PACKAGE_NAME.collapse(input), expected);
    }

    #[rstest]
    #[case::space("1.0 beta", "1.0_beta")]
    #[case::slashes("1.0//2", "1.0_2")]
    #[case::all_disallowed("@@@", "_")]
    fn version_collapse(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(VERSION.collapse(input), expected);
    }

    #[test]
    fn filler_is_not_always_part_of_the_grammar() {
        assert!(PACKAGE_NAME.allows(PACKAGE_NAME.filler()));
        assert!(!VERSION.allows(VERSION.filler()));
    }

    #[test]
    fn empty_string_matches_every_grammar() {
        for grammar in [PACKAGE_NAME, VERSION, IMAGE_REPOSITORY, IMAGE_TAG] {
            assert!(grammar.matches(""), "{} rejected empty input", grammar.name());
        }
    }
}
