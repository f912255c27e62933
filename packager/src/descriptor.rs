//! Build-descriptor rendering.
//!
//! The descriptor is a Dockerfile rendered with `tera` into the staging root.
//! Undefined template variables are rendering errors, never empty output.
//! Templates may pipe values through the `label` filter to embed them in a
//! double-quoted `LABEL` value.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error as _;
use std::fs;
use tera::{Context, Tera, Value, from_value};

/// Filename of the rendered descriptor inside the staging root.
pub const DESCRIPTOR_FILENAME: &str = "Dockerfile";

/// Name reported for the template bundled with the crate.
pub const BUILT_IN_TEMPLATE: &str = "<built-in>";

const DEFAULT_TEMPLATE: &str = include_str!("../templates/Dockerfile.tera");

/// Values made available to the descriptor template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorContext {
    /// Normalised package name.
    pub package_name: String,
    /// Normalised version.
    pub version: String,
    /// Build iteration.
    pub iteration: String,
    /// Target architecture.
    pub architecture: String,
    /// Absolute install directory.
    pub install_dir: Utf8PathBuf,
    /// Install directory relative to the staging root.
    pub install_root: Utf8PathBuf,
    /// Staged extra files, relative to the staging root.
    pub extra_files: Vec<Utf8PathBuf>,
    /// Package vendor.
    pub vendor: String,
    /// Package license.
    pub license: String,
    /// Package priority.
    pub priority: String,
    /// Package section.
    pub section: String,
    /// Image reference passed to the build tool.
    pub image_tag: String,
    /// Artefact filename.
    pub artefact_name: String,
}

/// Where the descriptor template comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource<'a> {
    /// The template bundled with the crate.
    BuiltIn,
    /// A template file on disk.
    File(&'a Utf8Path),
}

impl<'a> TemplateSource<'a> {
    /// Use `path` when given, otherwise the bundled template.
    #[must_use]
    pub fn from_option(path: Option<&'a Utf8Path>) -> Self {
        path.map_or(Self::BuiltIn, Self::File)
    }

    fn label(self) -> String {
        match self {
            Self::BuiltIn => BUILT_IN_TEMPLATE.to_owned(),
            Self::File(path) => path.to_string(),
        }
    }

    fn read(self) -> Result<String> {
        match self {
            Self::BuiltIn => Ok(DEFAULT_TEMPLATE.to_owned()),
            Self::File(path) => {
                fs::read_to_string(path).map_err(|source| PackagerError::TemplateRead {
                    path: path.to_owned(),
                    source,
                })
            }
        }
    }
}

/// Render the descriptor to a string.
///
/// # Errors
///
/// Returns [`PackagerError::TemplateRead`] if a template file cannot be read
/// and [`PackagerError::TemplateRender`] if it fails to parse or references
/// an undefined variable.
pub fn render_to_string(
    template: TemplateSource<'_>,
    context: &DescriptorContext,
) -> Result<String> {
    let source = template.read()?;
    let render_error = |e: tera::Error| PackagerError::TemplateRender {
        template: template.label(),
        reason: error_chain(&e),
    };

    let mut tera = Tera::default();
    tera.register_filter("label", label_filter);
    tera.add_raw_template(DESCRIPTOR_FILENAME, &source)
        .map_err(render_error)?;
    let context = Context::from_serialize(context).map_err(render_error)?;
    tera.render(DESCRIPTOR_FILENAME, &context).map_err(render_error)
}

/// Render the descriptor into `<staging_root>/Dockerfile`.
///
/// Returns the path of the written descriptor.
///
/// # Errors
///
/// Returns any error from [`render_to_string`], or an I/O error if the
/// descriptor cannot be written.
pub fn render_descriptor(
    template: TemplateSource<'_>,
    context: &DescriptorContext,
    staging_root: &Utf8Path,
) -> Result<Utf8PathBuf> {
    let rendered = render_to_string(template, context)?;
    let path = staging_root.join(DESCRIPTOR_FILENAME);
    fs::write(&path, rendered)?;
    debug!("rendered {} to {path}", template.label());
    Ok(path)
}

/// Escape a value for a double-quoted Dockerfile `LABEL`.
///
/// # Examples
///
/// ```
/// use omnibus_docker_packager::descriptor::escape_label;
///
/// assert_eq!(escape_label(r#"Acme "Ops""#), r#"Acme \"Ops\""#);
/// ```
#[must_use]
pub fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn label_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match from_value::<String>(value.clone()) {
        Ok(text) => Ok(escape_label(&text).into()),
        Err(_) => Err("label filter expects a string".into()),
    }
}

/// Join a tera error with its causes.
fn error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut cause = error.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir path not UTF-8")
    }

    #[fixture]
    fn context() -> DescriptorContext {
        DescriptorContext {
            package_name: "myapp".to_owned(),
            version: "1.2.3".to_owned(),
            iteration: "1".to_owned(),
            architecture: "amd64".to_owned(),
            install_dir: "/opt/myapp".into(),
            install_root: "opt/myapp".into(),
            extra_files: vec!["etc/myapp/app.yml".into()],
            vendor: "Example <ops@example.com>".to_owned(),
            license: "Apache-2.0".to_owned(),
            priority: "extra".to_owned(),
            section: "misc".to_owned(),
            image_tag: "myapp:1.2.3".to_owned(),
            artefact_name: "myapp_1.2.3-1_amd64.tar.gz".to_owned(),
        }
    }

    #[rstest]
    fn built_in_template_renders_metadata(context: DescriptorContext) {
        let rendered = render_to_string(TemplateSource::BuiltIn, &context).expect("renders");
        assert!(rendered.contains("Apache-2.0"));
        assert!(rendered.contains("Example <ops@example.com>"));
        assert!(rendered.contains("COPY opt/myapp /opt/myapp"));
        assert!(rendered.contains("COPY etc/myapp/app.yml /etc/myapp/app.yml"));
        assert!(rendered.contains("omnibus.architecture=\"amd64\""));
    }

    #[rstest]
    fn label_values_are_escaped(mut context: DescriptorContext) {
        context.vendor = r#"Acme "Ops" <ops@example.com>"#.to_owned();
        context.license = r"C:\licenses $HOME".to_owned();

        let rendered = render_to_string(TemplateSource::BuiltIn, &context).expect("renders");

        assert!(
            rendered.contains(r#"org.opencontainers.image.vendor="Acme \"Ops\" <ops@example.com>""#),
            "descriptor:\n{rendered}"
        );
        assert!(
            rendered.contains(r#"org.opencontainers.image.licenses="C:\\licenses \$HOME""#),
            "descriptor:\n{rendered}"
        );
    }

    #[rstest]
    #[case::plain("Apache-2.0", "Apache-2.0")]
    #[case::quote(r#"a"b"#, r#"a\"b"#)]
    #[case::backslash(r"a\b", r"a\\b")]
    #[case::dollar("$VAR", r"\$VAR")]
    #[case::newline("two\nlines", "two lines")]
    fn escape_label_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_label(input), expected);
    }

    #[rstest]
    fn descriptor_is_written_to_staging_root(context: DescriptorContext) {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8(&dir);

        let path = render_descriptor(TemplateSource::BuiltIn, &context, &root).expect("renders");

        assert_eq!(path, root.join(DESCRIPTOR_FILENAME));
        let written = fs::read_to_string(path).expect("descriptor written");
        assert!(written.starts_with("FROM scratch"));
    }

    #[rstest]
    fn custom_template_file_is_used(context: DescriptorContext) {
        let dir = TempDir::new().expect("temp dir");
        let template = utf8(&dir).join("custom.tera");
        fs::write(&template, "FROM debian\n# {{ vendor }} {{ section }}\n").expect("write");

        let rendered =
            render_to_string(TemplateSource::File(&template), &context).expect("renders");

        assert_eq!(rendered, "FROM debian\n# Example <ops@example.com> misc\n");
    }

    #[rstest]
    fn undefined_variable_is_an_error(context: DescriptorContext) {
        let dir = TempDir::new().expect("temp dir");
        let template = utf8(&dir).join("broken.tera");
        fs::write(&template, "FROM scratch\nLABEL x={{ maintainer }}\n").expect("write");

        let err = render_to_string(TemplateSource::File(&template), &context)
            .expect_err("undefined variable");

        let PackagerError::TemplateRender { template: name, reason } = &err else {
            panic!("expected TemplateRender, got {err:?}");
        };
        assert_eq!(name, template.as_str());
        assert!(reason.contains("maintainer"), "reason: {reason}");
    }

    #[rstest]
    fn missing_template_is_a_read_error(context: DescriptorContext) {
        let err = render_to_string(
            TemplateSource::File(Utf8Path::new("/nonexistent/Dockerfile.tera")),
            &context,
        )
        .expect_err("missing template");
        assert!(matches!(err, PackagerError::TemplateRead { .. }));
    }

    #[test]
    fn from_option_prefers_explicit_path() {
        let path = Utf8Path::new("/recipes/Dockerfile.tera");
        assert_eq!(
            TemplateSource::from_option(Some(path)),
            TemplateSource::File(path)
        );
        assert_eq!(TemplateSource::from_option(None), TemplateSource::BuiltIn);
    }
}
