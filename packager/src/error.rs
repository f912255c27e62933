//! Error types for the omnibus Docker packager.
//!
//! Every variant is fatal to the packaging step: configuration errors halt
//! before staging begins, and staging, rendering or build failures abort the
//! build with no artefact considered valid. Normalisation never errors.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while packaging a project.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// A configuration or project value had the wrong type or was empty.
    #[error("invalid value for {field}: expected {expected}, found {found}")]
    InvalidValue {
        /// Name of the offending setting.
        field: String,
        /// Description of what the setting must be.
        expected: &'static str,
        /// Description of what was supplied.
        found: String,
    },

    /// A configuration or project file could not be read.
    #[error("failed to read {path}")]
    ConfigRead {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration or project file could not be parsed.
    #[error("invalid configuration in {origin}: {reason}")]
    InvalidConfig {
        /// Path or description of the configuration source.
        origin: String,
        /// Description of the parse error.
        reason: String,
    },

    /// The configured image tag was rejected.
    #[error("invalid image tag: {0}")]
    ImageTag(#[from] omnibus_docker_common::ImageTagError),

    /// The host platform could not be detected.
    #[error("platform detection failed: {reason}")]
    PlatformDetection {
        /// Description of why detection failed.
        reason: String,
    },

    /// The staging directory exists but is not writable.
    #[error("staging directory {path} is not writable: {reason}")]
    TargetNotWritable {
        /// Path to the non-writable directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Copying a file into the staging directory failed.
    #[error("staging failed for {path}: {reason}")]
    StagingFailed {
        /// The file or directory being staged.
        path: Utf8PathBuf,
        /// Description of the staging failure.
        reason: String,
    },

    /// The descriptor template could not be read.
    #[error("failed to read template {path}")]
    TemplateRead {
        /// Path of the template file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor template could not be rendered.
    #[error("failed to render template {template}: {reason}")]
    TemplateRender {
        /// Template path, or `<built-in>` for the bundled template.
        template: String,
        /// Description of the rendering failure, including unresolved variables.
        reason: String,
    },

    /// The image build tool could not be started.
    #[error("failed to run `{command}`")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The image build tool exited with a non-zero status.
    #[error("image build failed: `{command}` exited with {status}\n{output}")]
    BuildFailed {
        /// The command line that was attempted.
        command: String,
        /// Exit status description reported by the operating system.
        status: String,
        /// Output captured from the tool.
        output: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
