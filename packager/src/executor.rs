//! External command execution.
//!
//! All process spawning goes through [`CommandExecutor`] so that platform
//! detection and the image build can be exercised without a container
//! runtime on the test host.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::fs::File;
use std::process::{Command, Output, Stdio};

/// A fully resolved external command whose stdout is redirected to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    current_dir: Utf8PathBuf,
    stdout_file: String,
}

impl Invocation {
    /// Create an invocation run from `current_dir` with stdout written to
    /// `stdout_file`, a path relative to `current_dir`.
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        current_dir: impl Into<Utf8PathBuf>,
        stdout_file: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            current_dir: current_dir.into(),
            stdout_file: stdout_file.into(),
        }
    }

    /// The program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Working directory for the command.
    #[must_use]
    pub fn current_dir(&self) -> &Utf8Path {
        &self.current_dir
    }

    /// File name (relative to the working directory) receiving stdout.
    #[must_use]
    pub fn stdout_file(&self) -> &str {
        &self.stdout_file
    }

    /// Absolute location of the stdout file.
    #[must_use]
    pub fn stdout_path(&self) -> Utf8PathBuf {
        self.current_dir.join(&self.stdout_file)
    }

    /// Shell-style rendering used in logs and error messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use omnibus_docker_packager::executor::Invocation;
    ///
    /// let invocation = Invocation::new(
    ///     "fakeroot",
    ///     vec!["docker".to_owned(), "build".to_owned()],
    ///     "/pkg",
    ///     "out.tar.gz",
    /// );
    /// assert_eq!(invocation.command_line(), "fakeroot docker build > out.tar.gz");
    /// ```
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 3);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(">");
        parts.push(self.stdout_file.as_str());
        parts.join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output>;

    /// Runs an invocation with stdout streamed into its stdout file.
    ///
    /// The returned [`Output`] carries the exit status and captured stderr;
    /// its stdout is empty because it was written to disk. The call blocks
    /// until the command exits.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Spawn`] if the stdout file cannot be created
    /// or the command cannot be started.
    fn run_redirected(&self, invocation: &Invocation) -> Result<Output>;
}

/// Executes commands on the host system.
///
/// # Examples
///
/// ```no_run
/// use omnibus_docker_packager::executor::{CommandExecutor, SystemCommandExecutor};
///
/// let executor = SystemCommandExecutor;
/// let output = executor.run("uname", &["-m"])?;
/// assert!(output.status.success());
/// # Ok::<(), omnibus_docker_packager::error::PackagerError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(PackagerError::from)
    }

    fn run_redirected(&self, invocation: &Invocation) -> Result<Output> {
        let spawn_error = |source| PackagerError::Spawn {
            command: invocation.command_line(),
            source,
        };

        let stdout = File::create(invocation.stdout_path()).map_err(spawn_error)?;
        Command::new(invocation.program())
            .args(invocation.args())
            .current_dir(invocation.current_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .output()
            .map_err(spawn_error)
    }
}
