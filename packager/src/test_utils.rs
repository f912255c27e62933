//! Shared test utilities for the packager crate.
//!
//! Available to unit tests and, through the `test-support` feature, to
//! integration tests.

use crate::error::{PackagerError, Result};
use crate::executor::{CommandExecutor, Invocation};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program to execute (e.g., "fakeroot").
    pub cmd: String,
    /// The arguments to pass to the program.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Creates an expectation for `cmd` with `args` returning `result`.
    #[must_use]
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|&arg| arg.to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Returns predefined results in order and records the command line of every
/// invocation it receives. Redirected invocations behave like a shell
/// redirect: the stub creates the stdout file and writes the scripted stdout
/// into it, whatever the exit status.
#[derive(Debug, Default)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    received: RefCell<Vec<String>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            received: RefCell::new(Vec::new()),
        }
    }

    /// Returns `true` once every expected invocation has been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.expected.borrow().is_empty()
    }

    /// Command lines received so far, in order.
    #[must_use]
    pub fn received(&self) -> Vec<String> {
        self.received.borrow().clone()
    }

    fn next_call(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PackagerError::StubMismatch {
                message: format!("unexpected invocation of {cmd} {}", args.join(" ")),
            })?;

        if call.cmd != cmd || call.args != args {
            return Err(PackagerError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{cmd} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        call.result
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        self.received
            .borrow_mut()
            .push(format!("{cmd} {}", args.join(" ")));
        self.next_call(cmd, args)
    }

    fn run_redirected(&self, invocation: &Invocation) -> Result<Output> {
        self.received.borrow_mut().push(invocation.command_line());

        let args: Vec<&str> = invocation.args().iter().map(String::as_str).collect();
        let mut output = self.next_call(invocation.program(), &args)?;

        fs::write(invocation.stdout_path(), &output.stdout)?;
        output.stdout.clear();
        Ok(output)
    }
}
