//! Blocking invocation of external executables.
//!
//! Each executable role builds an [`Invocation`]: the program, its ordered
//! arguments and optional files that receive the child's stdout and stderr.
//! A [`ProcessRunner`] executes it and reports the exit code. Production code
//! uses [`SystemRunner`]; tests swap in [`mock::RecordingRunner`].

pub mod mock;

use log::debug;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Exit code reported when the platform gives neither a code nor a signal
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// A fully specified call of an external executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    stdout: Option<PathBuf>,
    stderr: Option<PathBuf>,
}

impl Invocation {
    /// Start an invocation of `program` without arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout: None,
            stderr: None,
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append a flag followed by its value, e.g. `-r 42`
    pub fn option(self, flag: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Write the child's stdout to `path` (truncating it)
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    /// Write the child's stderr to `path` (truncating it)
    pub fn stderr_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr = Some(path.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn stdout_path(&self) -> Option<&Path> {
        self.stdout.as_deref()
    }

    pub fn stderr_path(&self) -> Option<&Path> {
        self.stderr.as_deref()
    }

    /// Arguments as lossy UTF-8 strings, convenient for assertions and logs
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    /// Space separated command line for log output
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Executes invocations to completion.
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation`, block until the child exits and return its exit code.
    ///
    /// An `Err` means the child could not be started (or its output files
    /// could not be created). A nonzero exit code is not an error.
    fn run(&self, invocation: &Invocation) -> std::io::Result<i32>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<i32> {
        let mut command = Command::new(invocation.program());
        command.args(invocation.args());

        if let Some(path) = invocation.stdout_path() {
            command.stdout(Stdio::from(File::create(path)?));
        }
        if let Some(path) = invocation.stderr_path() {
            command.stderr(Stdio::from(File::create(path)?));
        }

        debug!("Running {}", invocation.command_line());
        let status = command.status()?;
        let code = exit_code(status);
        debug!("{} exited with {code}", invocation.program().display());
        Ok(code)
    }
}

/// Exit code of a finished child.
///
/// Children killed by a signal report the negated signal number.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    UNKNOWN_EXIT_CODE
}
