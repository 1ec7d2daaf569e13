//! External tool execution.
//!
//! Ghostscript, Tesseract and pdftotext are driven as child processes through the
//! [`ToolRunner`] trait. The pipeline only ever talks to the trait, so tests can swap in
//! a runner that writes the files the real tools would write.

use crate::{PagetextError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// A single command-line invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Variables added to the inherited environment.
    pub env: Vec<(String, OsString)>,
    pub timeout: Duration,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, vars: impl IntoIterator<Item = (String, OsString)>) -> Self {
        self.env.extend(vars);
        self
    }

    /// File name of the program, for log and error messages.
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Position of `flag` in the argument list.
    pub fn arg_position(&self, flag: &str) -> Option<usize> {
        self.args.iter().position(|arg| arg == flag)
    }

    /// Argument following `flag`, e.g. the output path after `-o`.
    pub fn arg_after(&self, flag: &str) -> Option<&OsString> {
        self.arg_position(flag).and_then(|idx| self.args.get(idx + 1))
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs external tools.
///
/// Implementations must not return before the child has exited (or been killed), so that
/// callers can inspect the files it produced.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion.
    ///
    /// # Errors
    ///
    /// - `PagetextError::MissingDependency` if the program does not exist
    /// - `PagetextError::Io` if the program could not be started or awaited
    /// - `PagetextError::Other` if the invocation exceeded its timeout
    ///
    /// A non-zero exit status is *not* an error here; callers decide what it means.
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput>;
}

/// [`ToolRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput> {
        let name = invocation.display_name();
        tracing::debug!(
            program = %invocation.program.display(),
            args = ?invocation.args,
            "Running external tool"
        );

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(key, value)| (key.as_str(), value.as_os_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PagetextError::MissingDependency(format!(
                        "{} not found at '{}'. Install it or set tools.bin_dir",
                        name,
                        invocation.program.display()
                    ))
                } else {
                    std::io::Error::other(format!("Failed to execute {}: {}", name, e)).into()
                }
            })?;

        let output = match timeout(invocation.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(std::io::Error::other(format!("Failed to wait for {}: {}", name, e)).into()),
            Err(_) => {
                // The child was moved into wait_with_output(); kill_on_drop terminates it
                return Err(PagetextError::Other(format!(
                    "{} timed out after {} seconds",
                    name,
                    invocation.timeout.as_secs()
                )));
            }
        };

        tracing::debug!(program = %name, status = %output.status, "External tool finished");

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
