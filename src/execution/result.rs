//! Collected result of a remote command.

use std::time::Duration;

use crate::error::WinrmError;

/// Everything a command produced, as returned by [`Command::result`].
///
/// Output drained before a failure is kept alongside the error.
///
/// [`Command::result`]: crate::Command::result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Bytes read from stdout.
    pub stdout: Vec<u8>,
    /// Bytes read from stderr, with CLIXML error records unwrapped.
    pub stderr: Vec<u8>,
    /// Exit code reported by the remote side (0 if none was reported).
    pub exit_code: i32,
    /// Terminal error of the command, if it did not finish cleanly.
    pub error: Option<WinrmError>,
    /// Wall-clock time spent collecting the result.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Check if the command finished without error and with exit code 0.
    pub fn success(&self) -> bool {
        self.error.is_none() && self.exit_code == 0
    }

    /// Check if the command failed (error or non-zero exit code).
    pub fn failed(&self) -> bool {
        !self.success()
    }

    /// Stdout decoded as UTF-8 (lossy).
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded as UTF-8 (lossy).
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Convert into a `Result`, discarding partial output on error.
    pub fn into_result(self) -> crate::Result<Self> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
