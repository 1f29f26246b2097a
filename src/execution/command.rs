//! Remote command engine.
//!
//! A [`Command`] owns three stream endpoints and, once started, one
//! background task that polls the remote side for buffered output, feeds
//! it into the stdout/stderr pipes and settles the command's final state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::context::ExecContext;
use super::result::ExecutionResult;
use super::state::CommandState;
use super::stdin::CommandWriter;
use crate::error::{TransportError, WinrmError};
use crate::protocol::{clean_stderr, parse_output, Request};
use crate::session::{CommandId, ShellInner};
use crate::stream::{pipe, PipeReader, PipeWriter};
use crate::Result;

/// Exit code recorded when the connection drops while polling.
pub const EXIT_CODE_CONNECTION_LOST: i32 = 16001;

#[derive(Debug, Default)]
struct Outcome {
    state: CommandState,
    exit_code: i32,
    err: Option<WinrmError>,
}

/// Result of one output fetch.
enum Poll {
    /// No terminal condition yet; poll again.
    Pending,
    /// Polling is over; carries the terminal error, if any.
    Done(Option<WinrmError>),
}

/// State shared by the caller-facing handle, the stdin writer and the
/// polling task.
pub(crate) struct CommandCore {
    shell: Weak<ShellInner>,
    pub(super) id: CommandId,
    stdout: PipeWriter,
    stderr: PipeWriter,
    outcome: Mutex<Outcome>,
    cancel: CancellationToken,
    done: CancellationToken,
    started: AtomicBool,
    ctx: ExecContext,
}

impl CommandCore {
    /// Verify the command still has everything it needs to talk to the
    /// remote side, returning the owning shell.
    pub(super) fn check(&self) -> Result<Arc<ShellInner>> {
        if self.id.is_empty() {
            return Err(WinrmError::InvalidState(
                "command has already been closed".into(),
            ));
        }
        self.shell
            .upgrade()
            .ok_or_else(|| WinrmError::InvalidState("command has no associated shell".into()))
    }

    fn outcome(&self) -> Result<MutexGuard<'_, Outcome>> {
        self.outcome.lock().map_err(|_| WinrmError::LockPoisoned)
    }

    fn close_outputs(&self, err: Option<WinrmError>) {
        // Only the first close of each pipe counts.
        let _ = self.stderr.close_with_error(err.clone());
        let _ = self.stdout.close_with_error(err);
    }

    /// Request cancellation and send the terminate signal.
    async fn close(&self) -> Result<()> {
        let shell = self.check()?;

        if !self.cancel.is_cancelled() {
            debug!(command = %self.id, "canceling command");
            self.cancel.cancel();
        }

        shell
            .client
            .send(Request::terminate(&shell.id, &self.id))
            .await
            .map(|_| ())
    }

    pub(super) async fn send_input(&self, data: &[u8], eof: bool) -> Result<()> {
        let shell = self.check()?;
        trace!(command = %self.id, len = data.len(), eof, "sending input");
        shell
            .client
            .send(Request::send_input(&shell.id, &self.id, data, eof))
            .await
            .map(|_| ())
    }

    /// Fetch buffered output once and push it into the pipes.
    async fn slurp_output(&self) -> Poll {
        let shell = match self.check() {
            Ok(shell) => shell,
            Err(err) => {
                self.close_outputs(Some(err.clone()));
                return Poll::Done(Some(err));
            }
        };

        let response = shell
            .client
            .exchange(Request::get_output(&shell.id, &self.id))
            .await;

        let body = match response {
            Ok(body) => body,
            Err(err) if err.is_timeout() => {
                trace!(command = %self.id, "no output before operation timeout");
                return Poll::Pending;
            }
            Err(err) => return self.fail_transport(err),
        };

        let (fragment, parse_err) = parse_output(&body);
        if let Some(err) = parse_err {
            warn!(command = %self.id, "malformed receive response: {}", err);
            self.close_outputs(Some(err.clone()));
            return Poll::Done(Some(err));
        }

        self.deliver(&self.stdout, &fragment.stdout).await;
        self.deliver(&self.stderr, &fragment.stderr).await;

        if fragment.finished {
            debug!(command = %self.id, exit_code = fragment.exit_code, "command done");
            if let Ok(mut outcome) = self.outcome() {
                outcome.exit_code = fragment.exit_code;
            }
            self.close_outputs(None);
            return Poll::Done(None);
        }

        Poll::Pending
    }

    /// Hand `data` to a reader. Gives up once the command is canceled, so an
    /// unread stream cannot keep the polling task from settling.
    async fn deliver(&self, pipe: &PipeWriter, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        tokio::select! {
            biased;
            res = pipe.write(data) => {
                if let Err(e) = res {
                    trace!(command = %self.id, "output dropped: {}", e);
                }
            }
            _ = self.cancel.cancelled() => {
                trace!(command = %self.id, len = data.len(), "output discarded after cancel");
            }
        }
    }

    fn fail_transport(&self, err: TransportError) -> Poll {
        if err.is_eof() {
            if let Ok(mut outcome) = self.outcome() {
                outcome.exit_code = EXIT_CODE_CONNECTION_LOST;
            }
        }
        warn!(command = %self.id, "polling failed: {}", err.message());
        let err = WinrmError::from(err);
        self.close_outputs(Some(err.clone()));
        Poll::Done(Some(err))
    }

    /// Record the terminal state, then release every waiter.
    fn settle(&self, state: CommandState, err: Option<WinrmError>) {
        if let Ok(mut outcome) = self.outcome() {
            if let Err(e) = outcome.state.transition_to(state) {
                warn!(command = %self.id, "{}", e);
            }
            if err.is_some() {
                outcome.err = err;
            }
        }
        self.done.cancel();
    }

    fn record_error(&self, err: WinrmError) {
        if let Ok(mut outcome) = self.outcome() {
            outcome.err = Some(err);
        }
    }
}

/// The polling loop. Exactly one runs per command.
async fn poll_output(core: Arc<CommandCore>) {
    let mut watch_ctx = true;

    loop {
        if core.cancel.is_cancelled() {
            let _ = core.slurp_output().await;
            core.close_outputs(Some(WinrmError::Canceled));
            core.settle(CommandState::Canceled, None);
            return;
        }

        if watch_ctx {
            if let Some(err) = core.ctx.err() {
                debug!(command = %core.id, "execution context done: {}", err);
                core.record_error(err.into());
                watch_ctx = false;
                if let Err(e) = core.close().await {
                    debug!(command = %core.id, "terminate after context expiry failed: {}", e);
                }
                continue;
            }
        }

        match core.slurp_output().await {
            Poll::Pending => {
                // Ready-made responses must not starve the caller's task.
                tokio::task::yield_now().await;
            }
            Poll::Done(None) => {
                core.settle(CommandState::Finished, None);
                return;
            }
            Poll::Done(Some(err)) => {
                core.settle(CommandState::Failed, Some(err));
                return;
            }
        }
    }
}

/// A command running inside a remote [`Shell`](crate::Shell).
///
/// Read [`stdout`](Self::stdout) and [`stderr`](Self::stderr) while the
/// command runs, write to [`stdin`](Self::stdin), and call
/// [`wait`](Self::wait) for the outcome. Or call [`result`](Self::result)
/// to collect everything at once. Dropping a running command cancels it.
pub struct Command {
    core: Arc<CommandCore>,
    /// Input endpoint.
    pub stdin: CommandWriter,
    /// Standard output endpoint.
    pub stdout: PipeReader,
    /// Standard error endpoint (raw, CLIXML not unwrapped).
    pub stderr: PipeReader,
}

impl Command {
    pub(crate) fn new(ctx: ExecContext, shell: Weak<ShellInner>, id: CommandId) -> Self {
        let (stdout_writer, stdout) = pipe();
        let (stderr_writer, stderr) = pipe();

        let core = Arc::new(CommandCore {
            shell,
            id,
            stdout: stdout_writer,
            stderr: stderr_writer,
            outcome: Mutex::new(Outcome::default()),
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
            started: AtomicBool::new(false),
            ctx,
        });

        Self {
            stdin: CommandWriter::new(Arc::clone(&core)),
            core,
            stdout,
            stderr,
        }
    }

    /// The remote command id.
    pub fn id(&self) -> &CommandId {
        &self.core.id
    }

    /// Start the output polling task. Calling it again has no effect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        if self.core.started.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(command = %self.core.id, "starting output polling");
        tokio::spawn(poll_output(Arc::clone(&self.core)));
    }

    /// Terminate the command.
    ///
    /// Fires the cancellation signal (once) and sends the terminate signal to
    /// the remote side, returning that request's error. Fails with
    /// [`WinrmError::InvalidState`] if the command lost its shell.
    pub async fn close(&self) -> Result<()> {
        self.core.close().await
    }

    /// Exit code of the command; 0 until it is done.
    pub fn exit_code(&self) -> i32 {
        self.core.outcome().map(|o| o.exit_code).unwrap_or(0)
    }

    /// Error of the command, if any so far.
    pub fn error(&self) -> Option<WinrmError> {
        self.core.outcome().ok().and_then(|o| o.err.clone())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CommandState {
        self.core
            .outcome()
            .map(|o| o.state)
            .unwrap_or(CommandState::Failed)
    }

    /// Wait for the polling task to finish and return the terminal error.
    ///
    /// A command canceled through [`close`](Self::close) resolves to
    /// `Ok(())` unless an earlier failure was recorded.
    pub async fn wait(&self) -> Result<()> {
        self.core.done.cancelled().await;
        match self.core.outcome()?.err.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run the command to completion, collecting its output.
    ///
    /// Starts polling, closes stdin, drains stdout and stderr concurrently,
    /// then waits for the command to settle. Stderr has CLIXML error records
    /// unwrapped. Output drained before a failure is returned together with
    /// the error.
    pub async fn result(&mut self) -> ExecutionResult {
        let start = Instant::now();
        self.start();

        if let Err(e) = self.stdin.close().await {
            debug!(command = %self.core.id, "closing stdin failed: {}", e);
        }

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let _ = tokio::join!(
            self.stdout.read_to_end(&mut stdout),
            self.stderr.read_to_end(&mut stderr),
        );

        let error = self.wait().await.err();

        ExecutionResult {
            stdout,
            stderr: clean_stderr(&stderr),
            exit_code: self.exit_code(),
            error,
            duration: start.elapsed(),
        }
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        if self.core.done.is_cancelled() || self.core.cancel.is_cancelled() {
            return;
        }
        debug!(command = %self.core.id, "command dropped while running");
        self.core.cancel.cancel();

        // Terminate the remote process too, when a runtime is around to send it.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let core = Arc::clone(&self.core);
            handle.spawn(async move {
                if let Err(e) = core.close().await {
                    debug!(command = %core.id, "terminate after drop failed: {}", e);
                }
            });
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.core.id)
            .field("state", &self.state())
            .finish()
    }
}
