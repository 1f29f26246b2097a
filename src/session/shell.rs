//! Remote shell façade.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::debug;

use super::client::Client;
use super::id::ShellId;
use crate::execution::{Command, ExecContext};
use crate::protocol::{parse_command_id, Request};
use crate::Result;

/// Data shared between a [`Shell`] handle and its commands.
///
/// Commands only hold a weak reference: once every `Shell` handle is
/// dropped, their further requests fail with an invalid-state error.
pub(crate) struct ShellInner {
    pub(crate) client: Client,
    pub(crate) id: ShellId,
}

/// An open remote shell.
#[derive(Clone)]
pub struct Shell {
    inner: Arc<ShellInner>,
}

impl Shell {
    pub(crate) fn new(client: Client, id: ShellId) -> Self {
        Self {
            inner: Arc::new(ShellInner { client, id }),
        }
    }

    /// The remote shell id.
    pub fn id(&self) -> &ShellId {
        &self.inner.id
    }

    /// The client this shell belongs to.
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Start a command with no deadline.
    pub async fn execute(&self, command: &str, arguments: &[&str]) -> Result<Command> {
        self.execute_with_context(ExecContext::new(), command, arguments)
            .await
    }

    /// Start a command bound to `ctx`.
    ///
    /// The returned command is not polled until [`Command::start`] or
    /// [`Command::result`] is called.
    pub async fn execute_with_context(
        &self,
        ctx: ExecContext,
        command: &str,
        arguments: &[&str],
    ) -> Result<Command> {
        let request = Request::ExecuteCommand {
            shell_id: self.inner.id.clone(),
            command: command.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
        };
        let response = self.inner.client.send(request).await?;
        let id = parse_command_id(&response)?;
        debug!(shell = %self.inner.id, command = %id, "command started");

        Ok(Command::new(ctx, Arc::downgrade(&self.inner), id))
    }

    /// Start a PowerShell script bound to `ctx`.
    pub async fn execute_powershell(&self, ctx: ExecContext, script: &str) -> Result<Command> {
        self.execute_with_context(ctx, &powershell(script), &[])
            .await
    }

    /// Delete the remote shell. The server terminates commands still running in it.
    pub async fn close(&self) -> Result<()> {
        debug!(shell = %self.inner.id, "closing shell");
        self.inner
            .client
            .send(Request::DeleteShell {
                shell_id: self.inner.id.clone(),
            })
            .await
            .map(|_| ())
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell").field("id", &self.inner.id).finish()
    }
}

/// Wrap a PowerShell script into a `powershell.exe -EncodedCommand` line.
///
/// The script is encoded as base64 over UTF-16LE, as PowerShell expects.
pub fn powershell(script: &str) -> String {
    let utf16: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
    format!("powershell.exe -EncodedCommand {}", BASE64.encode(utf16))
}
