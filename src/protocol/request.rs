//! Typed WS-Management shell requests handed to a [`Transport`](crate::Transport).

use crate::session::{CommandId, ShellId};

const ACTION_CREATE: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer/Create";
const ACTION_DELETE: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer/Delete";
const ACTION_COMMAND: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Command";
const ACTION_SEND: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Send";
const ACTION_RECEIVE: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Receive";
const ACTION_SIGNAL: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Signal";

/// Signal code asking the remote side to terminate a command.
pub const SIGNAL_TERMINATE: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/signal/terminate";

/// One request of the remote shell protocol.
///
/// A request is moved into [`Transport::send`](crate::Transport::send) and
/// released when the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Open a new `cmd` shell.
    OpenShell,
    /// Start a command inside a shell.
    ExecuteCommand {
        shell_id: ShellId,
        command: String,
        arguments: Vec<String>,
    },
    /// Deliver a block of stdin to a running command.
    SendInput {
        shell_id: ShellId,
        command_id: CommandId,
        data: Vec<u8>,
        eof: bool,
    },
    /// Fetch output buffered on the remote side.
    GetOutput {
        shell_id: ShellId,
        command_id: CommandId,
        streams: &'static str,
    },
    /// Send a signal to a command.
    Signal {
        shell_id: ShellId,
        command_id: CommandId,
        code: &'static str,
    },
    /// Delete a shell.
    DeleteShell { shell_id: ShellId },
}

impl Request {
    /// Output fetch for both stdout and stderr.
    pub fn get_output(shell_id: &ShellId, command_id: &CommandId) -> Self {
        Self::GetOutput {
            shell_id: shell_id.clone(),
            command_id: command_id.clone(),
            streams: "stdout stderr",
        }
    }

    /// Terminate signal for a command.
    pub fn terminate(shell_id: &ShellId, command_id: &CommandId) -> Self {
        Self::Signal {
            shell_id: shell_id.clone(),
            command_id: command_id.clone(),
            code: SIGNAL_TERMINATE,
        }
    }

    /// Input block for a command.
    pub fn send_input(shell_id: &ShellId, command_id: &CommandId, data: &[u8], eof: bool) -> Self {
        Self::SendInput {
            shell_id: shell_id.clone(),
            command_id: command_id.clone(),
            data: data.to_vec(),
            eof,
        }
    }

    /// The WS-Addressing action URI of this request.
    pub fn action(&self) -> &'static str {
        match self {
            Self::OpenShell => ACTION_CREATE,
            Self::ExecuteCommand { .. } => ACTION_COMMAND,
            Self::SendInput { .. } => ACTION_SEND,
            Self::GetOutput { .. } => ACTION_RECEIVE,
            Self::Signal { .. } => ACTION_SIGNAL,
            Self::DeleteShell { .. } => ACTION_DELETE,
        }
    }
}
