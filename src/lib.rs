//! # winrm-shell
//!
//! WS-Management (WinRM) remote shell client with streaming command
//! execution.
//!
//! A [`Client`] opens a remote [`Shell`]; the shell starts [`Command`]s
//! whose stdin, stdout and stderr are live byte streams while the remote
//! process runs. A background task per command polls the server for
//! buffered output and settles the command into an exit code or an error.
//!
//! ## Features
//!
//! - **Streaming I/O**: unbuffered pipes hand output to the caller as it arrives
//! - **Chunked input**: stdin is split to fit the negotiated envelope size
//! - **Cancellation**: explicit close, caller deadlines and transport failures
//!   all end in one terminal result
//! - **CLIXML cleanup**: PowerShell error records on stderr become plain text
//!
//! The HTTP/SOAP exchange itself is supplied by the caller through the
//! [`Transport`] trait.
//!
//! ## Quick Start
//!
//! ```no_run
//! use winrm_shell::{Client, Config, Transport};
//!
//! # async fn demo(transport: impl Transport + 'static) -> winrm_shell::Result<()> {
//! winrm_shell::logging::try_init().ok();
//!
//! let config = Config::load(None)?;
//! let client = Client::new(transport, config.to_parameters()?);
//!
//! let result = client.run("ipconfig", &["/all"]).await?;
//! println!("exit code {}", result.exit_code);
//! print!("{}", result.stdout_text());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod stream;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use error::{ContextError, Result, TransportError, TransportErrorKind, WinrmError};
pub use execution::{
    Command, CommandState, CommandWriter, ExecContext, ExecutionResult, EXIT_CODE_CONNECTION_LOST,
};
pub use protocol::{clean_stderr, Parameters, Request};
pub use session::{powershell, Client, CommandId, Shell, ShellId};
pub use stream::{pipe, PipeReader, PipeWriter};
pub use transport::Transport;
