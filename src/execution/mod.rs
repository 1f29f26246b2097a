//! Remote command execution engine.
//!
//! This module provides:
//! - [`Command`]: one remote process with live stdin/stdout/stderr
//! - [`ExecContext`]: caller-side cancellation and deadlines
//! - [`ExecutionResult`]: collected output of a finished command
//!
//! # Example
//!
//! ```no_run
//! use winrm_shell::{Client, ExecContext};
//!
//! # async fn demo(client: Client) -> winrm_shell::Result<()> {
//! let shell = client.open_shell().await?;
//! let mut cmd = shell
//!     .execute_with_context(ExecContext::with_timeout(std::time::Duration::from_secs(30)), "ipconfig", &[])
//!     .await?;
//! let result = cmd.result().await;
//! println!("exit {}: {}", result.exit_code, result.stdout_text());
//! shell.close().await?;
//! # Ok(())
//! # }
//! ```

mod command;
mod context;
mod result;
mod state;
mod stdin;

pub use command::{Command, EXIT_CODE_CONNECTION_LOST};
pub use context::ExecContext;
pub use result::ExecutionResult;
pub use state::CommandState;
pub use stdin::CommandWriter;
