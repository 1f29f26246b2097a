//! Remote shell sessions.
//!
//! A [`Client`] opens [`Shell`]s; a shell starts [`Command`](crate::Command)s.

mod client;
mod id;
mod shell;

pub use client::Client;
pub use id::{CommandId, ShellId};
pub(crate) use shell::ShellInner;
pub use shell::{powershell, Shell};
