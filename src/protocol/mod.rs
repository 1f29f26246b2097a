//! WS-Management shell protocol: requests, parameters and response decoding.
//!
//! Rendering requests into SOAP envelopes is left to the [`Transport`]
//! implementation; this module only describes what is asked and decodes
//! what comes back.
//!
//! [`Transport`]: crate::Transport

mod clixml;
pub mod namespaces;
mod request;
mod response;

use std::time::Duration;

pub use clixml::{clean_stderr, CLIXML_HEADER};
pub use request::{Request, SIGNAL_TERMINATE};
pub use response::{parse_command_id, parse_output, parse_session_id, OutputFragment};

/// Bytes of every input envelope reserved for the SOAP wrapping.
pub const INPUT_OVERHEAD: usize = 1000;

/// Default maximum envelope size in bytes.
pub const DEFAULT_ENVELOPE_SIZE: usize = 153_600;

/// Default server-side operation timeout.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Negotiated protocol parameters shared by every request of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    /// Maximum envelope size the server accepts.
    pub envelope_size: usize,
    /// How long the server may hold a `Receive` before answering with
    /// an operation timeout.
    pub operation_timeout: Duration,
    /// Locale sent with every request.
    pub locale: String,
    /// Console codepage of opened shells.
    pub codepage: u32,
}

impl Parameters {
    /// Largest stdin payload that fits in one envelope.
    pub fn max_input_chunk(&self) -> usize {
        self.envelope_size.saturating_sub(INPUT_OVERHEAD).max(1)
    }

    /// Set the envelope size.
    pub fn with_envelope_size(mut self, size: usize) -> Self {
        self.envelope_size = size;
        self
    }

    /// Set the operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            envelope_size: DEFAULT_ENVELOPE_SIZE,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            locale: "en-US".to_string(),
            codepage: 65001,
        }
    }
}
