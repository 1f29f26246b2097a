//! Error types for winrm-shell.

use std::fmt;

use thiserror::Error;

/// Main error type for winrm-shell operations.
///
/// The type is `Clone` because a command's terminal error is handed to
/// every caller of [`Command::wait`](crate::Command::wait).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WinrmError {
    /// Command used after being torn down, or missing required references.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Write or close attempted on an already-closed stream endpoint.
    #[error("write on closed pipe")]
    Closed,

    /// Fewer bytes were delivered than requested without a transport error.
    #[error("short write")]
    ShortWrite,

    /// Input delivery stopped part way through a write.
    #[error("wrote {written} bytes before failing: {source}")]
    PartialWrite {
        written: usize,
        source: Box<WinrmError>,
    },

    /// Malformed protocol response body.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Network or protocol level failure reported by the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The command was canceled explicitly.
    #[error("canceled")]
    Canceled,

    /// The caller-supplied execution context expired.
    #[error(transparent)]
    ContextExpired(#[from] ContextError),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

/// Convenience Result type for winrm-shell operations.
pub type Result<T> = std::result::Result<T, WinrmError>;

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The remote side had no output before its operation timeout elapsed.
    OperationTimeout,
    /// The connection was torn down while a response was expected.
    Eof,
    /// Any other failure.
    Other,
}

/// Failure of a single request/response exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport error: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Create a transport error with an explicit category.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a transport error, deriving its category from the message text.
    ///
    /// WS-Management servers report an empty poll as a SOAP fault mentioning
    /// `OperationTimeout`; HTTP stacks surface a header timeout the same way.
    /// A message mentioning `EOF` means the connection went away.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if message.contains("OperationTimeout")
            || message.contains("timeout awaiting response headers")
        {
            TransportErrorKind::OperationTimeout
        } else if message.contains("EOF") {
            TransportErrorKind::Eof
        } else {
            TransportErrorKind::Other
        };
        Self { kind, message }
    }

    /// The failure category.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// The underlying message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this is an operation timeout (no output yet).
    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::OperationTimeout
    }

    /// Whether the remote end closed the connection.
    pub fn is_eof(&self) -> bool {
        self.kind == TransportErrorKind::Eof
    }
}

/// Reason an [`ExecContext`](crate::ExecContext) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context was canceled by its owner.
    Canceled,
    /// The context deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => write!(f, "context canceled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl std::error::Error for ContextError {}
