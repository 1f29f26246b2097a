//! The request/response seam between the command engine and the network.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::protocol::{Parameters, Request};

/// Sends one protocol request and returns the raw response body.
///
/// Implementations render the [`Request`] into a SOAP envelope, post it to
/// the WS-Management endpoint and hand back the response text. Failures are
/// reported as [`TransportError`]s whose kind tells an operation timeout
/// (no output yet) from a dropped connection.
///
/// A call is never interrupted by the engine: cancellation is observed
/// only between calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange.
    async fn send(
        &self,
        request: Request,
        parameters: &Parameters,
    ) -> Result<String, TransportError>;
}
