//! Client bundle: a transport plus the protocol parameters it negotiated.

use std::sync::Arc;

use tracing::debug;

use super::shell::{powershell, Shell};
use crate::error::TransportError;
use crate::execution::{ExecContext, ExecutionResult};
use crate::protocol::{parse_session_id, Parameters, Request};
use crate::transport::Transport;
use crate::Result;

/// Entry point for talking to one WS-Management endpoint.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    parameters: Arc<Parameters>,
}

impl Client {
    /// Create a client over `transport`.
    pub fn new(transport: impl Transport + 'static, parameters: Parameters) -> Self {
        Self::from_arc(Arc::new(transport), parameters)
    }

    /// Create a client over a shared transport.
    pub fn from_arc(transport: Arc<dyn Transport>, parameters: Parameters) -> Self {
        Self {
            transport,
            parameters: Arc::new(parameters),
        }
    }

    /// Negotiated protocol parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Perform one exchange, keeping the transport error category.
    pub(crate) async fn exchange(
        &self,
        request: Request,
    ) -> std::result::Result<String, TransportError> {
        self.transport.send(request, &self.parameters).await
    }

    /// Perform one exchange.
    pub(crate) async fn send(&self, request: Request) -> Result<String> {
        debug!(action = request.action(), "sending request");
        Ok(self.exchange(request).await?)
    }

    /// Open a new remote shell.
    pub async fn open_shell(&self) -> Result<Shell> {
        let response = self.send(Request::OpenShell).await?;
        let id = parse_session_id(&response)?;
        debug!(shell = %id, "shell opened");
        Ok(Shell::new(self.clone(), id))
    }

    /// Run a command in a fresh shell and collect its output.
    pub async fn run(&self, command: &str, arguments: &[&str]) -> Result<ExecutionResult> {
        self.run_with_context(ExecContext::new(), command, arguments)
            .await
    }

    /// Run a command in a fresh shell under `ctx` and collect its output.
    ///
    /// Errors opening the shell or starting the command are returned as
    /// `Err`; the command's own terminal error is reported in
    /// [`ExecutionResult::error`]. The shell is closed in every case.
    pub async fn run_with_context(
        &self,
        ctx: ExecContext,
        command: &str,
        arguments: &[&str],
    ) -> Result<ExecutionResult> {
        let shell = self.open_shell().await?;

        let result = match shell.execute_with_context(ctx, command, arguments).await {
            Ok(mut cmd) => Ok(cmd.result().await),
            Err(e) => Err(e),
        };

        if let Err(e) = shell.close().await {
            debug!(shell = %shell.id(), "closing shell failed: {}", e);
        }

        result
    }

    /// Run a PowerShell script in a fresh shell and collect its output.
    pub async fn run_powershell(&self, ctx: ExecContext, script: &str) -> Result<ExecutionResult> {
        self.run_with_context(ctx, &powershell(script), &[]).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
