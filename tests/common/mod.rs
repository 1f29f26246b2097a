//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use winrm_shell::{Client, Parameters, Request, Transport, TransportError};

pub const SHELL_ID: &str = "67A74734-DD32-4F10-89DE-49A060483810";
pub const COMMAND_ID: &str = "1A6DEE6B-EC68-4DD6-87E9-030C0048ECC4";

/// Canned answer to one `Receive` request.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Error(TransportError),
}

#[derive(Debug, Default)]
struct Script {
    outputs: VecDeque<Reply>,
    requests: Vec<Request>,
    input_calls_before_failure: Option<usize>,
    open_shell_failure: Option<TransportError>,
}

/// Transport answering from a script and recording every request.
///
/// `Receive` requests take replies from the queue; once it is empty they
/// answer with an operation timeout.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    poll_delay: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            poll_delay: Duration::from_millis(2),
        }
    }

    pub fn with_outputs(replies: impl IntoIterator<Item = Reply>) -> Self {
        let transport = Self::new();
        transport.script.lock().unwrap().outputs.extend(replies);
        transport
    }

    pub fn fail_input_after(&self, calls: usize) {
        self.script.lock().unwrap().input_calls_before_failure = Some(calls);
    }

    pub fn fail_open_shell(&self, err: TransportError) {
        self.script.lock().unwrap().open_shell_failure = Some(err);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn receive_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, Request::GetOutput { .. }))
            .count()
    }

    pub fn signal_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, Request::Signal { .. }))
            .count()
    }

    /// `(data, eof)` of every `Send` request, in order.
    pub fn inputs(&self) -> Vec<(Vec<u8>, bool)> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::SendInput { data, eof, .. } => Some((data, eof)),
                _ => None,
            })
            .collect()
    }

    pub fn client(&self) -> Client {
        self.client_with(Parameters::default())
    }

    pub fn client_with(&self, parameters: Parameters) -> Client {
        Client::new(self.clone(), parameters)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: Request,
        _parameters: &Parameters,
    ) -> Result<String, TransportError> {
        let is_receive = matches!(request, Request::GetOutput { .. });
        if is_receive {
            tokio::time::sleep(self.poll_delay).await;
        }

        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());

        match request {
            Request::OpenShell => match script.open_shell_failure.clone() {
                Some(err) => Err(err),
                None => Ok(shell_response(SHELL_ID)),
            },
            Request::ExecuteCommand { .. } => Ok(command_response(COMMAND_ID)),
            Request::SendInput { .. } => {
                if let Some(left) = script.input_calls_before_failure.as_mut() {
                    if *left == 0 {
                        return Err(TransportError::from_message("connection reset by peer"));
                    }
                    *left -= 1;
                }
                Ok(String::new())
            }
            Request::GetOutput { .. } => match script.outputs.pop_front() {
                Some(Reply::Body(body)) => Ok(body),
                Some(Reply::Error(err)) => Err(err),
                None => Err(timeout()),
            },
            Request::Signal { .. } | Request::DeleteShell { .. } => Ok(String::new()),
        }
    }
}

pub fn timeout() -> TransportError {
    TransportError::from_message(
        "http response error: 500 - <f:WSManFault Code=\"2150858793\"><f:Message>OperationTimeout</f:Message></f:WSManFault>",
    )
}

pub fn shell_response(id: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:w="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd">
  <s:Header><w:SelectorSet><w:Selector Name="ShellId">{id}</w:Selector></w:SelectorSet></s:Header>
  <s:Body/>
</s:Envelope>"#
    )
}

pub fn command_response(id: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell">
  <s:Body><rsp:CommandResponse><rsp:CommandId>{id}</rsp:CommandId></rsp:CommandResponse></s:Body>
</s:Envelope>"#
    )
}

/// A `Receive` response carrying the given fragments, optionally done.
pub fn receive(stdout: &[&[u8]], stderr: &[&[u8]], exit_code: Option<i32>) -> Reply {
    let mut streams = String::new();
    for chunk in stdout {
        streams.push_str(&format!(
            r#"<rsp:Stream Name="stdout" CommandId="{COMMAND_ID}">{}</rsp:Stream>"#,
            BASE64.encode(chunk)
        ));
    }
    for chunk in stderr {
        streams.push_str(&format!(
            r#"<rsp:Stream Name="stderr" CommandId="{COMMAND_ID}">{}</rsp:Stream>"#,
            BASE64.encode(chunk)
        ));
    }

    let state = match exit_code {
        Some(code) => format!(
            r#"<rsp:CommandState CommandId="{COMMAND_ID}" State="http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done"><rsp:ExitCode>{code}</rsp:ExitCode></rsp:CommandState>"#
        ),
        None => format!(
            r#"<rsp:CommandState CommandId="{COMMAND_ID}" State="http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Running"/>"#
        ),
    };

    Reply::Body(format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell">
  <s:Body><rsp:ReceiveResponse>{streams}{state}</rsp:ReceiveResponse></s:Body>
</s:Envelope>"#
    ))
}
