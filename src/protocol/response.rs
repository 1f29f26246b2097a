//! Decoding of WS-Management shell responses.
//!
//! Every function here looks at a single response body and keeps no state
//! between calls.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use roxmltree::{Document, Node};
use tracing::warn;

use super::namespaces::{namespace, COMMAND_STATE_DONE, NSP_WIN_SHELL, NSP_WSMAN_DMTF};
use crate::error::WinrmError;
use crate::session::{CommandId, ShellId};
use crate::Result;

/// Output decoded from one `Receive` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputFragment {
    /// Decoded stdout bytes, fragments concatenated in document order.
    pub stdout: Vec<u8>,
    /// Decoded stderr bytes, fragments concatenated in document order.
    pub stderr: Vec<u8>,
    /// Whether the response carries the `CommandState/Done` marker.
    pub finished: bool,
    /// Exit code reported with the Done marker; 0 otherwise.
    pub exit_code: i32,
}

fn parse_document(body: &str) -> Result<Document<'_>> {
    Document::parse(body).map_err(|e| WinrmError::Parse(e.to_string()))
}

/// Elements named `prefix:local`, in document order.
fn elements<'a, 'input: 'a>(
    doc: &'a Document<'input>,
    prefix: &str,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    let ns = namespace(prefix);
    doc.descendants().filter(move |node| {
        node.is_element()
            && node.tag_name().name() == local
            && node.tag_name().namespace() == ns
    })
}

/// Concatenated text of a node and its descendants.
fn string_value(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn required(value: Option<String>, what: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WinrmError::Parse(format!("{what} not found in response")))
}

/// Extract the shell id from a `Create` response.
pub fn parse_session_id(body: &str) -> Result<ShellId> {
    let doc = parse_document(body)?;
    let id = elements(&doc, NSP_WSMAN_DMTF, "Selector")
        .find(|node| node.attribute("Name") == Some("ShellId"))
        .map(string_value);
    Ok(ShellId::new(required(id, "ShellId selector")?))
}

/// Extract the command id from a `Command` response.
pub fn parse_command_id(body: &str) -> Result<CommandId> {
    let doc = parse_document(body)?;
    let id = elements(&doc, NSP_WIN_SHELL, "CommandId")
        .next()
        .map(string_value);
    Ok(CommandId::new(required(id, "CommandId")?))
}

fn decode_streams(doc: &Document<'_>, name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for node in elements(doc, NSP_WIN_SHELL, "Stream").filter(|n| n.attribute("Name") == Some(name))
    {
        let encoded: String = string_value(node)
            .chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .collect();
        match BASE64.decode(encoded.as_bytes()) {
            Ok(bytes) => out.extend_from_slice(&bytes),
            Err(e) => warn!("skipping undecodable {} fragment: {}", name, e),
        }
    }
    out
}

/// Decode a `Receive` response into stdout/stderr bytes and completion state.
///
/// A body that is not well-formed XML yields an empty fragment together with
/// the parse error; callers must look at both. A non-numeric exit code is
/// tolerated and reported as 0.
pub fn parse_output(body: &str) -> (OutputFragment, Option<WinrmError>) {
    let doc = match parse_document(body) {
        Ok(doc) => doc,
        Err(e) => return (OutputFragment::default(), Some(e)),
    };

    let mut fragment = OutputFragment {
        stdout: decode_streams(&doc, "stdout"),
        stderr: decode_streams(&doc, "stderr"),
        ..OutputFragment::default()
    };

    fragment.finished = doc
        .descendants()
        .any(|node| node.is_element() && node.attribute("State") == Some(COMMAND_STATE_DONE));

    if fragment.finished {
        if let Some(node) = elements(&doc, NSP_WIN_SHELL, "ExitCode").next() {
            fragment.exit_code = string_value(node).parse().unwrap_or(0);
        }
    }

    (fragment, None)
}
