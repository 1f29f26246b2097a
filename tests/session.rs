//! Shell and client façade integration tests.

mod common;

use common::{receive, ScriptedTransport, COMMAND_ID, SHELL_ID};
use winrm_shell::{powershell, ExecContext, Request, TransportError, WinrmError};

#[tokio::test]
async fn test_open_shell_parses_id() {
    let transport = ScriptedTransport::new();
    let shell = transport.client().open_shell().await.unwrap();

    assert_eq!(shell.id().as_str(), SHELL_ID);
    assert_eq!(transport.requests(), vec![Request::OpenShell]);
}

#[tokio::test]
async fn test_open_shell_failure_propagates() {
    let transport = ScriptedTransport::new();
    transport.fail_open_shell(TransportError::from_message("401 Unauthorized"));

    let err = transport.client().open_shell().await.unwrap_err();
    assert!(matches!(err, WinrmError::Transport(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_execute_targets_shell() {
    let transport = ScriptedTransport::new();
    let shell = transport.client().open_shell().await.unwrap();
    let cmd = shell.execute("ipconfig", &["/all"]).await.unwrap();

    assert_eq!(cmd.id().as_str(), COMMAND_ID);
    match &transport.requests()[1] {
        Request::ExecuteCommand {
            shell_id,
            command,
            arguments,
        } => {
            assert_eq!(shell_id.as_str(), SHELL_ID);
            assert_eq!(command, "ipconfig");
            assert_eq!(arguments, &vec!["/all".to_string()]);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[tokio::test]
async fn test_shell_close_deletes_shell() {
    let transport = ScriptedTransport::new();
    let shell = transport.client().open_shell().await.unwrap();
    shell.close().await.unwrap();

    assert!(matches!(
        transport.requests().last(),
        Some(Request::DeleteShell { shell_id }) if shell_id.as_str() == SHELL_ID
    ));
}

#[tokio::test]
async fn test_run_closes_shell() {
    let transport = ScriptedTransport::with_outputs([receive(
        &[b"Windows IP Configuration\r\n"],
        &[],
        Some(0),
    )]);

    let result = transport.client().run("ipconfig", &[]).await.unwrap();

    assert!(result.success());
    assert_eq!(result.stdout_text(), "Windows IP Configuration\r\n");
    assert!(matches!(
        transport.requests().last(),
        Some(Request::DeleteShell { .. })
    ));
}

#[tokio::test]
async fn test_run_reports_command_failure_in_result() {
    let transport = ScriptedTransport::with_outputs([common::Reply::Error(
        TransportError::from_message("connection refused"),
    )]);

    let result = transport.client().run("dir", &[]).await.unwrap();

    assert!(matches!(result.error, Some(WinrmError::Transport(_))));
    assert!(result.failed());
    assert!(result.into_result().is_err());
    assert!(matches!(
        transport.requests().last(),
        Some(Request::DeleteShell { .. })
    ));
}

#[tokio::test]
async fn test_run_powershell_encodes_script() {
    let transport = ScriptedTransport::with_outputs([receive(&[b"ok"], &[], Some(0))]);

    let result = transport
        .client()
        .run_powershell(ExecContext::new(), "Get-Date")
        .await
        .unwrap();
    assert_eq!(result.stdout, b"ok");

    let command = transport
        .requests()
        .into_iter()
        .find_map(|r| match r {
            Request::ExecuteCommand { command, .. } => Some(command),
            _ => None,
        })
        .unwrap();
    assert_eq!(command, powershell("Get-Date"));
    assert!(command.starts_with("powershell.exe -EncodedCommand "));
}
