//! Integration tests for spawning agent processes and streaming their output.

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::ShellProvider;
use linear_agent_runner::{
    AgentEvent, AgentEventType, AgentRunOptions, Error, RunCallbacks, Runner, StreamSource,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Captured {
    events: Mutex<Vec<AgentEvent>>,
    lines: Mutex<Vec<String>>,
    errors: Mutex<Vec<Error>>,
}

impl Captured {
    fn callbacks(self: &Arc<Self>) -> RunCallbacks {
        let events = Arc::clone(self);
        let lines = Arc::clone(self);
        let errors = Arc::clone(self);
        RunCallbacks::new()
            .on_event(move |event| events.events.lock().push(event))
            .on_line(move |line| lines.lines.lock().push(line))
            .on_err(move |err| errors.errors.lock().push(err))
    }
}

async fn run_script(
    provider: ShellProvider,
    options: &AgentRunOptions,
) -> (linear_agent_runner::Result<()>, Arc<Captured>) {
    let captured = Arc::new(Captured::default());
    let result = Runner::new()
        .run(
            &CancellationToken::new(),
            provider.shared(),
            "prompt",
            "context",
            options,
            captured.callbacks(),
        )
        .await;
    (result, captured)
}

#[tokio::test]
async fn test_plain_lines_from_both_streams() {
    let (result, captured) = run_script(
        ShellProvider::new("printf 'hello\\r\\nworld\\n\\n'; printf 'oops\\n' >&2"),
        &AgentRunOptions::new(),
    )
    .await;

    result.unwrap();
    let lines = captured.lines.lock();
    let stdout: Vec<&String> = lines.iter().filter(|l| !l.starts_with("stderr: ")).collect();
    assert_eq!(stdout, ["hello", "world"]);
    assert!(lines.contains(&"stderr: oops".to_string()));
    assert!(captured.events.lock().is_empty());
    assert!(captured.errors.lock().is_empty());
}

#[tokio::test]
async fn test_structured_events_are_decoded() {
    let script = r#"
echo '{"type":"system","subtype":"init","session_id":"s1","model":"opus"}'
echo 'plain progress'
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"done"}]}}'
echo '{"type":"result","subtype":"success","duration_ms":5,"is_error":false}'
"#;
    let (result, captured) =
        run_script(ShellProvider::new(script).with_claude_events(), &AgentRunOptions::new()).await;

    result.unwrap();
    let types: Vec<AgentEventType> = captured
        .events
        .lock()
        .iter()
        .map(AgentEvent::event_type)
        .collect();
    assert_eq!(
        types,
        [
            AgentEventType::System,
            AgentEventType::Assistant,
            AgentEventType::Result
        ]
    );
    assert_eq!(*captured.lines.lock(), ["plain progress"]);
}

#[tokio::test]
async fn test_non_zero_exit_is_an_error() {
    let (result, captured) = run_script(
        ShellProvider::new("echo partial; exit 3"),
        &AgentRunOptions::new(),
    )
    .await;

    match result {
        Err(Error::ProcessExited { provider, status }) => {
            assert_eq!(provider, "shell");
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("expected ProcessExited, got {other:?}"),
    }
    assert_eq!(*captured.lines.lock(), ["partial"]);
}

#[tokio::test]
async fn test_unavailable_provider_fails_before_spawning() {
    let (result, captured) = run_script(
        ShellProvider::new("echo never").with_binary(None),
        &AgentRunOptions::new(),
    )
    .await;

    assert!(matches!(
        result,
        Err(Error::ProviderUnavailable { ref provider }) if provider == "shell"
    ));
    assert!(captured.lines.lock().is_empty());
}

#[tokio::test]
async fn test_missing_binary_fails_to_start() {
    let (result, _) = run_script(
        ShellProvider::new("echo never").with_binary(Some(PathBuf::from("/nonexistent/agent-xyz"))),
        &AgentRunOptions::new(),
    )
    .await;

    assert!(matches!(result, Err(Error::ProcessStartFailed { .. })));
}

#[tokio::test]
async fn test_workspace_sets_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let options = AgentRunOptions::new().with_workspace(dir.path());
    let (result, captured) = run_script(ShellProvider::new("pwd"), &options).await;

    result.unwrap();
    let lines = captured.lines.lock();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        PathBuf::from(&lines[0]).canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

async fn run_cancelled_after(
    provider: ShellProvider,
    delay: Duration,
) -> (linear_agent_runner::Result<()>, Arc<Captured>) {
    let cancel = CancellationToken::new();
    let captured = Arc::new(Captured::default());
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        trigger.cancel();
    });

    let runner = Runner::new();
    let options = AgentRunOptions::new();
    let run = runner.run(
        &cancel,
        provider.shared(),
        "prompt",
        "",
        &options,
        captured.callbacks(),
    );
    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("cancelled run should finish promptly");
    (result, captured)
}

#[tokio::test]
async fn test_cancellation_kills_the_process() {
    let (result, captured) = run_cancelled_after(
        ShellProvider::new("echo started; exec sleep 30"),
        Duration::from_millis(200),
    )
    .await;

    assert!(matches!(result, Err(Error::Cancelled { .. })));
    assert_eq!(*captured.lines.lock(), ["started"]);
    assert!(captured.errors.lock().is_empty());
}

#[tokio::test]
async fn test_cancellation_returns_while_grandchild_holds_pipes() {
    let (result, captured) = run_cancelled_after(
        ShellProvider::new("echo started; sleep 30; echo after"),
        Duration::from_millis(200),
    )
    .await;

    assert!(matches!(result, Err(Error::Cancelled { .. })));
    assert_eq!(*captured.lines.lock(), ["started"]);
    assert!(captured.errors.lock().is_empty());
}

#[tokio::test]
async fn test_cancelled_run_that_exited_cleanly_succeeds() {
    // The shell exits 0 at once while a background sleep keeps the pipes open.
    let (result, captured) = run_cancelled_after(
        ShellProvider::new("echo started; sleep 10 & exit 0"),
        Duration::from_millis(200),
    )
    .await;

    result.unwrap();
    assert_eq!(*captured.lines.lock(), ["started"]);
}

#[tokio::test]
async fn test_oversized_line_reports_stream_error() {
    let (_, captured) = run_script(
        ShellProvider::new(
            r"echo early >&2; head -c 2000000 /dev/zero | tr '\000' a; sleep 0.2; echo late >&2",
        ),
        &AgentRunOptions::new(),
    )
    .await;

    let lines = captured.lines.lock();
    assert!(lines.contains(&"stderr: early".to_string()));
    assert!(lines.contains(&"stderr: late".to_string()));
    assert!(lines.iter().all(|line| line.starts_with("stderr: ")));

    let errors = captured.errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        Error::StreamRead {
            stream: StreamSource::Stdout,
            ..
        }
    ));
}

#[tokio::test]
async fn test_callbacks_are_optional() {
    let result = Runner::new()
        .run(
            &CancellationToken::new(),
            ShellProvider::new("echo ignored; echo also >&2").shared(),
            "prompt",
            "",
            &AgentRunOptions::new(),
            RunCallbacks::default(),
        )
        .await;
    result.unwrap();
}

#[tokio::test]
async fn test_command_factory_replaces_spawned_program() {
    let seen_args = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen_args);
    let runner = Runner::new().with_command_factory(move |_binary, args| {
        recorder.lock().extend(args.iter().cloned());
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo from factory");
        cmd
    });

    let captured = Arc::new(Captured::default());
    let provider = ShellProvider::new("echo original")
        .with_binary(Some(PathBuf::from("/nonexistent/agent-xyz")))
        .shared();
    runner
        .run(
            &CancellationToken::new(),
            provider,
            "prompt",
            "",
            &AgentRunOptions::new(),
            captured.callbacks(),
        )
        .await
        .unwrap();

    assert_eq!(*captured.lines.lock(), ["from factory"]);
    assert_eq!(*seen_args.lock(), ["-c", "echo original"]);
}
