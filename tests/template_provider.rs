//! Tests for providers built from user command templates.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use linear_agent_runner::{
    parse_command_with, AgentRunOptions, LookPath, Provider, ResolvedCommand, TemplateProvider,
};
use std::path::PathBuf;
use std::sync::Arc;

fn stub_look_path() -> LookPath {
    Arc::new(|name: &str| Ok(PathBuf::from("/opt/bin").join(name)))
}

fn review_provider() -> TemplateProvider {
    let command = parse_command_with(
        &stub_look_path(),
        "agent --mode review {prompt} --branch {branch}",
        "fix the\nlogin bug",
        "feature/login",
    )
    .unwrap();
    TemplateProvider::new("Review", command)
}

#[test]
fn test_name_and_binary_come_from_the_template() {
    let provider = review_provider();
    assert_eq!(provider.name(), "Review");
    assert_eq!(provider.resolve_binary(), Some(PathBuf::from("/opt/bin/agent")));
    assert_eq!(provider.command().binary, PathBuf::from("/opt/bin/agent"));
}

#[test]
fn test_build_args_skips_program_and_keeps_prompt_whole() {
    let provider = review_provider();
    let args = provider.build_args("ignored", "ignored", &AgentRunOptions::new().with_model("x"));
    assert_eq!(
        args,
        ["--mode", "review", "fix the\nlogin bug", "--branch", "feature/login"]
    );
}

#[test]
fn test_bare_binary_has_no_args() {
    let command = ResolvedCommand {
        binary: PathBuf::from("/usr/bin/agent"),
        args: vec!["/usr/bin/agent".to_string()],
    };
    let provider = TemplateProvider::new("Bare", command);
    assert!(provider
        .build_args("p", "", &AgentRunOptions::new())
        .is_empty());
}

#[test]
fn test_has_no_event_parser() {
    assert!(review_provider().event_parser().is_none());
}

#[test]
fn test_parse_stream_line_extracts_text() {
    let provider = review_provider();
    assert_eq!(provider.parse_stream_line(b"not-json"), None);
    assert_eq!(provider.parse_stream_line(b"{broken"), None);
    assert_eq!(provider.parse_stream_line(br#"{"status":"ok"}"#), None);
    assert_eq!(
        provider.parse_stream_line(br#"{"text":"  step one  "}"#).as_deref(),
        Some("step one")
    );
    assert_eq!(
        provider
            .parse_stream_line(br#"{"delta":{"text":"partial"}}"#)
            .as_deref(),
        Some("partial")
    );
    assert_eq!(
        provider
            .parse_stream_line(br#"{"message":{"content":[{"type":"text","text":"answer"}]}}"#)
            .as_deref(),
        Some("answer")
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_template_runs_end_to_end() {
    use linear_agent_runner::{parse_command, RunCallbacks, Runner};
    use parking_lot::Mutex;
    use tokio_util::sync::CancellationToken;

    let command = parse_command("echo {prompt}", "hi there", "").unwrap();
    let provider = Arc::new(TemplateProvider::new("Echo", command));

    let lines = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let line_sink = Arc::clone(&lines);
    let event_sink = Arc::clone(&events);
    let callbacks = RunCallbacks::new()
        .on_line(move |line| line_sink.lock().push(line))
        .on_event(move |event| event_sink.lock().push(event));

    Runner::new()
        .run(
            &CancellationToken::new(),
            provider,
            "unused",
            "unused context",
            &AgentRunOptions::new(),
            callbacks,
        )
        .await
        .unwrap();

    assert_eq!(*lines.lock(), ["hi there"]);
    assert!(events.lock().is_empty());
}
