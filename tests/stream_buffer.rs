//! Tests for coalescing agent events into display lines.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use linear_agent_runner::{
    AgentEvent, AgentToolCall, StreamBuffer, StreamLine, StreamLineKind, THINKING_FLUSH_CHARS,
};

fn thinking(text: &str) -> AgentEvent {
    AgentEvent::Thinking {
        text: text.to_string(),
    }
}

fn result() -> AgentEvent {
    AgentEvent::Result {
        subtype: "success".to_string(),
        duration_ms: 1200,
        is_error: false,
    }
}

#[test]
fn test_large_thinking_chunk_flushes_immediately() {
    let mut buffer = StreamBuffer::new();
    let update = buffer.append(&thinking(&"a".repeat(THINKING_FLUSH_CHARS + 1)));

    assert_eq!(update.lines.len(), 1);
    assert_eq!(update.lines[0].kind, StreamLineKind::Thinking);
    assert!(!update.lines[0].text.is_empty());
    assert!(!update.done);
}

#[test]
fn test_thinking_coalesces_until_other_event() {
    let mut buffer = StreamBuffer::new();
    assert!(buffer.append(&thinking("first ")).lines.is_empty());
    assert!(buffer.append(&thinking("second")).lines.is_empty());

    let update = buffer.append(&AgentEvent::User {
        text: "prompt".to_string(),
    });
    assert_eq!(
        update.lines,
        [
            StreamLine {
                kind: StreamLineKind::Thinking,
                text: "first second".to_string(),
            },
            StreamLine {
                kind: StreamLineKind::User,
                text: "prompt".to_string(),
            },
        ]
    );
}

#[test]
fn test_thinking_threshold_counts_accumulated_chars() {
    let mut buffer = StreamBuffer::new();
    let half = "b".repeat(THINKING_FLUSH_CHARS / 2);
    assert!(buffer.append(&thinking(&half)).lines.is_empty());

    let update = buffer.append(&thinking(&half));
    assert_eq!(update.lines.len(), 1);
    assert_eq!(update.lines[0].text.len(), THINKING_FLUSH_CHARS);

    assert!(buffer.append(&thinking("c")).lines.is_empty());
}

#[test]
fn test_assistant_and_result() {
    let mut buffer = StreamBuffer::new();
    let update = buffer.append(&AgentEvent::Assistant {
        text: "first response".to_string(),
    });
    assert!(update.lines.is_empty());

    let update = buffer.append(&result());
    assert!(update.done);
    assert_eq!(update.final_text, "first response");
    assert!(update.lines.is_empty());
    assert!(buffer.is_done());
}

#[test]
fn test_multiple_assistant_messages_join_with_newline() {
    let mut buffer = StreamBuffer::new();
    buffer.append(&AgentEvent::Assistant {
        text: "one".to_string(),
    });
    buffer.append(&AgentEvent::Assistant {
        text: "two".to_string(),
    });
    assert_eq!(buffer.final_text(), "one\ntwo");
    assert_eq!(buffer.append(&result()).final_text, "one\ntwo");
}

#[test]
fn test_result_flushes_pending_thinking() {
    let mut buffer = StreamBuffer::new();
    buffer.append(&thinking("pondering"));
    let update = buffer.append(&result());
    assert!(update.done);
    assert_eq!(update.lines.len(), 1);
    assert_eq!(update.lines[0].kind, StreamLineKind::Thinking);
    assert_eq!(update.lines[0].text, "pondering");
}

#[test]
fn test_flush_drains_pending_thinking() {
    let mut buffer = StreamBuffer::new();
    assert_eq!(buffer.flush(), None);
    buffer.append(&thinking("  tail  "));
    let line = buffer.flush().expect("pending thinking");
    assert_eq!(line.text, "tail");
    assert_eq!(buffer.flush(), None);
}

#[test]
fn test_tool_call_and_system_lines() {
    let mut buffer = StreamBuffer::new();
    let update = buffer.append(&AgentEvent::ToolCall(AgentToolCall::completed(
        "read",
        "README.md",
        Some("42 lines".to_string()),
    )));
    assert_eq!(update.lines[0].kind, StreamLineKind::ToolCall);
    assert_eq!(update.lines[0].text, "completed read README.md: 42 lines");

    let update = buffer.append(&AgentEvent::ToolCall(AgentToolCall::started("glob", "")));
    assert_eq!(update.lines[0].text, "started glob");

    let update = buffer.append(&AgentEvent::System {
        subtype: "init".to_string(),
        model: "opus".to_string(),
        session_id: "abc".to_string(),
        resume_command: Some("claude --resume abc".to_string()),
    });
    assert_eq!(update.lines[0].kind, StreamLineKind::System);
    assert_eq!(
        update.lines[0].text,
        "init | model opus | resume with: claude --resume abc"
    );
}

#[test]
fn test_deltas_and_unknown_render_text() {
    let mut buffer = StreamBuffer::new();
    let update = buffer.append(&AgentEvent::AssistantDelta {
        text: "Hel".to_string(),
    });
    assert_eq!(update.lines[0].kind, StreamLineKind::AssistantDelta);
    assert_eq!(update.lines[0].text, "Hel");

    let update = buffer.append(&AgentEvent::Unknown {
        text: "???".to_string(),
    });
    assert_eq!(update.lines[0].kind, StreamLineKind::Unknown);
    assert_eq!(update.lines[0].kind.to_string(), "unknown");
}
