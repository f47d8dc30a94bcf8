//! Coalesces agent events into display lines.

use crate::events::AgentEvent;
use std::fmt;

/// Pending thinking text is flushed as one line once it reaches this many characters.
pub const THINKING_FLUSH_CHARS: usize = 200;

/// What a display line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamLineKind {
    /// Session metadata.
    System,
    /// User turn.
    User,
    /// Incremental assistant text.
    AssistantDelta,
    /// Coalesced reasoning text.
    Thinking,
    /// Tool invocation.
    ToolCall,
    /// Unrecognized output.
    Unknown,
}

impl StreamLineKind {
    /// Returns a short label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::AssistantDelta => "assistant_delta",
            Self::Thinking => "thinking",
            Self::ToolCall => "tool_call",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StreamLineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLine {
    /// What the line shows.
    pub kind: StreamLineKind,
    /// The line text.
    pub text: String,
}

/// The outcome of feeding one event to a [`StreamBuffer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferUpdate {
    /// Lines that became ready, in display order.
    pub lines: Vec<StreamLine>,
    /// Whether the run's terminal event was seen.
    pub done: bool,
    /// The accumulated assistant answer, set when `done`.
    pub final_text: String,
}

/// Turns a run's event sequence into display lines plus a completion signal.
///
/// Thinking chunks are batched so reasoning output shows up in readable
/// pieces instead of one line per token. Assistant messages are held back as
/// the final answer.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    thinking: String,
    thinking_chars: usize,
    assistant: String,
    done: bool,
}

impl StreamBuffer {
    /// Creates an empty buffer for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one event, returning whatever became ready to display.
    pub fn append(&mut self, event: &AgentEvent) -> BufferUpdate {
        let mut update = BufferUpdate::default();

        if let AgentEvent::Thinking { text } = event {
            self.thinking.push_str(text);
            self.thinking_chars += text.chars().count();
            if self.thinking_chars >= THINKING_FLUSH_CHARS {
                update.lines.extend(self.flush_thinking());
            }
            return update;
        }

        update.lines.extend(self.flush_thinking());

        match event {
            AgentEvent::Assistant { text } => {
                if !self.assistant.is_empty() {
                    self.assistant.push('\n');
                }
                self.assistant.push_str(text);
            }
            AgentEvent::Result { .. } => {
                self.done = true;
                update.done = true;
                update.final_text.clone_from(&self.assistant);
            }
            other => {
                if let Some(line) = render(other) {
                    update.lines.push(line);
                }
            }
        }
        update
    }

    /// Drains pending thinking text, e.g. when the process exits without a result.
    pub fn flush(&mut self) -> Option<StreamLine> {
        self.flush_thinking()
    }

    /// Returns the assistant text accumulated so far.
    #[must_use]
    pub fn final_text(&self) -> &str {
        &self.assistant
    }

    /// Whether the terminal event was seen.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    fn flush_thinking(&mut self) -> Option<StreamLine> {
        if self.thinking.is_empty() {
            return None;
        }
        self.thinking_chars = 0;
        let text = std::mem::take(&mut self.thinking);
        let text = text.trim();
        (!text.is_empty()).then(|| StreamLine {
            kind: StreamLineKind::Thinking,
            text: text.to_string(),
        })
    }
}

fn render(event: &AgentEvent) -> Option<StreamLine> {
    let (kind, text) = match event {
        AgentEvent::System {
            subtype,
            model,
            session_id,
            resume_command,
        } => {
            let mut parts = Vec::new();
            if !subtype.is_empty() {
                parts.push(subtype.clone());
            }
            if !model.is_empty() {
                parts.push(format!("model {model}"));
            }
            match resume_command {
                Some(resume) => parts.push(format!("resume with: {resume}")),
                None if !session_id.is_empty() => parts.push(format!("session {session_id}")),
                None => {}
            }
            (StreamLineKind::System, parts.join(" | "))
        }
        AgentEvent::ToolCall(tool) => {
            let mut text = format!("{} {}", tool.status, tool.name);
            if !tool.detail.is_empty() {
                text.push(' ');
                text.push_str(&tool.detail);
            }
            if let Some(ref summary) = tool.summary {
                text.push_str(": ");
                text.push_str(summary);
            }
            (StreamLineKind::ToolCall, text)
        }
        AgentEvent::User { text } => (StreamLineKind::User, text.clone()),
        AgentEvent::AssistantDelta { text } => (StreamLineKind::AssistantDelta, text.clone()),
        AgentEvent::Unknown { text } => (StreamLineKind::Unknown, text.clone()),
        AgentEvent::Thinking { .. } | AgentEvent::Assistant { .. } | AgentEvent::Result { .. } => {
            return None;
        }
    };
    Some(StreamLine { kind, text })
}
