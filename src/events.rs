//! Normalized event model for agent CLI output streams.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An event decoded from one line of an agent CLI's stream-json output.
///
/// Every provider converges on this shape regardless of its own schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Session metadata announced by the agent at startup.
    System {
        /// Provider-specific subtype, usually `init`.
        subtype: String,
        /// The model serving the session, when reported.
        model: String,
        /// The agent's session identifier, when reported.
        session_id: String,
        /// A shell command that resumes this session.
        resume_command: Option<String>,
    },
    /// A user turn echoed back by the agent.
    User {
        /// The message text.
        text: String,
    },
    /// A complete assistant message.
    Assistant {
        /// The message text.
        text: String,
    },
    /// An incremental chunk of assistant text.
    AssistantDelta {
        /// The chunk text.
        text: String,
    },
    /// An incremental chunk of reasoning text.
    Thinking {
        /// The chunk text.
        text: String,
    },
    /// A tool invocation starting or finishing.
    ToolCall(AgentToolCall),
    /// The terminal event of a run.
    Result {
        /// Provider-specific subtype, usually `success`.
        subtype: String,
        /// Wall-clock duration reported by the agent.
        duration_ms: u64,
        /// Whether the agent reported the run as failed.
        is_error: bool,
    },
    /// Text from a line with no recognized structure.
    Unknown {
        /// The extracted text.
        text: String,
    },
}

impl AgentEvent {
    /// Returns the discriminant of this event.
    #[must_use]
    pub const fn event_type(&self) -> AgentEventType {
        match self {
            Self::System { .. } => AgentEventType::System,
            Self::User { .. } => AgentEventType::User,
            Self::Assistant { .. } => AgentEventType::Assistant,
            Self::AssistantDelta { .. } => AgentEventType::AssistantDelta,
            Self::Thinking { .. } => AgentEventType::Thinking,
            Self::ToolCall(_) => AgentEventType::ToolCall,
            Self::Result { .. } => AgentEventType::Result,
            Self::Unknown { .. } => AgentEventType::Unknown,
        }
    }

    /// Returns the free text carried by this event, if it has any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::User { text }
            | Self::Assistant { text }
            | Self::AssistantDelta { text }
            | Self::Thinking { text }
            | Self::Unknown { text } => Some(text),
            Self::System { .. } | Self::ToolCall(_) | Self::Result { .. } => None,
        }
    }

    /// Returns the embedded tool call for `ToolCall` events.
    #[must_use]
    pub const fn tool(&self) -> Option<&AgentToolCall> {
        match self {
            Self::ToolCall(tool) => Some(tool),
            _ => None,
        }
    }
}

/// The discriminant of an [`AgentEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentEventType {
    /// Session metadata.
    System,
    /// User turn.
    User,
    /// Complete assistant message.
    Assistant,
    /// Incremental assistant text.
    AssistantDelta,
    /// Incremental reasoning text.
    Thinking,
    /// Tool invocation.
    ToolCall,
    /// Terminal result.
    Result,
    /// Unrecognized structure.
    Unknown,
}

impl AgentEventType {
    /// Returns the wire name of this event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::AssistantDelta => "assistant_delta",
            Self::Thinking => "thinking",
            Self::ToolCall => "tool_call",
            Self::Result => "result",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AgentEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// The agent asked for the tool to run.
    Started,
    /// The tool returned a result.
    Completed,
}

impl ToolCallStatus {
    /// Returns the wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool call, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentToolCall {
    /// The tool name, `tool` when it could not be determined.
    pub name: String,
    /// The tool's primary argument: a path, pattern, command, url or query.
    pub detail: String,
    /// Whether the call started or completed. Doubles as the event subtype.
    pub status: ToolCallStatus,
    /// A short rendering of the tool output, for completed calls.
    pub summary: Option<String>,
}

impl AgentToolCall {
    /// Creates a started tool call.
    #[must_use]
    pub fn started(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
            status: ToolCallStatus::Started,
            summary: None,
        }
    }

    /// Creates a completed tool call with an optional result summary.
    #[must_use]
    pub fn completed(
        name: impl Into<String>,
        detail: impl Into<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
            status: ToolCallStatus::Completed,
            summary: summary.filter(|s| !s.is_empty()),
        }
    }
}
