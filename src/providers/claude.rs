//! Provider for the Claude Code CLI.
//!
//! Claude Code emits JSONL events with a `type` field. Known event types include:
//! - `system`: session metadata including the session id and model
//! - `assistant`: message content blocks (`text`, `tool_use`)
//! - `user`: tool results fed back to the model (`tool_result` blocks)
//! - `stream_event`: partial-message frames wrapping text and thinking deltas
//! - `result`: the final event of a run

use super::json::{
    content_text, decode_object, display_value, event_text, message_text, nested_str,
    non_empty, str_field, tool_detail,
};
use super::tool_uses::ToolUseTable;
use super::{resolve_first, resume_command, system_look_path, EventParser, LookPath, Provider};
use crate::config::{AgentRunOptions, ProviderKind};
use crate::context::compose_prompt;
use crate::events::{AgentEvent, AgentToolCall};
use serde_json::Value;
use std::path::PathBuf;

const BINARY: &str = "claude";

/// Invokes `claude -p` and decodes its stream-json output.
pub struct ClaudeProvider {
    look_path: LookPath,
    tool_uses: ToolUseTable,
}

impl ClaudeProvider {
    /// Creates a provider that resolves `claude` on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_look_path(system_look_path())
    }

    /// Creates a provider with a custom binary lookup.
    #[must_use]
    pub fn with_look_path(look_path: LookPath) -> Self {
        Self {
            look_path,
            tool_uses: ToolUseTable::default(),
        }
    }

    /// Returns how many tool starts are still waiting for their result.
    #[must_use]
    pub fn pending_tool_calls(&self) -> usize {
        self.tool_uses.len()
    }

    fn parse_tool_use(&self, json: &Value) -> Option<AgentEvent> {
        let block = content_blocks(json).find(|block| str_field(block, "type") == "tool_use")?;
        let name = str_field(block, "name").trim();
        let detail = tool_detail(block.get("input"));
        self.tool_uses.remember(str_field(block, "id"), name, &detail);
        Some(AgentEvent::ToolCall(AgentToolCall::started(name, detail)))
    }

    fn parse_tool_result(&self, json: &Value) -> Option<AgentEvent> {
        let block =
            content_blocks(json).find(|block| str_field(block, "type") == "tool_result")?;
        let tool_use_id = str_field(block, "tool_use_id").trim();
        if tool_use_id.is_empty() {
            return None;
        }
        let info = self.tool_uses.take(tool_use_id);
        if info.is_none() {
            tracing::debug!(tool_use_id, "tool result without a recorded start");
        }
        let (name, detail) = info.map_or_else(
            || ("tool".to_string(), String::new()),
            |info| {
                let name = if info.name.is_empty() { "tool".to_string() } else { info.name };
                (name, info.detail)
            },
        );
        let summary = summarize_tool_result(block.get("content"), json.get("tool_use_result"));
        Some(AgentEvent::ToolCall(AgentToolCall::completed(name, detail, summary)))
    }
}

impl Default for ClaudeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for ClaudeProvider {
    fn name(&self) -> &str {
        ProviderKind::Claude.display_name()
    }

    fn resolve_binary(&self) -> Option<PathBuf> {
        resolve_first(&self.look_path, ProviderKind::Claude.binary_names())
    }

    fn build_args(
        &self,
        prompt: &str,
        issue_context: &str,
        options: &AgentRunOptions,
    ) -> Vec<String> {
        let mut args: Vec<String> = [
            "-p",
            "--verbose",
            "--output-format",
            "stream-json",
            "--include-partial-messages",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        if let Some(ref model) = options.model {
            args.extend(["--model".to_string(), model.clone()]);
        }
        if let Some(workspace) = options.workspace_arg() {
            args.extend(["--add-dir".to_string(), workspace]);
        }
        if let Some(mode) = options.sandbox.as_deref().and_then(permission_mode) {
            args.extend(["--permission-mode".to_string(), mode.to_string()]);
        }
        args.push(compose_prompt(prompt, issue_context));
        args
    }

    fn parse_stream_line(&self, line: &[u8]) -> Option<String> {
        let json = decode_object(line, BINARY)?;
        if str_field(&json, "type") == "stream_event" {
            let text = stream_delta(&json)
                .and_then(|event| event.text().map(str::to_string))
                .unwrap_or_default();
            return Some(text);
        }
        event_text(&json)
    }

    fn event_parser(&self) -> Option<&dyn EventParser> {
        Some(self)
    }
}

impl EventParser for ClaudeProvider {
    fn parse_event(&self, line: &[u8]) -> Option<AgentEvent> {
        let json = decode_object(line, BINARY)?;

        if let Some(text) = non_empty(nested_str(&json, "delta", "text")) {
            return Some(AgentEvent::AssistantDelta { text });
        }

        match str_field(&json, "type") {
            "stream_event" => return stream_delta(&json),
            "system" => {
                let session_id = str_field(&json, "session_id");
                return Some(AgentEvent::System {
                    subtype: str_field(&json, "subtype").to_string(),
                    model: str_field(&json, "model").to_string(),
                    session_id: session_id.to_string(),
                    resume_command: resume_command(BINARY, session_id),
                });
            }
            "assistant" => {
                if let Some(event) = self.parse_tool_use(&json) {
                    return Some(event);
                }
                let text = message_text(&json);
                if !text.is_empty() {
                    return Some(AgentEvent::Assistant { text });
                }
            }
            "user" => {
                if let Some(event) = self.parse_tool_result(&json) {
                    return Some(event);
                }
                let text = message_text(&json);
                if !text.is_empty() {
                    return Some(AgentEvent::User { text });
                }
            }
            "result" => {
                let subtype = str_field(&json, "subtype").to_string();
                let duration_ms = json.get("duration_ms").and_then(Value::as_u64).unwrap_or(0);
                let is_error = json.get("is_error").and_then(Value::as_bool).unwrap_or(false);
                if is_error {
                    tracing::error!(%subtype, duration_ms, "claude reported a failed result");
                }
                return Some(AgentEvent::Result {
                    subtype,
                    duration_ms,
                    is_error,
                });
            }
            _ => {}
        }

        event_text(&json).map(|text| AgentEvent::Unknown { text })
    }
}

/// Decodes the text or thinking delta inside a `stream_event` frame.
fn stream_delta(json: &Value) -> Option<AgentEvent> {
    let delta = json.get("event")?.get("delta")?;
    match str_field(delta, "type") {
        "text_delta" => {
            non_empty(str_field(delta, "text")).map(|text| AgentEvent::AssistantDelta { text })
        }
        "thinking_delta" => {
            let text = str_field(delta, "thinking");
            (!text.is_empty()).then(|| AgentEvent::Thinking {
                text: text.to_string(),
            })
        }
        _ => None,
    }
}

fn content_blocks(json: &Value) -> impl Iterator<Item = &Value> {
    json.get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Maps the sandbox setting onto a Claude permission mode.
fn permission_mode(sandbox: &str) -> Option<&'static str> {
    match sandbox.trim().to_lowercase().as_str() {
        "enabled" => Some("default"),
        "disabled" => Some("bypassPermissions"),
        _ => None,
    }
}

/// Reduces a tool result payload to a short display string.
fn summarize_tool_result(
    content: Option<&Value>,
    tool_use_result: Option<&Value>,
) -> Option<String> {
    match content {
        Some(Value::String(text)) => return non_empty(text),
        Some(blocks @ Value::Array(_)) => {
            let text = content_text(blocks);
            return non_empty(&text).or_else(|| non_empty(&blocks.to_string()));
        }
        Some(object @ Value::Object(_)) => return non_empty(&object.to_string()),
        _ => {}
    }
    match tool_use_result? {
        Value::String(text) => non_empty(text),
        Value::Object(result) => {
            let filenames: Vec<String> = result
                .get("filenames")
                .and_then(Value::as_array)
                .map(|names| names.iter().map(display_value).collect())
                .unwrap_or_default();
            if !filenames.is_empty() {
                return non_empty(&filenames.join(", "));
            }
            result
                .get("numFiles")
                .and_then(Value::as_u64)
                .filter(|count| *count > 0)
                .map(|count| format!("{count} files"))
        }
        Value::Null => None,
        other => non_empty(&other.to_string()),
    }
}
