//! Provider for the Cursor agent CLI.
//!
//! `cursor-agent --output-format stream-json` emits JSONL events with a `type`
//! field: `system`, `user`, `assistant`, `thinking`, `tool_call` and `result`.
//! Tool calls are keyed by kind, e.g. `{"readToolCall": {"args": {...}}}`, and
//! correlated through `call_id`.

use super::json::{
    decode_object, display_value, event_text, message_text, nested_str, non_empty, str_field,
    tool_detail,
};
use super::tool_uses::ToolUseTable;
use super::{resolve_first, resume_command, system_look_path, EventParser, LookPath, Provider};
use crate::config::{AgentRunOptions, ProviderKind};
use crate::context::compose_prompt;
use crate::events::{AgentEvent, AgentToolCall};
use serde_json::Value;
use std::path::PathBuf;

const BINARY: &str = "cursor-agent";
const TOOL_CALL_SUFFIX: &str = "ToolCall";

/// Invokes `cursor-agent -p` (or its `agent` alias) and decodes its stream-json output.
pub struct CursorProvider {
    look_path: LookPath,
    tool_uses: ToolUseTable,
}

impl CursorProvider {
    /// Creates a provider that resolves `cursor-agent` or `agent` on `PATH`.
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

    fn parse_tool_call(&self, json: &Value) -> Option<AgentEvent> {
        let (kind, body) = json.get("tool_call")?.as_object()?.iter().next()?;
        let name = tool_name(kind, body);
        let detail = tool_args(kind, body)
            .map(|args| tool_detail(Some(&args)))
            .unwrap_or_default();
        let call_id = str_field(json, "call_id");

        if str_field(json, "subtype") == "completed" {
            let (name, detail) = match self.tool_uses.take(call_id) {
                Some(info) => (info.name, info.detail),
                None => (name, detail),
            };
            let name = if name.is_empty() { "tool".to_string() } else { name };
            let summary = body.get("result").and_then(summarize_tool_result);
            return Some(AgentEvent::ToolCall(AgentToolCall::completed(name, detail, summary)));
        }

        self.tool_uses.remember(call_id, &name, &detail);
        Some(AgentEvent::ToolCall(AgentToolCall::started(name, detail)))
    }
}

impl Default for CursorProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for CursorProvider {
    fn name(&self) -> &str {
        ProviderKind::Cursor.display_name()
    }

    fn resolve_binary(&self) -> Option<PathBuf> {
        resolve_first(&self.look_path, ProviderKind::Cursor.binary_names())
    }

    fn build_args(
        &self,
        prompt: &str,
        issue_context: &str,
        options: &AgentRunOptions,
    ) -> Vec<String> {
        let mut args: Vec<String> = ["-p", "--force", "--output-format", "stream-json"]
            .into_iter()
            .map(String::from)
            .collect();
        if let Some(ref model) = options.model {
            args.extend(["--model".to_string(), model.clone()]);
        }
        if let Some(workspace) = options.workspace_arg() {
            args.extend(["--workspace".to_string(), workspace]);
        }
        if let Some(ref sandbox) = options.sandbox {
            args.extend(["--sandbox".to_string(), sandbox.clone()]);
        }
        args.push(compose_prompt(prompt, issue_context));
        args
    }

    fn parse_stream_line(&self, line: &[u8]) -> Option<String> {
        let json = decode_object(line, BINARY)?;
        if let Some(delta) = delta_text(&json) {
            return Some(format!("Assistant delta: {delta}"));
        }
        let labeled = match str_field(&json, "type") {
            "system" => {
                let mut line = format!("System {}", str_field(&json, "subtype"));
                if let Some(model) = non_empty(str_field(&json, "model")) {
                    line.push_str(&format!(" (model {model})"));
                }
                Some(line.trim().to_string())
            }
            "user" => Some(format!("User: {}", message_text(&json).trim())),
            "assistant" => Some(format!("Assistant: {}", message_text(&json).trim())),
            "thinking" => Some(
                non_empty(str_field(&json, "text"))
                    .map(|text| format!("Thinking: {text}"))
                    .unwrap_or_default(),
            ),
            "result" => Some(
                non_empty(str_field(&json, "result")).map_or_else(
                    || format!("Result {}", str_field(&json, "subtype")).trim().to_string(),
                    |text| format!("Result: {text}"),
                ),
            ),
            "tool_call" => Some(tool_call_line(&json)),
            _ => None,
        };
        labeled.or_else(|| event_text(&json))
    }

    fn event_parser(&self) -> Option<&dyn EventParser> {
        Some(self)
    }
}

impl EventParser for CursorProvider {
    fn parse_event(&self, line: &[u8]) -> Option<AgentEvent> {
        let json = decode_object(line, BINARY)?;

        if let Some(text) = delta_text(&json) {
            return Some(AgentEvent::AssistantDelta { text });
        }

        match str_field(&json, "type") {
            "system" => {
                let session_id = str_field(&json, "session_id");
                return Some(AgentEvent::System {
                    subtype: str_field(&json, "subtype").to_string(),
                    model: str_field(&json, "model").to_string(),
                    session_id: session_id.to_string(),
                    resume_command: resume_command(BINARY, session_id),
                });
            }
            "user" => {
                if let Some(text) = non_empty(&message_text(&json)) {
                    return Some(AgentEvent::User { text });
                }
            }
            "assistant" => {
                if let Some(text) = non_empty(&message_text(&json)) {
                    return Some(AgentEvent::Assistant { text });
                }
            }
            "thinking" => {
                let text = str_field(&json, "text");
                if !text.trim().is_empty() {
                    return Some(AgentEvent::Thinking {
                        text: text.to_string(),
                    });
                }
            }
            "tool_call" => return self.parse_tool_call(&json),
            "result" => {
                let subtype = str_field(&json, "subtype").to_string();
                let duration_ms = json.get("duration_ms").and_then(Value::as_u64).unwrap_or(0);
                let is_error = json.get("is_error").and_then(Value::as_bool).unwrap_or(false);
                if is_error {
                    tracing::error!(%subtype, duration_ms, "cursor reported a failed result");
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

/// Returns the streamed assistant text in `delta.text` or `delta.content`.
fn delta_text(json: &Value) -> Option<String> {
    non_empty(nested_str(json, "delta", "text"))
        .or_else(|| non_empty(nested_str(json, "delta", "content")))
}

/// Derives a tool name from its payload key: `readToolCall` becomes `read`.
fn tool_name(kind: &str, body: &Value) -> String {
    if kind == "function" {
        return str_field(body, "name").trim().to_string();
    }
    kind.strip_suffix(TOOL_CALL_SUFFIX).unwrap_or(kind).to_string()
}

/// Returns the tool arguments; function calls carry them as a JSON string.
fn tool_args(kind: &str, body: &Value) -> Option<Value> {
    if kind == "function" {
        let raw = str_field(body, "arguments");
        return serde_json::from_str(raw).ok();
    }
    body.get("args").cloned()
}

fn tool_call_line(json: &Value) -> String {
    let subtype = str_field(json, "subtype");
    let Some((kind, body)) = json
        .get("tool_call")
        .and_then(Value::as_object)
        .and_then(|call| call.iter().next())
    else {
        return format!("Tool call {subtype}").trim().to_string();
    };
    let detail = tool_args(kind, body)
        .map(|args| tool_detail(Some(&args)))
        .unwrap_or_default();
    format!("Tool call {subtype}: {} {detail}", tool_name(kind, body))
        .trim()
        .to_string()
}

/// Reduces a `result` payload (`{"success": {...}}` or `{"error": {...}}`) to a short string.
fn summarize_tool_result(result: &Value) -> Option<String> {
    if let Value::String(text) = result {
        return non_empty(text);
    }
    if let Some(error) = result.get("error") {
        let message = ["errorMessage", "message", "error"]
            .iter()
            .find_map(|key| non_empty(str_field(error, key)))
            .or_else(|| non_empty(&display_value(error)))?;
        return Some(format!("error: {message}"));
    }
    let success = result.get("success")?;
    if let Some(lines) = success.get("totalLines").and_then(Value::as_u64) {
        return Some(format!("{lines} lines"));
    }
    if let Some(lines) = success.get("linesCreated").and_then(Value::as_u64) {
        return Some(format!("{lines} lines written"));
    }
    ["stdout", "output", "message", "content"]
        .iter()
        .find_map(|key| non_empty(str_field(success, key)))
        .or_else(|| non_empty(&display_value(success)))
}
