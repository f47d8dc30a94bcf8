//! Runs a user-defined command template through the same runner as built-in providers.

use super::json::{decode_object, event_text};
use super::Provider;
use crate::command::ResolvedCommand;
use crate::config::AgentRunOptions;
use std::path::PathBuf;

/// A provider backed by an already-resolved command template.
///
/// The prompt was substituted when the template was resolved, so `build_args`
/// ignores its inputs. There is no structured decoder: output lines go through
/// best-effort text extraction.
#[derive(Debug, Clone)]
pub struct TemplateProvider {
    name: String,
    command: ResolvedCommand,
}

impl TemplateProvider {
    /// Wraps a resolved command under a display name.
    #[must_use]
    pub fn new(name: impl Into<String>, command: ResolvedCommand) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }

    /// Returns the wrapped command.
    #[must_use]
    pub const fn command(&self) -> &ResolvedCommand {
        &self.command
    }
}

impl Provider for TemplateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve_binary(&self) -> Option<PathBuf> {
        Some(self.command.binary.clone())
    }

    fn build_args(
        &self,
        _prompt: &str,
        _issue_context: &str,
        _options: &AgentRunOptions,
    ) -> Vec<String> {
        self.command.args.iter().skip(1).cloned().collect()
    }

    fn parse_stream_line(&self, line: &[u8]) -> Option<String> {
        decode_object(line, &self.name).and_then(|json| event_text(&json))
    }
}
