//! Provider adapters: how to invoke each agent CLI and decode its stream-json.

pub mod claude;
pub mod cursor;
mod json;
pub mod template;
mod tool_uses;

use crate::config::{AgentRunOptions, ProviderKind};
use crate::error::Result;
use crate::events::AgentEvent;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolves a binary name against the executable search path.
pub type LookPath =
    Arc<dyn Fn(&str) -> std::result::Result<PathBuf, which::Error> + Send + Sync>;

/// Returns a [`LookPath`] backed by `which`.
#[must_use]
pub fn system_look_path() -> LookPath {
    Arc::new(|name: &str| which::which(name))
}

/// Describes how to invoke and interpret one agent CLI.
pub trait Provider: Send + Sync {
    /// Returns a short display name.
    fn name(&self) -> &str;

    /// Returns the executable path, or `None` when the CLI is not installed.
    fn resolve_binary(&self) -> Option<PathBuf>;

    /// Returns the argv (without the program) for a non-interactive streaming run.
    fn build_args(&self, prompt: &str, issue_context: &str, options: &AgentRunOptions)
        -> Vec<String>;

    /// Extracts display text from one raw output line.
    ///
    /// Returns `None` when the line is not JSON. `Some("")` marks a line that
    /// was understood but has nothing worth showing.
    fn parse_stream_line(&self, line: &[u8]) -> Option<String>;

    /// Returns the structured decoder, for providers that have one.
    fn event_parser(&self) -> Option<&dyn EventParser> {
        None
    }
}

/// Decodes raw output lines into structured events.
pub trait EventParser: Send + Sync {
    /// Decodes one line, returning `None` when it has no recognized structure.
    fn parse_event(&self, line: &[u8]) -> Option<AgentEvent>;
}

/// Resolves the first of `names` found by `look_path`.
pub(crate) fn resolve_first(look_path: &LookPath, names: &[&str]) -> Option<PathBuf> {
    names.iter().find_map(|name| look_path(name).ok())
}

/// Builds the built-in provider for `kind`.
#[must_use]
pub fn provider_for_kind(kind: ProviderKind, look_path: LookPath) -> Arc<dyn Provider> {
    match kind {
        ProviderKind::Cursor => Arc::new(cursor::CursorProvider::with_look_path(look_path)),
        ProviderKind::Claude => Arc::new(claude::ClaudeProvider::with_look_path(look_path)),
    }
}

/// Builds the provider named by a settings key such as `" Claude "`.
///
/// # Errors
///
/// Returns [`crate::Error::UnknownProvider`] for keys that name no provider.
pub fn provider_for_key(key: &str, look_path: LookPath) -> Result<Arc<dyn Provider>> {
    let kind: ProviderKind = key.parse()?;
    Ok(provider_for_kind(kind, look_path))
}

/// Lists the keys of providers whose binary is installed.
#[must_use]
pub fn available_provider_keys(look_path: &LookPath) -> Vec<&'static str> {
    ProviderKind::ALL
        .into_iter()
        .filter(|kind| resolve_first(look_path, kind.binary_names()).is_some())
        .map(ProviderKind::key)
        .collect()
}

/// Builds the "resume this session" hint for a session id.
pub(crate) fn resume_command(binary: &str, session_id: &str) -> Option<String> {
    let session_id = session_id.trim();
    (!session_id.is_empty()).then(|| format!("{binary} --resume {session_id}"))
}
