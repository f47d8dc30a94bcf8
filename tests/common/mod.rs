//! Shared helpers for tests that spawn real processes.

#![allow(dead_code)]

use linear_agent_runner::{AgentRunOptions, ClaudeProvider, EventParser, LookPath, Provider};
use std::path::PathBuf;
use std::sync::Arc;

/// Runs a shell script as the "agent", optionally decoding output as Claude stream-json.
pub struct ShellProvider {
    script: String,
    binary: Option<PathBuf>,
    claude: Option<ClaudeProvider>,
}

impl ShellProvider {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            binary: Some(PathBuf::from("sh")),
            claude: None,
        }
    }

    /// Decodes stdout with the Claude event parser.
    pub fn with_claude_events(mut self) -> Self {
        let missing: LookPath = Arc::new(|_: &str| Err(which::Error::CannotFindBinaryPath));
        self.claude = Some(ClaudeProvider::with_look_path(missing));
        self
    }

    /// Pretends the binary lives at `path`.
    pub fn with_binary(mut self, path: Option<PathBuf>) -> Self {
        self.binary = path;
        self
    }

    pub fn shared(self) -> Arc<dyn Provider> {
        Arc::new(self)
    }
}

impl Provider for ShellProvider {
    fn name(&self) -> &str {
        "shell"
    }

    fn resolve_binary(&self) -> Option<PathBuf> {
        self.binary.clone()
    }

    fn build_args(
        &self,
        _prompt: &str,
        _issue_context: &str,
        _options: &AgentRunOptions,
    ) -> Vec<String> {
        vec!["-c".to_string(), self.script.clone()]
    }

    fn parse_stream_line(&self, line: &[u8]) -> Option<String> {
        self.claude
            .as_ref()
            .and_then(|claude| claude.parse_stream_line(line))
    }

    fn event_parser(&self) -> Option<&dyn EventParser> {
        self.claude
            .as_ref()
            .map(|claude| claude as &dyn EventParser)
    }
}
