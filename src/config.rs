//! Run options, provider kinds and persisted agent settings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable holding the log file path. Empty disables logging.
pub const LOG_FILE_ENV: &str = "LINEAR_LOG_FILE";
/// Environment variable holding the minimum log level.
pub const LOG_LEVEL_ENV: &str = "LINEAR_LOG_LEVEL";

const APP_DIR: &str = ".linear-tui";

/// The agent CLIs with a built-in provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Cursor agent CLI.
    Cursor,
    /// Claude Code CLI.
    Claude,
}

impl ProviderKind {
    /// Every kind, in the order providers are offered to the user.
    pub const ALL: [Self; 2] = [Self::Cursor, Self::Claude];

    /// Returns the settings key for this kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::Claude => "claude",
        }
    }

    /// Returns the binary names to try, primary name first.
    #[must_use]
    pub const fn binary_names(self) -> &'static [&'static str] {
        match self {
            Self::Cursor => &["cursor-agent", "agent"],
            Self::Claude => &["claude"],
        }
    }

    /// Returns a human-readable name for this CLI.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Cursor => "Cursor",
            Self::Claude => "Claude",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self> {
        let normalized = key.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == normalized)
            .ok_or_else(|| Error::UnknownProvider {
                key: key.to_string(),
            })
    }
}

/// Optional overrides for one agent run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentRunOptions {
    /// Working directory for the agent process, also passed as its workspace flag.
    pub workspace: Option<PathBuf>,
    /// Provider-specific model selector.
    pub model: Option<String>,
    /// Sandbox policy for providers that support one.
    pub sandbox: Option<String>,
}

impl AgentRunOptions {
    /// Creates options with every override unset.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            workspace: None,
            model: None,
            sandbox: None,
        }
    }

    /// Sets the workspace directory. An empty path leaves it unset.
    #[must_use]
    pub fn with_workspace(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.workspace = (!dir.as_os_str().is_empty()).then_some(dir);
        self
    }

    /// Sets the model. A blank model leaves it unset.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = non_blank(model.into());
        self
    }

    /// Sets the sandbox policy. A blank policy leaves it unset.
    #[must_use]
    pub fn with_sandbox(mut self, sandbox: impl Into<String>) -> Self {
        self.sandbox = non_blank(sandbox.into());
        self
    }

    /// Returns the workspace as a CLI flag value.
    #[must_use]
    pub fn workspace_arg(&self) -> Option<String> {
        self.workspace
            .as_deref()
            .map(|dir| dir.to_string_lossy().into_owned())
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A named command template, e.g. `claude --model opus {prompt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCommand {
    /// Label shown in the command picker.
    pub name: String,
    /// Whitespace-separated template with `{prompt}` and `{branch}` placeholders.
    pub command: String,
}

impl AgentCommand {
    /// Creates a named command template.
    #[must_use]
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }
}

/// Returns the command templates offered when none are configured.
#[must_use]
pub fn default_agent_commands() -> Vec<AgentCommand> {
    vec![
        AgentCommand::new("Cursor", "cursor-agent --sandbox enabled {prompt}"),
        AgentCommand::new("Claude", "claude {prompt}"),
    ]
}

/// On-disk shape: every field optional, legacy single-provider fields included.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    agent_commands: Option<Vec<AgentCommand>>,
    agent_workspace: Option<String>,
    agent_provider: Option<String>,
    agent_model: Option<String>,
    agent_sandbox: Option<String>,
}

/// Agent-related user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Command templates, in picker order.
    pub agent_commands: Vec<AgentCommand>,
    /// Default workspace for agent runs, empty for the current directory.
    pub agent_workspace: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            agent_commands: default_agent_commands(),
            agent_workspace: String::new(),
        }
    }
}

impl AgentSettings {
    /// Returns the default settings path, `~/.linear-tui/settings.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR).join("settings.json"))
    }

    /// Loads settings from `path`, falling back to defaults when the file is missing.
    ///
    /// Files written before command templates existed carry `agent_provider`,
    /// `agent_model` and `agent_sandbox`; those are migrated into a single template.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(Error::SettingsRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let file: SettingsFile =
            serde_json::from_str(&data).map_err(|source| Error::SettingsParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: SettingsFile) -> Self {
        let agent_commands = file.agent_commands.unwrap_or_else(|| {
            let has_legacy = file.agent_provider.is_some()
                || file.agent_model.is_some()
                || file.agent_sandbox.is_some();
            if has_legacy {
                migrate_agent_commands(
                    file.agent_provider.as_deref().unwrap_or_default(),
                    file.agent_model.as_deref().unwrap_or_default(),
                    file.agent_sandbox.as_deref().unwrap_or_default(),
                )
            } else {
                default_agent_commands()
            }
        });
        Self {
            agent_commands,
            agent_workspace: file.agent_workspace.unwrap_or_default(),
        }
    }

    /// Writes settings as pretty JSON, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |source| Error::SettingsWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        let mut data = serde_json::to_string_pretty(self)
            .map_err(|err| write_err(std::io::Error::other(err)))?;
        data.push('\n');
        std::fs::write(path, data).map_err(write_err)
    }

    /// Finds a command template by name, ignoring case.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&AgentCommand> {
        let name = name.trim();
        self.agent_commands
            .iter()
            .find(|command| command.name.eq_ignore_ascii_case(name))
    }

    /// Builds run options from the configured workspace.
    #[must_use]
    pub fn run_options(&self) -> AgentRunOptions {
        AgentRunOptions::new().with_workspace(self.agent_workspace.trim())
    }
}

/// Builds command templates from the legacy provider/model/sandbox fields.
#[must_use]
pub fn migrate_agent_commands(provider: &str, model: &str, sandbox: &str) -> Vec<AgentCommand> {
    let model = model.trim();
    let sandbox = sandbox.trim().to_lowercase();
    match provider.parse::<ProviderKind>() {
        Ok(ProviderKind::Claude) => {
            let mut parts = vec!["claude"];
            if !model.is_empty() {
                parts.extend(["--model", model]);
            }
            if sandbox == "dangerously-skip-permissions" {
                parts.push("--dangerously-skip-permissions");
            }
            parts.push("{prompt}");
            vec![AgentCommand::new("Claude (migrated)", parts.join(" "))]
        }
        Ok(ProviderKind::Cursor) => {
            let mut parts = vec!["cursor-agent"];
            if !sandbox.is_empty() {
                parts.extend(["--sandbox", sandbox.as_str()]);
            }
            if !model.is_empty() {
                parts.extend(["--model", model]);
            }
            parts.push("{prompt}");
            vec![AgentCommand::new("Cursor (migrated)", parts.join(" "))]
        }
        Err(_) => default_agent_commands(),
    }
}

/// Minimum severity written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything, including per-run diagnostics.
    Debug,
    /// Informational messages and above.
    Info,
    /// Warnings and errors.
    #[default]
    Warning,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Returns the matching `tracing` level.
    #[must_use]
    pub const fn as_tracing(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(Error::InvalidSetting {
                name: LOG_LEVEL_ENV.to_string(),
                value: value.to_string(),
                reason: "must be debug, info, warning, or error".to_string(),
            }),
        }
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Log file path, `None` when logging is disabled.
    pub file: Option<PathBuf>,
    /// Minimum level written.
    pub level: LogLevel,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: dirs::home_dir().map(|home| home.join(APP_DIR).join("app.log")),
            level: LogLevel::default(),
        }
    }
}

impl LogSettings {
    /// Reads `LINEAR_LOG_FILE` and `LINEAR_LOG_LEVEL` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the level is not one of the accepted names.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`LogSettings::from_env`], with an injectable variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the level is not one of the accepted names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(file) = lookup(LOG_FILE_ENV) {
            settings.file = (!file.is_empty()).then(|| PathBuf::from(file));
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|level| !level.is_empty()) {
            settings.level = level.parse()?;
        }
        Ok(settings)
    }
}
