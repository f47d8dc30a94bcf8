//! Error types for the linear-agent-runner library.

use crate::stream::StreamSource;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// The result type for linear-agent-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when resolving, spawning or reading agent CLIs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The command template contained no tokens.
    #[error("empty command template")]
    EmptyTemplate,
    /// The template's binary could not be resolved on the search path.
    #[error("binary {binary:?} not found: {source}")]
    BinaryNotFound {
        /// The binary token taken from the template.
        binary: String,
        /// The underlying lookup error.
        #[source]
        source: which::Error,
    },
    /// No binary could be resolved for the provider at run start.
    #[error("agent binary not found for {provider}")]
    ProviderUnavailable {
        /// The provider display name.
        provider: String,
    },
    /// The provider key does not name a known provider.
    #[error("invalid agent provider {key:?}")]
    UnknownProvider {
        /// The key as supplied by the caller.
        key: String,
    },
    /// Failed to spawn the agent process.
    #[error("start agent {provider}: {source}")]
    ProcessStartFailed {
        /// The provider display name.
        provider: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Waiting on the agent process failed.
    #[error("wait for agent {provider}: {source}")]
    ProcessWaitFailed {
        /// The provider display name.
        provider: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The agent process exited with a non-zero status.
    #[error("agent {provider} exited: {status}")]
    ProcessExited {
        /// The provider display name.
        provider: String,
        /// The exit status reported by the OS.
        status: ExitStatus,
    },
    /// The run was cancelled and the agent process was terminated.
    #[error("agent {provider} run cancelled")]
    Cancelled {
        /// The provider display name.
        provider: String,
    },
    /// Reading one of the agent's output streams failed.
    #[error("read {stream} stream: {source}")]
    StreamRead {
        /// The stream that failed.
        stream: StreamSource,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A session already has an active run.
    #[error("an agent run is already in progress")]
    RunInProgress,
    /// The settings file could not be read.
    #[error("read settings file {}: {source}", path.display())]
    SettingsRead {
        /// The settings file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The settings file could not be written.
    #[error("write settings file {}: {source}", path.display())]
    SettingsWrite {
        /// The settings file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The settings file is not valid JSON for the settings schema.
    #[error("parse settings file {}: {source}", path.display())]
    SettingsParse {
        /// The settings file path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A configuration value failed validation.
    #[error("invalid {name} value {value:?}: {reason}")]
    InvalidSetting {
        /// The setting or environment variable name.
        name: String,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}
