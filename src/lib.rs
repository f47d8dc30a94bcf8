//! # linear-agent-runner
//!
//! A Rust library for running AI coding-agent CLIs (Claude Code, Cursor) against
//! an issue, normalizing their stream-json output into a unified event stream.
//!
//! ## Features
//!
//! - Command templates with `{prompt}` and `{branch}` placeholders
//! - Unified event model for text, thinking, tool calls and results
//! - Tool start/result correlation per provider instance
//! - Concurrent stdout/stderr capture with cancellation
//! - A stream buffer that coalesces events into display lines
//!
//! ## Example
//!
//! ```no_run
//! use linear_agent_runner::{
//!     AgentRunOptions, AgentSession, ClaudeProvider, Runner, SessionUpdate,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> linear_agent_runner::Result<()> {
//! let mut session = AgentSession::new(Runner::new());
//! let mut updates = session.start(
//!     Arc::new(ClaudeProvider::new()),
//!     "Summarize this issue",
//!     "Title: Crash on startup",
//!     AgentRunOptions::new().with_workspace("/tmp/repo"),
//! )?;
//!
//! while let Some(update) = updates.recv().await {
//!     match update {
//!         SessionUpdate::Lines(lines) => {
//!             for line in lines {
//!                 println!("[{}] {}", line.kind, line.text);
//!             }
//!         }
//!         SessionUpdate::Done { final_text } => println!("{final_text}"),
//!         SessionUpdate::Finished(result) => return result,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]

mod buffer;
mod command;
mod config;
mod context;
mod error;
mod events;
mod process;
mod providers;
mod session;
mod stream;

pub use buffer::{BufferUpdate, StreamBuffer, StreamLine, StreamLineKind, THINKING_FLUSH_CHARS};
pub use command::{parse_command, parse_command_with, ResolvedCommand};
pub use config::{
    default_agent_commands, migrate_agent_commands, AgentCommand, AgentRunOptions, AgentSettings,
    LogLevel, LogSettings, ProviderKind, LOG_FILE_ENV, LOG_LEVEL_ENV,
};
pub use context::{build_issue_context, compose_prompt, CommentAuthor, Issue, IssueComment};
pub use error::{Error, Result};
pub use events::{AgentEvent, AgentEventType, AgentToolCall, ToolCallStatus};
pub use process::{
    CommandFactory, ErrorCallback, EventCallback, LineCallback, RunCallbacks, Runner,
};
pub use providers::claude::ClaudeProvider;
pub use providers::cursor::CursorProvider;
pub use providers::template::TemplateProvider;
pub use providers::{
    available_provider_keys, provider_for_key, provider_for_kind, system_look_path, EventParser,
    LookPath, Provider,
};
pub use session::{AgentSession, SessionUpdate};
pub use stream::{StreamSource, MAX_STREAM_LINE_BYTES};
