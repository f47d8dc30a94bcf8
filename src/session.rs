//! Agent session management.

use crate::buffer::{StreamBuffer, StreamLine};
use crate::config::AgentRunOptions;
use crate::error::{Error, Result};
use crate::events::AgentEvent;
use crate::process::{RunCallbacks, Runner};
use crate::providers::Provider;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A change the UI should render, produced by a session's active run.
#[derive(Debug)]
pub enum SessionUpdate {
    /// The agent announced its session.
    Session {
        /// The agent's session identifier.
        session_id: String,
        /// The model serving the session.
        model: String,
        /// A shell command that resumes the session.
        resume_command: Option<String>,
    },
    /// Display lines that became ready.
    Lines(Vec<StreamLine>),
    /// A raw output line with no structured meaning.
    Output(String),
    /// A stream failed mid-run; the other stream keeps going.
    StreamError(Error),
    /// The agent sent its terminal event.
    Done {
        /// The accumulated assistant answer.
        final_text: String,
    },
    /// The process exited. Always the last update of a run.
    Finished(Result<()>),
}

enum RunMessage {
    Event(AgentEvent),
    Line(String),
    Error(Error),
    Exited(Result<()>),
}

struct ActiveRun {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// A session with at most one agent run in flight.
///
/// Callbacks from both output streams are funneled into one channel, so a
/// single task owns the [`StreamBuffer`] and updates arrive in one ordered
/// sequence.
///
/// Dropping the session cancels its active run. Updates already requested
/// through [`AgentSession::start`] still end with [`SessionUpdate::Finished`].
#[derive(Default)]
pub struct AgentSession {
    runner: Runner,
    active: Option<ActiveRun>,
}

impl AgentSession {
    /// Creates a session that runs agents through `runner`.
    #[must_use]
    pub fn new(runner: Runner) -> Self {
        Self {
            runner,
            active: None,
        }
    }

    /// Starts a run and returns the stream of updates for it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunInProgress`] if the previous run has not finished.
    pub fn start(
        &mut self,
        provider: Arc<dyn Provider>,
        prompt: impl Into<String>,
        issue_context: impl Into<String>,
        options: AgentRunOptions,
    ) -> Result<UnboundedReceiver<SessionUpdate>> {
        if self.is_running() {
            return Err(Error::RunInProgress);
        }

        let (messages_tx, messages_rx) = unbounded_channel();
        let (updates_tx, updates_rx) = unbounded_channel();
        let cancel = CancellationToken::new();

        let runner = self.runner.clone();
        let prompt = prompt.into();
        let issue_context = issue_context.into();
        let run_cancel = cancel.clone();
        let callbacks = funnel(&messages_tx);
        tokio::spawn(async move {
            let result = runner
                .run(&run_cancel, provider, &prompt, &issue_context, &options, callbacks)
                .await;
            let _ = messages_tx.send(RunMessage::Exited(result));
        });

        let task = tokio::spawn(pump(messages_rx, updates_tx));
        self.active = Some(ActiveRun { cancel, task });
        Ok(updates_rx)
    }

    /// Whether a run is still streaming.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }

    /// Cancels the active run, if any. Its last update is still delivered.
    pub fn cancel(&self) {
        if let Some(ref active) = self.active {
            active.cancel.cancel();
        }
    }
}

impl Drop for AgentSession {
    fn drop(&mut self) {
        if let Some(ref active) = self.active {
            if !active.task.is_finished() {
                tracing::debug!("session dropped, cancelling active run");
            }
            active.cancel.cancel();
        }
    }
}

fn funnel(tx: &UnboundedSender<RunMessage>) -> RunCallbacks {
    let events = tx.clone();
    let lines = tx.clone();
    let errors = tx.clone();
    RunCallbacks::new()
        .on_event(move |event| {
            let _ = events.send(RunMessage::Event(event));
        })
        .on_line(move |line| {
            let _ = lines.send(RunMessage::Line(line));
        })
        .on_err(move |err| {
            let _ = errors.send(RunMessage::Error(err));
        })
}

/// Owns the run's buffer and turns raw messages into updates.
async fn pump(
    mut messages: UnboundedReceiver<RunMessage>,
    updates: UnboundedSender<SessionUpdate>,
) {
    let mut buffer = StreamBuffer::new();
    while let Some(message) = messages.recv().await {
        match message {
            RunMessage::Event(event) => {
                if let AgentEvent::System {
                    ref session_id,
                    ref model,
                    ref resume_command,
                    ..
                } = event
                {
                    let _ = updates.send(SessionUpdate::Session {
                        session_id: session_id.clone(),
                        model: model.clone(),
                        resume_command: resume_command.clone(),
                    });
                }
                let update = buffer.append(&event);
                if !update.lines.is_empty() {
                    let _ = updates.send(SessionUpdate::Lines(update.lines));
                }
                if update.done {
                    let _ = updates.send(SessionUpdate::Done {
                        final_text: update.final_text,
                    });
                }
            }
            RunMessage::Line(line) => {
                let _ = updates.send(SessionUpdate::Output(line));
            }
            RunMessage::Error(err) => {
                let _ = updates.send(SessionUpdate::StreamError(err));
            }
            RunMessage::Exited(result) => {
                if let Some(line) = buffer.flush() {
                    let _ = updates.send(SessionUpdate::Lines(vec![line]));
                }
                let _ = updates.send(SessionUpdate::Finished(result));
                break;
            }
        }
    }
}
