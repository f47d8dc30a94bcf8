//! Process spawning and management for agent CLIs.

use crate::config::AgentRunOptions;
use crate::error::{Error, Result};
use crate::events::AgentEvent;
use crate::providers::Provider;
use crate::stream::{stream_lines, StreamSource};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Receives decoded events.
pub type EventCallback = Arc<dyn Fn(AgentEvent) + Send + Sync>;
/// Receives display lines that had no structured meaning.
pub type LineCallback = Arc<dyn Fn(String) + Send + Sync>;
/// Receives mid-run stream errors.
pub type ErrorCallback = Arc<dyn Fn(Error) + Send + Sync>;
/// Builds the command for a resolved binary and argv.
pub type CommandFactory = Arc<dyn Fn(&Path, &[String]) -> Command + Send + Sync>;

/// Callbacks invoked while a run streams output. Unset callbacks are no-ops.
///
/// Callbacks run on the reader task that produced the line, so stdout and
/// stderr deliveries may interleave in any order.
#[derive(Clone, Default)]
pub struct RunCallbacks {
    on_event: Option<EventCallback>,
    on_line: Option<LineCallback>,
    on_err: Option<ErrorCallback>,
}

impl RunCallbacks {
    /// Creates a set of no-op callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the structured event callback.
    #[must_use]
    pub fn on_event(mut self, f: impl Fn(AgentEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(f));
        self
    }

    /// Sets the raw line callback.
    #[must_use]
    pub fn on_line(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_line = Some(Arc::new(f));
        self
    }

    /// Sets the stream error callback.
    #[must_use]
    pub fn on_err(mut self, f: impl Fn(Error) + Send + Sync + 'static) -> Self {
        self.on_err = Some(Arc::new(f));
        self
    }

    pub(crate) fn emit_event(&self, event: AgentEvent) {
        if let Some(ref f) = self.on_event {
            f(event);
        }
    }

    pub(crate) fn emit_line(&self, line: String) {
        if let Some(ref f) = self.on_line {
            f(line);
        }
    }

    pub(crate) fn emit_error(&self, err: Error) {
        if let Some(ref f) = self.on_err {
            f(err);
        }
    }
}

/// Runs provider CLIs and streams their output to callbacks.
#[derive(Clone, Default)]
pub struct Runner {
    command_factory: Option<CommandFactory>,
}

impl Runner {
    /// Creates a runner that spawns the provider's binary directly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces how the child command is built from the resolved binary and argv.
    #[must_use]
    pub fn with_command_factory(
        mut self,
        factory: impl Fn(&Path, &[String]) -> Command + Send + Sync + 'static,
    ) -> Self {
        self.command_factory = Some(Arc::new(factory));
        self
    }

    /// Runs `provider` to completion, streaming its output through `callbacks`.
    ///
    /// Both output streams are drained before the process is waited on.
    /// Cancelling `cancel` kills the child and stops both readers, so output
    /// still buffered in the pipes is discarded.
    ///
    /// A cancelled child that nonetheless exits with status 0 yields `Ok(())`;
    /// `Error::Cancelled` is only returned when the exit status is a failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be resolved, the process fails to
    /// start, the run is cancelled, or the process exits with a non-zero status.
    /// Mid-run read errors go to the error callback instead.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        provider: Arc<dyn Provider>,
        prompt: &str,
        issue_context: &str,
        options: &AgentRunOptions,
        callbacks: RunCallbacks,
    ) -> Result<()> {
        let name = provider.name().to_string();
        let binary = provider
            .resolve_binary()
            .ok_or_else(|| Error::ProviderUnavailable {
                provider: name.clone(),
            })?;
        tracing::debug!(provider = %name, workspace = ?options.workspace, "starting agent run");

        let args = provider.build_args(prompt, issue_context, options);
        let mut cmd = self.build_command(&binary, &args);
        if let Some(ref dir) = options.workspace {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let mut child = cmd.spawn().map_err(|source| Error::ProcessStartFailed {
            provider: name.clone(),
            source,
        })?;

        let readers = [
            spawn_reader(child.stdout.take(), StreamSource::Stdout, &provider, &callbacks, cancel),
            spawn_reader(child.stderr.take(), StreamSource::Stderr, &provider, &callbacks, cancel),
        ];
        let drained = futures::future::join_all(readers);
        tokio::pin!(drained);

        let mut cancelled = false;
        tokio::select! {
            results = &mut drained => log_reader_results(results),
            () = cancel.cancelled() => {
                cancelled = true;
                kill(&mut child, &name);
                log_reader_results(drained.await);
            }
        }

        let waited = if cancelled {
            child.wait().await
        } else {
            tokio::select! {
                status = child.wait() => status,
                () = cancel.cancelled() => {
                    cancelled = true;
                    kill(&mut child, &name);
                    child.wait().await
                }
            }
        };
        let status = waited.map_err(|source| Error::ProcessWaitFailed {
            provider: name.clone(),
            source,
        })?;

        if cancelled && !status.success() {
            tracing::debug!(provider = %name, %status, "agent run cancelled");
            return Err(Error::Cancelled { provider: name });
        }
        if !status.success() {
            tracing::error!(provider = %name, %status, "agent exited with error");
            return Err(Error::ProcessExited {
                provider: name,
                status,
            });
        }
        tracing::debug!(provider = %name, "agent run completed");
        Ok(())
    }

    fn build_command(&self, binary: &Path, args: &[String]) -> Command {
        if let Some(ref factory) = self.command_factory {
            return factory(binary, args);
        }
        let mut cmd = Command::new(binary);
        cmd.args(args);
        cmd
    }
}

fn spawn_reader<R>(
    reader: Option<R>,
    source: StreamSource,
    provider: &Arc<dyn Provider>,
    callbacks: &RunCallbacks,
    cancel: &CancellationToken,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let provider = Arc::clone(provider);
    let callbacks = callbacks.clone();
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if let Some(reader) = reader {
            stream_lines(reader, source, provider.as_ref(), &callbacks, &cancel).await;
        }
    })
}

fn kill(child: &mut Child, provider: &str) {
    tracing::debug!(provider, "cancellation requested, terminating agent");
    if let Err(err) = child.start_kill() {
        tracing::warn!(provider, error = %err, "failed to kill agent process");
    }
}

fn log_reader_results(results: Vec<std::result::Result<(), tokio::task::JoinError>>) {
    for result in results {
        if let Err(err) = result {
            tracing::error!(error = %err, "stream reader task failed");
        }
    }
}
