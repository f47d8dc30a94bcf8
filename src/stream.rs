//! Line-by-line reading and dispatch of agent CLI output.

use crate::error::Error;
use crate::process::RunCallbacks;
use crate::providers::Provider;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::sync::CancellationToken;

/// Longest line accepted from an agent stream, in bytes.
pub const MAX_STREAM_LINE_BYTES: usize = 1024 * 1024;

/// Which of the child's output streams a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSource {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl StreamSource {
    /// Returns the prefix put in front of raw lines from this stream.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Stdout => "",
            Self::Stderr => "stderr: ",
        }
    }
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Reads `reader` until EOF or cancellation, dispatching every line.
///
/// Cancellation stops the reader even when a descendant of the killed child
/// still holds the pipe open. Read errors end the stream. They are reported
/// through `on_err` unless the run was cancelled or the pipe was simply
/// closed under us.
pub(crate) async fn stream_lines<R>(
    reader: R,
    source: StreamSource,
    provider: &dyn Provider,
    callbacks: &RunCallbacks,
    cancel: &CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let codec =
        AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_STREAM_LINE_BYTES);
    let mut lines = FramedRead::new(reader, codec);
    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(stream = %source, "stream reader cancelled");
                return;
            }
            frame = lines.next() => frame,
        };
        let Some(frame) = frame else {
            return;
        };
        match frame {
            Ok(raw) => dispatch_line(&raw, source, provider, callbacks),
            Err(err) => {
                let err = match err {
                    tokio_util::codec::AnyDelimiterCodecError::Io(err) => err,
                    other => io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line exceeds {MAX_STREAM_LINE_BYTES} bytes: {other}"),
                    ),
                };
                if is_benign(&err, cancel) {
                    tracing::debug!(stream = %source, error = %err, "stream closed");
                } else {
                    tracing::error!(stream = %source, error = %err, "stream read error");
                    callbacks.emit_error(Error::StreamRead { stream: source, source: err });
                }
                return;
            }
        }
    }
}

/// Routes one raw line to `on_event` or, failing that, to `on_line`.
pub(crate) fn dispatch_line(
    raw: &[u8],
    source: StreamSource,
    provider: &dyn Provider,
    callbacks: &RunCallbacks,
) {
    if let Some(event) = provider
        .event_parser()
        .and_then(|parser| parser.parse_event(raw))
    {
        callbacks.emit_event(event);
        return;
    }
    let display = provider
        .parse_stream_line(raw)
        .unwrap_or_else(|| String::from_utf8_lossy(raw).into_owned());
    let display = display.trim_end_matches(['\r', '\n']);
    if display.is_empty() {
        return;
    }
    callbacks.emit_line(format!("{}{display}", source.prefix()));
}

/// A closed pipe after the child went away, or any error once cancelled, is expected.
fn is_benign(err: &io::Error, cancel: &CancellationToken) -> bool {
    cancel.is_cancelled()
        || matches!(
            err.kind(),
            io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof
        )
}
