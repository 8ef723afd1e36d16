// ABOUTME: Line-framed JSON progress stream reader for pull and build.
// ABOUTME: Splits the body on newlines and decodes each line into progress records.

use crate::error::{Error, ErrorContext, Operation, Result};
use crate::transport::{ResponseBody, TransportError};
use crate::wire::{self, ProgressRecord};
use bytes::{Bytes, BytesMut};
use futures::Stream;
use futures::stream::FusedStream;
use http_body_util::{BodyDataStream, BodyExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

/// Splits a byte stream into lines. Blank lines are dropped.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: BytesMut,
    /// Bytes of `buf` already known to hold no newline.
    scanned: usize,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// The next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<Bytes> {
        loop {
            let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') else {
                self.scanned = self.buf.len();
                return None;
            };
            let newline = self.scanned + offset;
            self.scanned = 0;

            let mut line = self.buf.split_to(newline + 1);
            line.truncate(newline);
            if line.last() == Some(&b'\r') {
                line.truncate(newline - 1);
            }
            if !is_blank(&line) {
                return Some(line.freeze());
            }
        }
    }

    /// Whatever is left after the final newline.
    pub fn finish(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        let rest = self.buf.split().freeze();
        (!is_blank(&rest)).then_some(rest)
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Lazily decoded pull or build progress.
///
/// A line that is valid JSON but not a progress record yields an error item
/// and decoding continues. Invalid JSON, a transport failure, or a record
/// carrying a daemon error yields one final error item and ends the stream.
/// Dropping the stream closes the underlying connection.
pub struct ProgressStream {
    body: BodyDataStream<ResponseBody>,
    lines: LineDecoder,
    pending: VecDeque<Result<ProgressRecord>>,
    context: ErrorContext,
    body_done: bool,
    failed: bool,
}

impl ProgressStream {
    pub(crate) fn new(body: ResponseBody, context: ErrorContext) -> Self {
        Self {
            body: body.into_data_stream(),
            lines: LineDecoder::new(),
            pending: VecDeque::new(),
            context,
            body_done: false,
            failed: false,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Whether the stream ended on an error it cannot continue past.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    fn decode_line(&mut self, line: &[u8]) {
        // Old daemons occasionally write several objects on one line.
        let values = serde_json::Deserializer::from_slice(line).into_iter::<Value>();

        for value in values {
            let value = match value {
                Ok(value) => value,
                Err(e) => {
                    let text = String::from_utf8_lossy(line);
                    self.fail(Error::stream(
                        self.context.clone(),
                        format!("invalid JSON line {text:?}: {e}"),
                    ));
                    return;
                }
            };

            match wire::decode_value::<ProgressRecord>(&value) {
                Ok(record) => {
                    if let Some(message) = record.error_message() {
                        let err = self.in_stream_error(message);
                        self.fail(err);
                        return;
                    }
                    tracing::trace!(line = %record.display_line(), "progress");
                    self.pending.push_back(Ok(record));
                }
                Err(e) => {
                    tracing::warn!(%e, "skipping malformed progress record");
                    self.pending.push_back(Err(Error::stream(
                        self.context.clone(),
                        format!("malformed progress record: {e}"),
                    )));
                }
            }
        }
    }

    /// Build failures belong to the build; a pull of a missing repository is
    /// NotFound; anything else is the daemon's.
    fn in_stream_error(&self, message: &str) -> Error {
        match self.context.operation {
            Operation::BuildImage => Error::Build {
                context: self.context.clone(),
                message: message.to_string(),
            },
            Operation::PullImage if names_missing_image(message) => Error::NotFound {
                context: self.context.clone(),
                message: message.to_string(),
            },
            _ => Error::Server {
                context: self.context.clone(),
                status: 500,
                message: message.to_string(),
            },
        }
    }

    fn fail(&mut self, err: Error) {
        self.failed = true;
        self.pending.push_back(Err(err));
    }
}

fn names_missing_image(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["not found", "does not exist", "manifest unknown"]
        .iter()
        .any(|needle| message.contains(needle))
}

impl Stream for ProgressStream {
    type Item = Result<ProgressRecord>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }
            if this.failed || this.body_done {
                return Poll::Ready(None);
            }

            match ready!(Pin::new(&mut this.body).poll_next(cx)) {
                Some(Ok(data)) => {
                    this.lines.push(&data);
                    while !this.failed {
                        let Some(line) = this.lines.next_line() else {
                            break;
                        };
                        this.decode_line(&line);
                    }
                }
                Some(Err(source)) => this.fail(Error::Transport {
                    context: this.context.clone(),
                    source: TransportError::Body(source),
                }),
                None => {
                    this.body_done = true;
                    if let Some(rest) = this.lines.finish() {
                        this.decode_line(&rest);
                    }
                }
            }
        }
    }
}

impl FusedStream for ProgressStream {
    fn is_terminated(&self) -> bool {
        (self.failed || self.body_done) && self.pending.is_empty()
    }
}

impl std::fmt::Debug for ProgressStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStream")
            .field("context", &self.context)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
