// ABOUTME: Multiplexed stdout/stderr stream reader for logs and attach.
// ABOUTME: Decodes 8-byte framed chunks incrementally as the response body arrives.

use crate::error::{Error, ErrorContext, Result};
use crate::transport::{ResponseBody, TransportError};
use bytes::{Buf, Bytes, BytesMut};
use futures::stream::FusedStream;
use futures::{Stream, StreamExt};
use http_body_util::{BodyDataStream, BodyExt};
use std::borrow::Cow;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

/// Selector byte, 3 padding bytes, big-endian u32 payload length.
pub const HEADER_LEN: usize = 8;

/// Which container stream a chunk was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamOrigin {
    Stdin,
    Stdout,
    Stderr,
}

impl StreamOrigin {
    fn from_selector(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(StreamOrigin::Stdin),
            1 => Some(StreamOrigin::Stdout),
            2 => Some(StreamOrigin::Stderr),
            _ => None,
        }
    }
}

/// One demultiplexed payload, tagged by origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChunk {
    pub origin: StreamOrigin,
    pub data: Bytes,
}

impl LogChunk {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("stream ended inside a frame header ({received} of 8 bytes)")]
    TruncatedHeader { received: usize },

    #[error("stream ended inside a frame payload ({received} of {declared} bytes)")]
    TruncatedPayload { declared: usize, received: usize },

    #[error("unknown stream selector {0}")]
    UnknownStream(u8),
}

/// Incremental frame decoder. Push bytes as they arrive, pull whole chunks.
#[derive(Debug, Default)]
pub struct MuxDecoder {
    buf: BytesMut,
}

impl MuxDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// The next complete chunk, or `None` until more bytes arrive.
    pub fn next_chunk(&mut self) -> std::result::Result<Option<LogChunk>, FrameError> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let selector = self.buf[0];
        let origin =
            StreamOrigin::from_selector(selector).ok_or(FrameError::UnknownStream(selector))?;
        let declared = declared_len(&self.buf);

        if self.buf.len() < HEADER_LEN + declared {
            return Ok(None);
        }

        self.buf.advance(HEADER_LEN);
        let data = self.buf.split_to(declared).freeze();
        Ok(Some(LogChunk { origin, data }))
    }

    /// Check that the stream ended on a frame boundary.
    pub fn finish(&self) -> std::result::Result<(), FrameError> {
        match self.buf.len() {
            0 => Ok(()),
            received if received < HEADER_LEN => Err(FrameError::TruncatedHeader { received }),
            buffered => Err(FrameError::TruncatedPayload {
                declared: declared_len(&self.buf),
                received: buffered - HEADER_LEN,
            }),
        }
    }
}

fn declared_len(header: &[u8]) -> usize {
    u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize
}

/// Lazily demultiplexed log or attach output.
///
/// Chunks are yielded in arrival order. A framing or transport failure is
/// yielded once, after every chunk decoded before it, and ends the stream.
/// Dropping the stream closes the underlying connection.
pub struct LogStream {
    body: BodyDataStream<ResponseBody>,
    decoder: MuxDecoder,
    context: ErrorContext,
    body_done: bool,
    finished: bool,
}

impl LogStream {
    pub(crate) fn new(body: ResponseBody, context: ErrorContext) -> Self {
        Self {
            body: body.into_data_stream(),
            decoder: MuxDecoder::new(),
            context,
            body_done: false,
            finished: false,
        }
    }

    /// Read the stream to its end, splitting output by origin.
    ///
    /// Stdin echoes are folded into stdout.
    pub async fn demux(mut self) -> Result<Demuxed> {
        let mut out = Demuxed::default();
        while let Some(chunk) = self.next().await {
            let chunk = chunk?;
            match chunk.origin {
                StreamOrigin::Stdin | StreamOrigin::Stdout => {
                    out.stdout.extend_from_slice(&chunk.data)
                }
                StreamOrigin::Stderr => out.stderr.extend_from_slice(&chunk.data),
            }
        }
        Ok(out)
    }

    fn fail(&mut self, err: Error) -> Poll<Option<Result<LogChunk>>> {
        self.finished = true;
        Poll::Ready(Some(Err(err)))
    }
}

impl Stream for LogStream {
    type Item = Result<LogChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            match this.decoder.next_chunk() {
                Ok(Some(chunk)) if chunk.data.is_empty() => continue,
                Ok(Some(chunk)) => {
                    tracing::trace!(origin = ?chunk.origin, len = chunk.data.len(), "log frame");
                    return Poll::Ready(Some(Ok(chunk)));
                }
                Ok(None) => {}
                Err(e) => {
                    let err = Error::stream(this.context.clone(), e.to_string());
                    return this.fail(err);
                }
            }

            if this.body_done {
                this.finished = true;
                return match this.decoder.finish() {
                    Ok(()) => Poll::Ready(None),
                    Err(e) => Poll::Ready(Some(Err(Error::stream(
                        this.context.clone(),
                        e.to_string(),
                    )))),
                };
            }

            match ready!(Pin::new(&mut this.body).poll_next(cx)) {
                Some(Ok(data)) => this.decoder.push(&data),
                Some(Err(source)) => {
                    let err = Error::Transport {
                        context: this.context.clone(),
                        source: TransportError::Body(source),
                    };
                    return this.fail(err);
                }
                None => this.body_done = true,
            }
        }
    }
}

impl FusedStream for LogStream {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStream")
            .field("context", &self.context)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Log output split by origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demuxed {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Demuxed {
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}
