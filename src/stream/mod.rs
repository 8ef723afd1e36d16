// ABOUTME: Streaming response readers for bodies that are not single JSON documents.
// ABOUTME: Line-framed progress records and multiplexed stdout/stderr frames.

mod lines;
mod mux;

pub use lines::{LineDecoder, ProgressStream};
pub use mux::{Demuxed, FrameError, HEADER_LEN, LogChunk, LogStream, MuxDecoder, StreamOrigin};
