//! Server-sent events encoding
//!
//! Each frame becomes one SSE record:
//!
//! ```text
//! event: message
//! id: 0
//! data: {"type":"message","role":"agent","parts":[...]}
//!
//! ```
//!
//! Lifecycle frames carry no `id`. JSON payloads contain no raw newlines, so
//! every record has exactly one `data:` line.

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::core::AcpResult;

use super::frame::{FrameStream, StreamFrame};

/// MIME type of an SSE response body
pub const SSE_CONTENT_TYPE: &str = "text/event-stream";

/// Encode one frame as an SSE record
pub fn encode_frame(frame: &StreamFrame) -> AcpResult<String> {
    let data = frame.data()?;
    let mut record = format!("event: {}\n", frame.tag());
    if let Some(seq) = frame.seq() {
        record.push_str(&format!("id: {}\n", seq));
    }
    record.push_str("data: ");
    record.push_str(&data);
    record.push_str("\n\n");
    Ok(record)
}

/// Encode a frame stream as SSE records
///
/// A frame that fails to serialize is logged and skipped; the stream
/// itself continues.
pub fn sse_stream(frames: FrameStream) -> BoxStream<'static, String> {
    frames
        .filter_map(|frame| async move {
            match encode_frame(&frame) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::error!(tag = frame.tag(), error = %e, "Failed to encode stream frame");
                    None
                }
            }
        })
        .boxed()
}

/// A decoded SSE record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseRecord {
    pub event: String,
    pub id: Option<String>,
    pub data: String,
}

/// Parse SSE text into records
///
/// Handles the subset this module produces: `event`, `id` and `data`
/// fields, records separated by a blank line.
pub fn parse_sse(text: &str) -> Vec<SseRecord> {
    let mut records = Vec::new();
    let mut event = None;
    let mut id = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            if !data.is_empty() || event.is_some() {
                records.push(SseRecord {
                    event: event.take().unwrap_or_else(|| "message".to_string()),
                    id: id.take(),
                    data: data.join("\n"),
                });
                data.clear();
            }
            continue;
        }

        if let Some(value) = line.strip_prefix("event: ") {
            event = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("id: ") {
            id = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("data: ") {
            data.push(value);
        }
    }

    records
}
