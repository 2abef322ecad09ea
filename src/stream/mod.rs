//! Streaming adapter
//!
//! Turns a run's event reader into an ordered frame stream and encodes it as
//! server-sent events. A stream closes right after an await event or once
//! its run is terminal.

pub mod frame;
pub mod sse;

pub use frame::{run_stream, FrameStream, Lifecycle, StreamFrame};
pub use sse::{encode_frame, parse_sse, sse_stream, SseRecord, SSE_CONTENT_TYPE};
