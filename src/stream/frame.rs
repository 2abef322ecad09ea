//! Stream frames
//!
//! A run stream is a sequence of [`StreamFrame`]s: one lifecycle frame
//! announcing the run, one frame per output event in emission order, and one
//! closing lifecycle frame carrying the final snapshot.

use futures::stream::BoxStream;
use serde::Serialize;

use crate::core::{Event, RunSnapshot, RunStatus};
use crate::runtime::EventReader;

/// Boxed stream of frames
pub type FrameStream = BoxStream<'static, StreamFrame>;

/// Run lifecycle notifications carried in streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    InProgress,
    Awaiting,
    Completed,
    Failed,
    Cancelled,
}

impl Lifecycle {
    /// Wire tag of this notification
    pub fn tag(&self) -> &'static str {
        match self {
            Lifecycle::Created => "run.created",
            Lifecycle::InProgress => "run.in-progress",
            Lifecycle::Awaiting => "run.awaiting",
            Lifecycle::Completed => "run.completed",
            Lifecycle::Failed => "run.failed",
            Lifecycle::Cancelled => "run.cancelled",
        }
    }

    /// Notification that closes a stream ending in `status`
    pub fn closing(status: RunStatus) -> Option<Self> {
        match status {
            RunStatus::Awaiting => Some(Lifecycle::Awaiting),
            RunStatus::Completed => Some(Lifecycle::Completed),
            RunStatus::Failed => Some(Lifecycle::Failed),
            RunStatus::Cancelled => Some(Lifecycle::Cancelled),
            RunStatus::Created | RunStatus::InProgress | RunStatus::Cancelling => None,
        }
    }
}

/// One transmitted unit of a run stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// An output event and its index in the run output
    Event { seq: usize, event: Event },
    /// A lifecycle notification with the run snapshot at that point
    Run { lifecycle: Lifecycle, run: RunSnapshot },
}

#[derive(Serialize)]
struct RunFrameData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    run: &'a RunSnapshot,
}

impl StreamFrame {
    /// Discriminant tag of this frame
    pub fn tag(&self) -> &'static str {
        match self {
            StreamFrame::Event { event, .. } => event.kind(),
            StreamFrame::Run { lifecycle, .. } => lifecycle.tag(),
        }
    }

    /// Sequence number for event frames
    pub fn seq(&self) -> Option<usize> {
        match self {
            StreamFrame::Event { seq, .. } => Some(*seq),
            StreamFrame::Run { .. } => None,
        }
    }

    /// JSON payload of this frame
    pub fn data(&self) -> serde_json::Result<String> {
        match self {
            StreamFrame::Event { event, .. } => serde_json::to_string(event),
            StreamFrame::Run { lifecycle, run } => serde_json::to_string(&RunFrameData {
                kind: lifecycle.tag(),
                run,
            }),
        }
    }

    pub fn event(&self) -> Option<&Event> {
        match self {
            StreamFrame::Event { event, .. } => Some(event),
            StreamFrame::Run { .. } => None,
        }
    }

    pub fn run(&self) -> Option<&RunSnapshot> {
        match self {
            StreamFrame::Run { run, .. } => Some(run),
            StreamFrame::Event { .. } => None,
        }
    }
}

/// Frame stream for a run
///
/// Yields the `opening` notification with `snapshot`, then every event the
/// reader produces, then a closing notification: `run.awaiting` if the reader
/// stopped at an await event, otherwise the run's terminal status. The
/// closing frame carries the run as it is when the stream ends, which may
/// already be past a resume issued by another client.
pub fn run_stream(opening: Lifecycle, snapshot: RunSnapshot, mut reader: EventReader) -> FrameStream {
    Box::pin(async_stream::stream! {
        yield StreamFrame::Run { lifecycle: opening, run: snapshot };

        while let Some((seq, event)) = reader.next().await {
            yield StreamFrame::Event { seq, event };
        }

        let run = reader.snapshot();
        let closing = if reader.stopped_at_await() {
            Some(Lifecycle::Awaiting)
        } else {
            Lifecycle::closing(run.status)
        };
        if let Some(lifecycle) = closing {
            yield StreamFrame::Run { lifecycle, run };
        } else {
            tracing::warn!(run_id = %run.run_id, status = %run.status, "Stream ended without a final status");
        }
    })
}
