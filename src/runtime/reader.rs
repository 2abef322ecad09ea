//! EventReader - Ordered, live view of a run's output
//!
//! The run's accumulated output is an append-only log. Each reader keeps
//! its own cursor into it and wakes up whenever the run record changes, so
//! readers never hold up the run and never miss an event. A reader ends once
//! it has yielded an await event, or once it has caught up with a run that
//! is terminal. Ending at the await's position in the log, rather than on
//! the live status, keeps a slow reader from running past a suspension that
//! another client has already resumed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::BoxStream;

use crate::core::{Event, RunSnapshot, RunStatus};

use super::channels::RunStateReceiver;

/// Independent cursor over a run's output
pub struct EventReader {
    rx: RunStateReceiver,
    cursor: usize,
    stopped_at_await: bool,
    observed: Option<Arc<AtomicBool>>,
}

impl EventReader {
    /// Create a reader starting at `position` in the output
    pub fn new(rx: RunStateReceiver, position: usize) -> Self {
        Self {
            rx,
            cursor: position,
            stopped_at_await: false,
            observed: None,
        }
    }

    /// Flag set once this reader has seen the run's terminal state
    pub(crate) fn with_observed(mut self, observed: Arc<AtomicBool>) -> Self {
        self.observed = Some(observed);
        self
    }

    /// Index of the next event this reader will yield
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Whether the reader ended on an await event
    pub fn stopped_at_await(&self) -> bool {
        self.stopped_at_await
    }

    /// Current state of the run
    pub fn snapshot(&self) -> RunSnapshot {
        self.rx.borrow().clone()
    }

    /// Next event together with its index in the output
    ///
    /// Returns `None` after an await event has been yielded, or when the
    /// reader has caught up and the run is terminal.
    pub async fn next(&mut self) -> Option<(usize, Event)> {
        if self.stopped_at_await {
            return None;
        }

        loop {
            let (next, terminal) = {
                let run = self.rx.borrow_and_update();
                let next = run.output.get(self.cursor).cloned();
                // Awaiting with nothing left to read only happens when the
                // reader started past the await event
                if next.is_none() && run.status == RunStatus::Awaiting {
                    return None;
                }
                (next, run.status.is_terminal())
            };

            if let Some(event) = next {
                return Some(self.advance(event));
            }
            if terminal {
                self.mark_observed();
                return None;
            }

            if self.rx.changed().await.is_err() {
                // Publisher dropped; whatever is left in the last value is final
                let event = self.rx.borrow().output.get(self.cursor).cloned()?;
                return Some(self.advance(event));
            }
        }
    }

    fn advance(&mut self, event: Event) -> (usize, Event) {
        let seq = self.cursor;
        self.cursor += 1;
        self.stopped_at_await = event.is_await();
        (seq, event)
    }

    fn mark_observed(&self) {
        if let Some(observed) = &self.observed {
            observed.store(true, Ordering::Release);
        }
    }

    /// Drain the reader into a stream of `(index, event)` pairs
    pub fn into_stream(mut self) -> BoxStream<'static, (usize, Event)> {
        Box::pin(async_stream::stream! {
            while let Some(item) = self.next().await {
                yield item;
            }
        })
    }

    /// Collect every remaining event
    pub async fn collect(mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some((_, event)) = self.next().await {
            events.push(event);
        }
        events
    }
}

impl std::fmt::Debug for EventReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReader")
            .field("cursor", &self.cursor)
            .field("stopped_at_await", &self.stopped_at_await)
            .finish()
    }
}
