//! Channel type definitions for run communication
//!
//! A run uses three channels:
//! - **Event channel** (bounded mpsc): handler to driver. Its capacity is the
//!   backpressure point for a handler that produces faster than it is recorded.
//! - **Resume channel** (single-slot mpsc): resume payload to a suspended handler
//! - **State channel** (watch): the run record, observed by every consumer

use tokio::sync::{mpsc, watch};

use crate::core::{AwaitResume, Event, Run};

/// Default buffer size for the event channel
pub const EVENT_CHANNEL_SIZE: usize = 32;

/// The resume channel holds at most one pending payload
pub const RESUME_CHANNEL_SIZE: usize = 1;

/// Sender half of the event channel (used by RunContext)
pub type EventSender = mpsc::Sender<Event>;

/// Receiver half of the event channel (used by the run driver)
pub type EventReceiver = mpsc::Receiver<Event>;

/// Sender half of the resume channel (used by RunBundle::resume)
pub type ResumeSender = mpsc::Sender<AwaitResume>;

/// Receiver half of the resume channel (used by RunContext)
pub type ResumeReceiver = mpsc::Receiver<AwaitResume>;

/// Publisher of the run record
pub type RunStateSender = watch::Sender<Run>;

/// Observer of the run record
pub type RunStateReceiver = watch::Receiver<Run>;

/// Create a new event channel pair
///
/// A capacity of zero is raised to one since tokio channels require it.
pub fn create_event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Create a new single-slot resume channel pair
pub fn create_resume_channel() -> (ResumeSender, ResumeReceiver) {
    mpsc::channel(RESUME_CHANNEL_SIZE)
}

/// Create the state channel for a run
///
/// The receiver returned by `watch::channel` is dropped; observers are
/// created with `sender.subscribe()`.
pub fn create_state_channel(run: Run) -> RunStateSender {
    let (tx, _) = watch::channel(run);
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_event_channel_order() {
        let (tx, mut rx) = create_event_channel(EVENT_CHANNEL_SIZE);

        tx.send(Event::text("One")).await.unwrap();
        tx.send(Event::text("Two")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Event::text("One"));
        assert_eq!(rx.recv().await.unwrap(), Event::text("Two"));
    }

    #[tokio::test]
    async fn test_event_channel_backpressure() {
        let (tx, mut rx) = create_event_channel(1);

        tx.send(Event::text("first")).await.unwrap();

        // Second send blocks until the first is received
        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.send(Event::text("second"))).await;
        assert!(blocked.is_err());

        rx.recv().await.unwrap();
        tx.send(Event::text("second")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Event::text("second"));
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised() {
        let (tx, mut rx) = create_event_channel(0);
        tx.send(Event::status("ok")).await.unwrap();
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_resume_channel_single_slot() {
        let (tx, mut rx) = create_resume_channel();

        tx.try_send(AwaitResume::data(json!("ok"))).unwrap();
        assert!(tx.try_send(AwaitResume::data(json!("again"))).is_err());

        assert_eq!(rx.recv().await.unwrap(), AwaitResume::data(json!("ok")));
    }

    #[tokio::test]
    async fn test_state_channel_late_subscriber_sees_latest() {
        let tx = create_state_channel(Run::new("echo", None));

        tx.send_modify(|run| run.output.push(Event::text("hi")));

        let rx = tx.subscribe();
        assert_eq!(rx.borrow().output.len(), 1);
    }

    #[tokio::test]
    async fn test_event_channel_close() {
        let (tx, mut rx) = create_event_channel(EVENT_CHANNEL_SIZE);
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}
