//! Progress notification port
//!
//! Subscribers receive [`ProgressEvent`]s in exactly the order the
//! orchestrator produced them. Emission is synchronous, never blocks and
//! never fails: a subscriber that has gone away simply stops receiving.

use std::sync::Arc;
use synthesis_domain::ProgressEvent;
use tokio::sync::mpsc;

/// Receives pipeline progress events
pub trait ProgressNotifier: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

/// No subscriber attached; events are dropped
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn emit(&self, _event: &ProgressEvent) {}
}

/// Forwards events into an unbounded channel
///
/// The unbounded channel keeps `emit` non-blocking; a dropped receiver
/// turns further sends into no-ops.
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressNotifier for ChannelProgress {
    fn emit(&self, event: &ProgressEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Delivers each event to several subscribers, in registration order
#[derive(Default)]
pub struct CompositeProgress {
    subscribers: Vec<Arc<dyn ProgressNotifier>>,
}

impl CompositeProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, subscriber: Arc<dyn ProgressNotifier>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl ProgressNotifier for CompositeProgress {
    fn emit(&self, event: &ProgressEvent) {
        for subscriber in &self.subscribers {
            subscriber.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthesis_domain::Stage;

    fn event(stage: Stage) -> ProgressEvent {
        ProgressEvent::StageStarted {
            run_id: "r".into(),
            stage,
            models: vec![],
        }
    }

    #[test]
    fn test_channel_preserves_order() {
        let (progress, mut rx) = ChannelProgress::new();
        for stage in Stage::ALL {
            progress.emit(&event(stage));
        }
        for stage in Stage::ALL {
            assert_eq!(rx.try_recv().unwrap().stage(), Some(stage));
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_silent() {
        let (progress, rx) = ChannelProgress::new();
        drop(rx);
        progress.emit(&event(Stage::InitialResponse));
    }

    #[test]
    fn test_composite_fans_out() {
        let (a, mut rx_a) = ChannelProgress::new();
        let (b, mut rx_b) = ChannelProgress::new();
        let composite = CompositeProgress::new().with(Arc::new(a)).with(Arc::new(b));
        composite.emit(&event(Stage::PeerReview));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
        assert!(CompositeProgress::new().is_empty());
    }
}
