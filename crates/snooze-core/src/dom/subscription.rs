//! Live subscriptions handed out by a host document.

use tokio::sync::mpsc;

use super::{NodeId, SurfaceEvent};

/// One observed DOM change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were added to or removed from `target`.
    ChildList { target: NodeId },
    /// An attribute of `target` changed.
    Attributes { target: NodeId, name: String },
    /// Text under `target` changed.
    CharacterData { target: NodeId },
}

type Teardown = Box<dyn FnOnce() + Send + Sync>;

/// A mutation observer registration.
///
/// Each item is one batch of records. Dropping the subscription runs the
/// host's teardown, so an observer can never outlive its consumer.
pub struct MutationSubscription {
    rx: mpsc::UnboundedReceiver<Vec<MutationRecord>>,
    teardown: Option<Teardown>,
}

impl MutationSubscription {
    /// Wrap a batch receiver and the host-specific unregistration.
    pub fn new(
        rx: mpsc::UnboundedReceiver<Vec<MutationRecord>>,
        teardown: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Next mutation batch; `None` once the host stops delivering.
    pub async fn next(&mut self) -> Option<Vec<MutationRecord>> {
        self.rx.recv().await
    }
}

impl Drop for MutationSubscription {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl std::fmt::Debug for MutationSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationSubscription").finish_non_exhaustive()
    }
}

/// User input stream of one injected text box.
pub struct SurfaceEvents {
    rx: mpsc::UnboundedReceiver<SurfaceEvent>,
    teardown: Option<Teardown>,
}

impl SurfaceEvents {
    pub fn new(
        rx: mpsc::UnboundedReceiver<SurfaceEvent>,
        teardown: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Next input event; `None` once the text box is gone.
    pub async fn next(&mut self) -> Option<SurfaceEvent> {
        self.rx.recv().await
    }
}

impl Drop for SurfaceEvents {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl std::fmt::Debug for SurfaceEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceEvents").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_teardown_runs_on_drop() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        let flag = torn_down.clone();
        let mut sub = MutationSubscription::new(rx, move || flag.store(true, Ordering::SeqCst));

        tx.send(vec![MutationRecord::ChildList { target: NodeId(1) }]).unwrap();
        let batch = sub.next().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert!(!torn_down.load(Ordering::SeqCst));

        drop(sub);
        assert!(torn_down.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_next_is_none_after_sender_drop() {
        let (tx, rx) = mpsc::unbounded_channel::<SurfaceEvent>();
        let mut events = SurfaceEvents::new(rx, || {});
        drop(tx);
        assert!(events.next().await.is_none());
    }
}
