//! Appearance waits.
//!
//! Resolve as soon as a check over the document yields a value, re-checking
//! on every mutation batch under a scope, or give up after a timeout. A
//! timeout is a normal negative result, not an error.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::dom::{HostDocument, NodeId};
use crate::error::DomError;

/// Wait until `check` yields a value or `timeout` elapses.
///
/// The check runs once up front; when it already succeeds no subscription
/// is created. Otherwise the waiter subscribes to mutations under `scope`,
/// checks again (to close the race with the subscription) and then once per
/// batch. The subscription is dropped on every exit path.
pub async fn wait_for<T, F, Fut>(
    doc: &dyn HostDocument,
    scope: Option<NodeId>,
    timeout: Duration,
    mut check: F,
) -> Result<Option<T>, DomError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DomError>>,
{
    let deadline = Instant::now() + timeout;

    if let Some(found) = check().await? {
        return Ok(Some(found));
    }

    let mut subscription = doc.observe(scope).await?;
    if let Some(found) = check().await? {
        return Ok(Some(found));
    }

    let expiry = tokio::time::sleep_until(deadline);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            _ = &mut expiry => {
                trace!(?timeout, "appearance wait timed out");
                return Ok(None);
            }
            batch = subscription.next() => {
                let Some(batch) = batch else {
                    trace!("mutation stream closed during appearance wait");
                    return Ok(None);
                };
                trace!(records = batch.len(), "mutation batch");
                if let Some(found) = check().await? {
                    return Ok(Some(found));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{MemoryDocument, Reaction};
    use crate::dom::{ElementSpec, InsertPosition};
    use crate::locator::Selector;

    fn menu_selector() -> Selector {
        Selector::any().attr("role", "menu")
    }

    async fn find_menu(doc: &MemoryDocument) -> Result<Option<NodeId>, DomError> {
        doc.query(None, &menu_selector()).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_immediately_when_present() {
        let doc = MemoryDocument::new();
        let menu = doc
            .append(None, InsertPosition::Last, &ElementSpec::new("div").attr("role", "menu"))
            .unwrap();

        let start = Instant::now();
        let found = wait_for(&doc, None, Duration::from_secs(3), || find_menu(&doc))
            .await
            .unwrap();
        assert_eq!(found, Some(menu));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(doc.active_observers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_exactly_and_unsubscribes() {
        let doc = MemoryDocument::new();

        let start = Instant::now();
        let found = wait_for(&doc, None, Duration::from_millis(1500), || find_menu(&doc))
            .await
            .unwrap();
        assert_eq!(found, None);
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
        assert_eq!(doc.active_observers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_on_mutation() {
        let doc = MemoryDocument::new();
        let button = doc
            .append(None, InsertPosition::Last, &ElementSpec::new("button"))
            .unwrap();
        doc.on_event(
            Selector::tag("button"),
            "click",
            Duration::from_millis(200),
            Reaction::Insert {
                parent: None,
                position: InsertPosition::Last,
                element: ElementSpec::new("div").attr("role", "menu"),
            },
        );
        doc.native_click(button).await.unwrap();

        let start = Instant::now();
        let found = wait_for(&doc, None, Duration::from_secs(3), || find_menu(&doc))
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert_eq!(doc.active_observers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_mutations_keep_waiting() {
        let doc = MemoryDocument::new();
        let button = doc
            .append(None, InsertPosition::Last, &ElementSpec::new("button"))
            .unwrap();
        doc.on_event(
            Selector::tag("button"),
            "click",
            Duration::from_millis(100),
            Reaction::Insert {
                parent: None,
                position: InsertPosition::Last,
                element: ElementSpec::new("span"),
            },
        );
        doc.native_click(button).await.unwrap();

        let start = Instant::now();
        let found = wait_for(&doc, None, Duration::from_millis(500), || find_menu(&doc))
            .await
            .unwrap();
        assert_eq!(found, None);
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_check_error_propagates() {
        let doc = MemoryDocument::new();
        let result: Result<Option<()>, DomError> =
            wait_for(&doc, None, Duration::from_secs(1), || async {
                Err(DomError::Closed)
            })
            .await;
        assert!(matches!(result, Err(DomError::Closed)));
        assert_eq!(doc.active_observers(), 0);
    }
}
