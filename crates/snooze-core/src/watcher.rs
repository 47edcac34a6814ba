//! Menu watcher.
//!
//! Watches the whole document and injects an input surface into every
//! snooze menu that opens, then drives each surface on its own task.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dom::HostDocument;
use crate::error::DomError;
use crate::surface::{InputSurface, SurfaceExit};

/// What a watch session did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary {
    /// Surfaces injected.
    pub injected: usize,
    /// Surfaces that ended in a committed run.
    pub committed: usize,
}

/// Injects surfaces into snooze menus until shut down.
pub struct MenuWatcher {
    surface: Arc<InputSurface>,
    shutdown: CancellationToken,
}

impl MenuWatcher {
    pub fn new(surface: Arc<InputSurface>) -> Self {
        Self {
            surface,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn doc(&self) -> &Arc<dyn HostDocument> {
        self.surface.orchestrator().document()
    }

    /// Watch until the shutdown token fires or the document goes away.
    pub async fn run(&self) -> Result<WatchSummary, DomError> {
        let mut summary = WatchSummary::default();
        let mut surfaces = JoinSet::new();
        let mut subscription = self.doc().observe(None).await?;
        info!("watching for snooze menus");

        recoverable(self.scan(&mut surfaces, &mut summary).await)?;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("menu watcher shutting down");
                    break;
                }
                batch = subscription.next() => {
                    if batch.is_none() {
                        info!("document closed, menu watcher stopping");
                        break;
                    }
                    recoverable(self.scan(&mut surfaces, &mut summary).await)?;
                }
                Some(joined) = surfaces.join_next() => {
                    match joined {
                        Ok(Ok(SurfaceExit::Committed(outcome))) => {
                            summary.committed += 1;
                            debug!(done = outcome.is_done(), "surface committed");
                        }
                        Ok(Ok(exit)) => debug!(?exit, "surface ended"),
                        Ok(Err(e)) => warn!(error = %e, "surface failed"),
                        Err(e) => warn!(error = %e, "surface task panicked"),
                    }
                }
            }
        }

        surfaces.abort_all();
        Ok(summary)
    }

    async fn scan(
        &self,
        surfaces: &mut JoinSet<Result<SurfaceExit, DomError>>,
        summary: &mut WatchSummary,
    ) -> Result<(), DomError> {
        let orchestrator = self.surface.orchestrator();
        // The automation opens and closes the menu itself.
        if orchestrator.is_running() {
            return Ok(());
        }

        let Some(menu) = self.doc().query(None, &orchestrator.locators().menu).await? else {
            return Ok(());
        };

        if let Some(handle) = self.surface.inject(menu).await? {
            summary.injected += 1;
            let surface = Arc::clone(&self.surface);
            surfaces.spawn(async move { surface.run(handle).await });
        }
        Ok(())
    }
}

/// Only a closed document ends the watch; anything else is the page moving
/// under a scan and the next mutation gets another try.
fn recoverable(result: Result<(), DomError>) -> Result<(), DomError> {
    match result {
        Err(DomError::Closed) => Err(DomError::Closed),
        Err(e) => {
            warn!(error = %e, "menu scan failed, still watching");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{DateTime, Local, TimeZone};

    use crate::dom::fixture::MailPage;
    use crate::dom::{ElementSpec, InsertPosition, Key, NodeId, SurfaceEvent, SyntheticEvent};
    use crate::locator::{Locators, Selector};
    use crate::notify::LogNotifier;
    use crate::orchestrator::{AutomationTiming, Orchestrator};
    use crate::parser::{DateParser, ParseCandidate};

    struct InOneDay;

    impl DateParser for InOneDay {
        fn parse(&self, text: &str, reference: DateTime<Local>) -> Option<ParseCandidate> {
            Some(ParseCandidate {
                resolved: reference + chrono::Duration::days(1),
                matched: text.to_string(),
            })
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 14, 15, 0, 0).single().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_injects_into_opened_menu_and_runs() {
        let page = MailPage::new();
        let doc = page.build().unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(doc.clone()),
            Arc::new(LogNotifier),
            Locators::default(),
            AutomationTiming::default(),
        ));
        let surface = Arc::new(
            InputSurface::new(orchestrator.clone(), Arc::new(InOneDay)).with_clock(now),
        );
        let watcher = Arc::new(MenuWatcher::new(surface));
        let shutdown = watcher.shutdown_token();
        let task = {
            let watcher = watcher.clone();
            tokio::spawn(async move { watcher.run().await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(doc.count(&Selector::any().class("snooze-nl-input")), 0);

        // The user opens the menu by hand.
        let trigger = doc.find(&page.trigger_selector()).unwrap();
        doc.dispatch(trigger, SyntheticEvent::MOUSE_DOWN).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let input = doc
            .find(&Selector::any().class("snooze-nl-input"))
            .unwrap();
        assert!(doc.emit(input, SurfaceEvent::Changed("tomorrow".to_string())));
        assert!(doc.emit(input, SurfaceEvent::Key(Key::Enter)));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(orchestrator.state(), crate::orchestrator::RunState::Done);
        assert_eq!(doc.count(&MailPage::dialog_selector()), 0);
        assert_eq!(doc.count(&Selector::any().class("snooze-nl-input")), 0);

        shutdown.cancel();
        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary, WatchSummary { injected: 1, committed: 1 });
        assert_eq!(doc.active_observers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_menu_open_at_start_gets_surface() {
        let page = MailPage::new();
        let doc = page.build().unwrap();
        doc.append(None, InsertPosition::Last, &page.menu_spec())
            .unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(doc.clone()),
            Arc::new(LogNotifier),
            Locators::default(),
            AutomationTiming::default(),
        ));
        let watcher = Arc::new(MenuWatcher::new(Arc::new(InputSurface::new(
            orchestrator,
            Arc::new(InOneDay),
        ))));
        let shutdown = watcher.shutdown_token();
        let task = {
            let watcher = watcher.clone();
            tokio::spawn(async move { watcher.run().await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(doc.count(&Selector::any().class("snooze-nl-input")), 1);

        shutdown.cancel();
        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.injected, 1);
        assert_eq!(summary.committed, 0);
    }

    fn start(
        doc: &crate::dom::memory::MemoryDocument,
    ) -> (
        Arc<Orchestrator>,
        CancellationToken,
        tokio::task::JoinHandle<Result<WatchSummary, DomError>>,
    ) {
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(doc.clone()),
            Arc::new(LogNotifier),
            Locators::default(),
            AutomationTiming::default(),
        ));
        let surface = Arc::new(
            InputSurface::new(orchestrator.clone(), Arc::new(InOneDay)).with_clock(now),
        );
        let watcher = MenuWatcher::new(surface);
        let shutdown = watcher.shutdown_token();
        let task = tokio::spawn(async move { watcher.run().await });
        (orchestrator, shutdown, task)
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_second_surface_while_commit_removes_the_first() {
        let page = MailPage::new();
        let doc = page.build().unwrap();
        // The removal mutation lands well before the remove call returns.
        doc.set_remove_latency(Duration::from_millis(5));
        let (orchestrator, shutdown, task) = start(&doc);
        tokio::time::sleep(Duration::from_millis(1)).await;

        let trigger = doc.find(&page.trigger_selector()).unwrap();
        doc.dispatch(trigger, SyntheticEvent::MOUSE_DOWN).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let input = doc
            .find(&Selector::any().class("snooze-nl-input"))
            .unwrap();
        doc.emit(input, SurfaceEvent::Changed("tomorrow".to_string()));
        doc.emit(input, SurfaceEvent::Key(Key::Enter));

        tokio::time::sleep(Duration::from_millis(3)).await;
        assert!(orchestrator.is_running());
        assert_eq!(doc.count(&Selector::any().class("snooze-nl-input")), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(orchestrator.state(), crate::orchestrator::RunState::Done);
        assert_eq!(doc.count(&Selector::any().class("snooze-nl-input")), 0);

        shutdown.cancel();
        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary, WatchSummary { injected: 1, committed: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_injection_keeps_watching() {
        let page = MailPage::new();
        let doc = page.build().unwrap();
        doc.fail_next("insert", DomError::NodeNotFound(NodeId(4)));
        let (_orchestrator, shutdown, task) = start(&doc);
        tokio::time::sleep(Duration::from_millis(1)).await;

        let trigger = doc.find(&page.trigger_selector()).unwrap();
        doc.dispatch(trigger, SyntheticEvent::MOUSE_DOWN).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!task.is_finished());
        assert_eq!(doc.count(&Selector::any().class("snooze-nl-input")), 0);

        // The next page mutation gets another scan.
        doc.append(None, InsertPosition::Last, &ElementSpec::new("div"))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(doc.count(&Selector::any().class("snooze-nl-input")), 1);

        shutdown.cancel();
        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.injected, 1);
    }
}
