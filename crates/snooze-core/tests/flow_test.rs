//! End-to-end tests of the snooze flow against a scripted mail page.
//!
//! Run with: cargo test -p snooze-core --test flow_test

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use snooze_core::dom::fixture::{MailPage, SubmitMarkup};
use snooze_core::dom::memory::{MemoryDocument, Recorded};
use snooze_core::dom::{InsertPosition, Key, SurfaceEvent};
use snooze_core::{
    AutomationTiming, DateParser, DomNotifier, HostDocument, InputSurface, Locators, Orchestrator,
    ParseCandidate, RunOutcome, RunState, Selector, SnoozeError, SurfaceExit,
};

fn now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 1, 14, 15, 0, 0).single().unwrap()
}

/// "tomorrow" is 09:00 on the next day; anything else is unknown.
struct TomorrowParser;

impl DateParser for TomorrowParser {
    fn parse(&self, text: &str, reference: DateTime<Local>) -> Option<ParseCandidate> {
        if !text.contains("tomorrow") {
            return None;
        }
        let day = reference.date_naive().succ_opt()?;
        let resolved = Local
            .from_local_datetime(&day.and_hms_opt(9, 0, 0)?)
            .single()?;
        Some(ParseCandidate {
            resolved,
            matched: "tomorrow".to_string(),
        })
    }
}

struct Harness {
    page: MailPage,
    doc: MemoryDocument,
    orchestrator: Arc<Orchestrator>,
}

impl Harness {
    fn new(page: MailPage) -> Self {
        let doc = page.build().unwrap();
        let shared: Arc<dyn HostDocument> = Arc::new(doc.clone());
        let locators = Locators::default();
        let notifier = Arc::new(DomNotifier::new(
            shared.clone(),
            &locators,
            Duration::from_secs(10),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            shared,
            notifier,
            locators,
            AutomationTiming::default(),
        ));
        Self {
            page,
            doc,
            orchestrator,
        }
    }

    fn surface(&self) -> InputSurface {
        InputSurface::new(self.orchestrator.clone(), Arc::new(TomorrowParser)).with_clock(now)
    }

    fn toast_text(&self) -> Option<String> {
        let toast = self.doc.find(&Selector::any().class("snooze-nl-toast"))?;
        self.doc.text_of(toast)
    }
}

#[tokio::test(start_paused = true)]
async fn test_typed_date_snoozes_through_dialog() {
    let harness = Harness::new(MailPage::new());
    let doc = &harness.doc;
    let menu = doc
        .append(None, InsertPosition::Last, &harness.page.menu_spec())
        .unwrap();

    let surface = harness.surface();
    let handle = surface.inject(menu).await.unwrap().unwrap();
    let input = handle.input;
    doc.emit(input, SurfaceEvent::Changed("tomorrow".to_string()));
    doc.emit(input, SurfaceEvent::Key(Key::Enter));

    let exit = surface.run(handle).await.unwrap();
    let SurfaceExit::Committed(RunOutcome::Done(confirmation)) = exit else {
        panic!("expected success, got {exit:?}");
    };
    let expected = NaiveDate::from_ymd_opt(2026, 1, 15)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    assert_eq!(confirmation.target, expected);

    let written: Vec<String> = doc
        .log()
        .into_iter()
        .filter_map(|e| match e {
            Recorded::ValueSet { value, .. } => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(written, vec!["Jan 15, 2026", "9:00 AM"]);

    let toast = harness.toast_text().unwrap();
    assert!(toast.contains("Thursday, January 15, 2026 at 9:00 AM"));
    assert!(doc.alerts().is_empty());
    assert_eq!(harness.orchestrator.state(), RunState::Done);

    // The toast expires on its own.
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(harness.toast_text().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_picker_alerts_once() {
    let harness = Harness::new(MailPage::new().ignore_presses(usize::MAX));
    let target = now().naive_local() + chrono::Duration::days(1);

    let outcome = harness.orchestrator.submit(target, None).await;
    assert!(matches!(
        outcome,
        RunOutcome::Failed(SnoozeError::TriggerExhausted { attempts: 3 })
    ));
    let alerts = harness.doc.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("3 attempts"));
    assert!(harness.toast_text().is_none());
    assert_eq!(
        harness
            .doc
            .activations(&harness.page.trigger_selector(), "mousedown"),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn test_text_only_save_button_and_day_first_dates() {
    let page = MailPage::new().submit(SubmitMarkup::TextOnly);
    let harness = Harness::new(page);
    let target = NaiveDate::from_ymd_opt(2026, 3, 5)
        .unwrap()
        .and_hms_opt(18, 45, 0)
        .unwrap();

    // Rewrite the dialog defaults once it opens.
    let outcome = {
        let doc = harness.doc.clone();
        let watcher = tokio::spawn(async move {
            loop {
                if let Some(date) = doc.find(&Selector::tag("input").attr("aria-label", "Date")) {
                    let time = doc
                        .find(&Selector::tag("input").attr("aria-label", "Time"))
                        .unwrap();
                    doc.set_value(date, "1 Jan, 2025").await.unwrap();
                    doc.set_value(time, "08:00").await.unwrap();
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        let outcome = harness.orchestrator.submit(target, None).await;
        watcher.await.unwrap();
        outcome
    };
    assert!(outcome.is_done());

    let written: Vec<String> = harness
        .doc
        .log()
        .into_iter()
        .filter_map(|e| match e {
            Recorded::ValueSet { value, .. } => Some(value),
            _ => None,
        })
        .filter(|v| v != "1 Jan, 2025" && v != "08:00")
        .collect();
    assert_eq!(written, vec!["5 Mar, 2026", "18:45"]);
}

#[tokio::test(start_paused = true)]
async fn test_commit_while_running_is_dropped() {
    let harness = Harness::new(MailPage::new());
    let target = now().naive_local() + chrono::Duration::days(1);

    let (first, second) = tokio::join!(
        harness.orchestrator.submit(target, None),
        harness.orchestrator.submit(target, None),
    );
    assert!(first.is_done());
    assert!(matches!(second, RunOutcome::Skipped));
    assert_eq!(
        harness
            .doc
            .activations(&harness.page.trigger_selector(), "mousedown"),
        1
    );
    assert_eq!(harness.doc.active_observers(), 0);
}
