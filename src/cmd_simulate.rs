//! Simulate subcommand: the full flow against a scripted mail page.

use std::sync::Arc;

use chrono::Local;

use snooze_config::Config;
use snooze_core::dom::fixture::MailPage;
use snooze_core::surface::UNRESOLVED_MESSAGE;
use snooze_core::{
    DomNotifier, EnglishDateParser, HostDocument, Orchestrator, RunOutcome, resolve_future,
};

use crate::settings;

/// Run one automation against an in-memory mail page and print what happened.
pub(crate) async fn simulate(
    config: &Config,
    text: &str,
    fail_trigger: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(candidate) = resolve_future(&EnglishDateParser::new(), text, Local::now()) else {
        println!("{}", UNRESOLVED_MESSAGE);
        return Ok(());
    };

    let mut page = MailPage::new();
    if fail_trigger {
        page = page.ignore_presses(usize::MAX);
    }
    let memory = page.build()?;
    let doc: Arc<dyn HostDocument> = Arc::new(memory.clone());

    let locators = settings::locators(&config.selectors);
    let notifier = Arc::new(DomNotifier::new(
        doc.clone(),
        &locators,
        settings::toast_lifetime(&config.timing),
    ));
    let orchestrator = Orchestrator::new(doc, notifier, locators, settings::timing(&config.timing));

    let outcome = orchestrator
        .submit(candidate.resolved.naive_local(), None)
        .await;

    println!("Event log:");
    for (i, entry) in memory.log().iter().enumerate() {
        println!("  {:>3}. {:?}", i + 1, entry);
    }
    println!();
    println!("Trigger attempts: {}", orchestrator.attempts());
    match outcome {
        RunOutcome::Done(confirmation) => println!("Result: snoozed until {}", confirmation.summary()),
        RunOutcome::Failed(err) => println!("Result: failed ({})", err),
        RunOutcome::Skipped => println!("Result: skipped"),
    }
    Ok(())
}
