//! Preview, snooze and watch subcommands.

use std::sync::Arc;

use chrono::Local;
use tracing::{error, info};

use snooze_cdp::BrowserManager;
use snooze_config::Config;
use snooze_core::surface::{UNRESOLVED_MESSAGE, preview_text};
use snooze_core::{
    DateParser, DomNotifier, EnglishDateParser, FormatSpec, HostDocument, InputSurface,
    MenuWatcher, Orchestrator, RunOutcome, resolve_future,
};

use crate::settings;

fn parser(day_first: bool) -> EnglishDateParser {
    if day_first {
        EnglishDateParser::day_first()
    } else {
        EnglishDateParser::new()
    }
}

/// Print the preview line and the values the dialog would receive.
pub(crate) fn preview(
    text: &str,
    day_first: bool,
    date_sample: &str,
    time_sample: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(candidate) = resolve_future(&parser(day_first), text, Local::now()) else {
        println!("{}", UNRESOLVED_MESSAGE);
        return Ok(());
    };

    let target = candidate.resolved.naive_local();
    let format = FormatSpec::infer(date_sample, time_sample);
    println!("{}", preview_text(&candidate.resolved));
    println!("  matched: {}", candidate.matched);
    println!(
        "  dialog:  {} / {}  ({})",
        format.render_date(&target),
        format.render_time(&target),
        format
    );
    Ok(())
}

fn orchestrator(config: &Config, doc: Arc<dyn HostDocument>) -> Orchestrator {
    let locators = settings::locators(&config.selectors);
    let notifier = Arc::new(DomNotifier::new(
        doc.clone(),
        &locators,
        settings::toast_lifetime(&config.timing),
    ));
    Orchestrator::new(doc, notifier, locators, settings::timing(&config.timing))
}

/// Resolve `text` and snooze the conversation open in the mail tab.
pub(crate) async fn snooze(
    config: &Config,
    text: &str,
    port: Option<u16>,
    headless: bool,
    day_first: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(candidate) = resolve_future(&parser(day_first), text, Local::now()) else {
        return Err(format!("{}: {:?}", UNRESOLVED_MESSAGE, text).into());
    };
    info!(target = %candidate.resolved, "resolved snooze time");

    let manager = BrowserManager::new(settings::browser(config, port, headless));
    let doc: Arc<dyn HostDocument> = Arc::new(manager.mail_document(headless).await?);
    let orchestrator = orchestrator(config, doc);

    let outcome = orchestrator
        .submit(candidate.resolved.naive_local(), None)
        .await;
    manager.close().await;

    match outcome {
        RunOutcome::Done(confirmation) => {
            println!("Snoozed until {}", confirmation.summary());
            Ok(())
        }
        RunOutcome::Failed(err) => {
            error!(error = %err, "snooze failed");
            Err(err.into())
        }
        RunOutcome::Skipped => Err("another snooze is already running".into()),
    }
}

/// Inject the input surface into every snooze menu until Ctrl-C.
pub(crate) async fn watch(
    config: &Config,
    port: Option<u16>,
    day_first: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = BrowserManager::new(settings::browser(config, port, false));
    let doc: Arc<dyn HostDocument> = Arc::new(manager.mail_document(false).await?);
    let orchestrator = Arc::new(orchestrator(config, doc));

    let date_parser: Arc<dyn DateParser> = Arc::new(parser(day_first));
    let surface = Arc::new(InputSurface::new(orchestrator, date_parser));
    let watcher = MenuWatcher::new(surface);
    let shutdown = watcher.shutdown_token();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping");
        }
        shutdown.cancel();
    });

    println!("Watching the mail tab. Open a snooze menu and type a time; Ctrl-C to stop.");
    let summary = watcher.run().await?;
    manager.close().await;

    println!(
        "Injected {} input box(es), {} snooze(s) committed.",
        summary.injected, summary.committed
    );
    Ok(())
}
