//! # snooze-nl Core
//!
//! Natural-language snooze for a webmail client, done by driving the
//! client's own "pick date & time" dialog.
//!
//! ## Flow
//!
//! ```text
//! keystroke ─▶ InputSurface ─▶ DateParser ─▶ target time
//!                                               │
//!                                               ▼
//!                                         Orchestrator
//!                       ┌───────────────────────┼──────────────────────┐
//!                       ▼                       ▼                      ▼
//!                 MenuTrigger ──▶ wait_for ──▶ ModalFiller ──▶ Notifier
//! ```
//!
//! ## Key Components
//!
//! - [`HostDocument`]: the host page, behind an async trait
//! - [`Locators`]: selectors for the menu, items, dialog and inputs
//! - [`wait_for`]: mutation-driven appearance waits with a timeout
//! - [`FormatSpec`]: renders a target in the host input's own format
//! - [`MenuTrigger`] and [`ModalFiller`]: the two automation steps
//! - [`Orchestrator`]: single-flight run state machine with bounded retries
//! - [`InputSurface`] and [`MenuWatcher`]: the injected text box
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use snooze_core::{
//!     AutomationTiming, EnglishDateParser, Locators, LogNotifier, Orchestrator, resolve_future,
//! };
//! use snooze_core::dom::fixture::MailPage;
//!
//! #[tokio::main]
//! async fn main() {
//!     let doc = MailPage::new().build().unwrap();
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(doc),
//!         Arc::new(LogNotifier),
//!         Locators::default(),
//!         AutomationTiming::default(),
//!     );
//!     let now = chrono::Local::now();
//!     let target = resolve_future(&EnglishDateParser::new(), "tomorrow 9am", now).unwrap();
//!     orchestrator.submit(target.resolved.naive_local(), None).await;
//! }
//! ```

pub mod dom;
pub mod error;
pub mod format;
pub mod locator;
pub mod modal;
pub mod notify;
pub mod orchestrator;
pub mod parser;
pub mod surface;
pub mod trigger;
pub mod waiter;
pub mod watcher;

pub use dom::{HostDocument, NodeId};
pub use error::{DomError, SnoozeError};
pub use format::{DatePattern, FormatSpec, TimePattern};
pub use locator::{Locators, Selector};
pub use modal::{ModalFiller, SettleDelays};
pub use notify::{DomNotifier, LogNotifier, Notifier, SnoozeConfirmation};
pub use orchestrator::{AutomationTiming, Orchestrator, RunOutcome, RunPermit, RunState};
pub use parser::{DateParser, EnglishDateParser, ParseCandidate, resolve_future};
pub use surface::{InputSurface, SurfaceExit};
pub use trigger::MenuTrigger;
pub use waiter::wait_for;
pub use watcher::{MenuWatcher, WatchSummary};
