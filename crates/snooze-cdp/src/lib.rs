//! # snooze-nl CDP backend
//!
//! Runs the snooze automation against a real mail tab. A [`BrowserManager`]
//! finds (or launches) Chrome with remote debugging and attaches to the mail
//! tab; [`CdpDocument`] implements [`snooze_core::HostDocument`] on top of a
//! small script installed in the page.
//!
//! ```rust,ignore
//! let manager = BrowserManager::new(BrowserConfig::default());
//! let doc = manager.mail_document(false).await?;
//! let orchestrator = Orchestrator::new(Arc::new(doc), notifier, locators, timing);
//! ```

mod bridge;
pub mod cdp;
mod document;
mod manager;

pub use cdp::{CdpClient, CdpError, PageSession};
pub use document::CdpDocument;
pub use manager::{BrowserConfig, BrowserError, BrowserManager};
