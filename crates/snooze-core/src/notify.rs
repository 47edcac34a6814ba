//! Run outcome notifications.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::dom::{ClickAction, ElementSpec, HostDocument, InsertPosition};
use crate::error::DomError;
use crate::locator::{Locators, Selector};

/// A completed snooze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnoozeConfirmation {
    /// Local wall-clock time the message was snoozed until.
    pub target: NaiveDateTime,
    /// Page the run started on. Empty when it could not be read.
    pub origin_url: String,
}

impl SnoozeConfirmation {
    /// `Saturday, January 10, 2026 at 1:30 PM`
    pub fn summary(&self) -> String {
        self.target.format("%A, %B %-d, %Y at %-I:%M %p").to_string()
    }
}

/// Where run outcomes are reported. Exactly one call per run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn snoozed(&self, confirmation: &SnoozeConfirmation);
    async fn failed(&self, message: &str);
}

/// Reports through the host page: a toast on success, an alert on failure.
pub struct DomNotifier {
    doc: Arc<dyn HostDocument>,
    toast_class: String,
    lifetime: Duration,
}

impl DomNotifier {
    pub fn new(doc: Arc<dyn HostDocument>, locators: &Locators, lifetime: Duration) -> Self {
        Self {
            doc,
            toast_class: locators.toast_class.clone(),
            lifetime,
        }
    }

    fn toast(&self, confirmation: &SnoozeConfirmation) -> ElementSpec {
        let class = &self.toast_class;
        let mut toast = ElementSpec::new("div")
            .class(class.clone())
            .attr("role", "status")
            .child(
                ElementSpec::new("div")
                    .class(format!("{class}-title"))
                    .text("Snoozed until"),
            )
            .child(
                ElementSpec::new("div")
                    .class(format!("{class}-date"))
                    .text(confirmation.summary()),
            );
        if !confirmation.origin_url.is_empty() {
            toast = toast.child(
                ElementSpec::new("a")
                    .class(format!("{class}-link"))
                    .attr("href", confirmation.origin_url.clone())
                    .text("View message"),
            );
        }
        toast.child(
            ElementSpec::new("button")
                .class(format!("{class}-dismiss"))
                .text("Dismiss")
                .on_click(ClickAction::RemoveClosest(class.clone())),
        )
    }

    async fn show_toast(&self, confirmation: &SnoozeConfirmation) -> Result<(), DomError> {
        let selector = Selector::any().class(self.toast_class.clone());
        for old in self.doc.query_all(None, &selector).await? {
            self.doc.remove(old).await?;
        }

        let toast = self
            .doc
            .insert(None, InsertPosition::Last, self.toast(confirmation))
            .await?;

        let doc = Arc::clone(&self.doc);
        let lifetime = self.lifetime;
        tokio::spawn(async move {
            tokio::time::sleep(lifetime).await;
            if matches!(doc.is_attached(toast).await, Ok(true)) {
                if let Err(e) = doc.remove(toast).await {
                    warn!(error = %e, "failed to remove toast");
                }
            }
        });
        Ok(())
    }
}

#[async_trait]
impl Notifier for DomNotifier {
    async fn snoozed(&self, confirmation: &SnoozeConfirmation) {
        if let Err(e) = self.show_toast(confirmation).await {
            warn!(error = %e, "failed to show toast");
        }
    }

    async fn failed(&self, message: &str) {
        if let Err(e) = self.doc.alert(message).await {
            error!(error = %e, %message, "failed to alert");
        }
    }
}

/// Reports through `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn snoozed(&self, confirmation: &SnoozeConfirmation) {
        info!(
            until = %confirmation.summary(),
            origin = %confirmation.origin_url,
            "Snoozed"
        );
    }

    async fn failed(&self, message: &str) {
        error!(%message, "Snooze failed");
    }
}
