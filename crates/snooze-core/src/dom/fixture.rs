//! A scripted mail page on top of [`MemoryDocument`].
//!
//! The page has a toolbar with a snooze control. Pressing the control opens
//! the snooze menu; releasing the pointer on the custom item replaces the
//! menu with the date & time dialog; clicking its submit button closes the
//! dialog. Delays and failure modes are configurable.

use std::time::Duration;

use super::memory::{MemoryDocument, Reaction};
use super::{ElementSpec, InsertPosition};
use crate::error::DomError;
use crate::locator::Selector;

/// How the dialog's submit control is marked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMarkup {
    /// `button[data-mdc-dialog-action="ok"]`
    DataAttribute,
    /// A plain button whose only identifying feature is its text.
    TextOnly,
    /// No submit control.
    Missing,
}

/// Builder for a scripted mail page.
#[derive(Debug, Clone)]
pub struct MailPage {
    trigger_label: String,
    menu_label: String,
    items: Vec<String>,
    pick_phrase: String,
    submit_text: String,
    url: String,
    with_trigger: bool,
    with_dialog: bool,
    submit: SubmitMarkup,
    menu_delay: Duration,
    dialog_delay: Duration,
    ignored_presses: usize,
    date_value: String,
    time_value: String,
}

impl Default for MailPage {
    fn default() -> Self {
        Self {
            trigger_label: "Snooze".to_string(),
            menu_label: "Snooze menu".to_string(),
            items: vec![
                "Later today".to_string(),
                "Tomorrow".to_string(),
                "This weekend".to_string(),
                "Next week".to_string(),
            ],
            pick_phrase: "Pick date & time".to_string(),
            submit_text: "Save".to_string(),
            url: "https://mail.google.com/mail/u/0/#inbox/FMfcgzQXJWZKmrvGvhRw".to_string(),
            with_trigger: true,
            with_dialog: true,
            submit: SubmitMarkup::DataAttribute,
            menu_delay: Duration::from_millis(50),
            dialog_delay: Duration::from_millis(80),
            ignored_presses: 0,
            date_value: "Jan 1, 2025".to_string(),
            time_value: "8:00 AM".to_string(),
        }
    }
}

impl MailPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page URL reported by the document.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Preset menu items shown before the custom item.
    pub fn items(mut self, items: &[&str]) -> Self {
        self.items = items.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Visible text of the custom item.
    pub fn pick_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.pick_phrase = phrase.into();
        self
    }

    /// Leave the snooze control out of the toolbar.
    pub fn without_trigger(mut self) -> Self {
        self.with_trigger = false;
        self
    }

    /// The custom item does nothing.
    pub fn without_dialog(mut self) -> Self {
        self.with_dialog = false;
        self
    }

    pub fn submit(mut self, markup: SubmitMarkup) -> Self {
        self.submit = markup;
        self
    }

    pub fn menu_delay(mut self, delay: Duration) -> Self {
        self.menu_delay = delay;
        self
    }

    pub fn dialog_delay(mut self, delay: Duration) -> Self {
        self.dialog_delay = delay;
        self
    }

    /// The snooze control ignores the first `n` presses.
    pub fn ignore_presses(mut self, n: usize) -> Self {
        self.ignored_presses = n;
        self
    }

    /// Selector of the snooze control.
    pub fn trigger_selector(&self) -> Selector {
        Selector::tag("div").attr("aria-label", self.trigger_label.clone())
    }

    /// Selector of the snooze menu.
    pub fn menu_selector(&self) -> Selector {
        Selector::any()
            .attr("role", "menu")
            .attr("aria-label", self.menu_label.clone())
    }

    /// Selector of the date & time dialog.
    pub fn dialog_selector() -> Selector {
        Selector::tag("div")
            .attr("role", "dialog")
            .attr("aria-modal", "true")
    }

    /// Selector of the custom menu item.
    pub fn pick_item_selector() -> Selector {
        Selector::any()
            .attr("role", "menuitem")
            .attr("data-snooze-option", "custom")
    }

    /// The snooze menu as the host renders it.
    pub fn menu_spec(&self) -> ElementSpec {
        let mut menu = ElementSpec::new("div")
            .attr("role", "menu")
            .attr("aria-label", self.menu_label.clone());
        for (i, item) in self.items.iter().enumerate() {
            menu = menu.child(
                ElementSpec::new("div")
                    .attr("role", "menuitem")
                    .attr("data-snooze-option", format!("preset-{i}"))
                    .text(item.clone()),
            );
        }
        menu.child(
            ElementSpec::new("div")
                .attr("role", "menuitem")
                .attr("data-snooze-option", "custom")
                .child(ElementSpec::new("span").text(self.pick_phrase.clone())),
        )
    }

    /// The date & time dialog as the host renders it.
    pub fn dialog_spec(&self) -> ElementSpec {
        let mut dialog = ElementSpec::new("div")
            .attr("role", "dialog")
            .attr("aria-modal", "true")
            .child(ElementSpec::new("h2").text("Pick date & time"))
            .child(
                ElementSpec::new("input")
                    .attr("aria-label", "Date")
                    .attr("value", self.date_value.clone()),
            )
            .child(
                ElementSpec::new("input")
                    .attr("aria-label", "Time")
                    .attr("value", self.time_value.clone()),
            )
            .child(
                ElementSpec::new("button")
                    .attr("data-mdc-dialog-action", "cancel")
                    .text("Cancel"),
            );
        match self.submit {
            SubmitMarkup::DataAttribute => {
                dialog = dialog.child(
                    ElementSpec::new("button")
                        .attr("data-mdc-dialog-action", "ok")
                        .text(self.submit_text.clone()),
                );
            }
            SubmitMarkup::TextOnly => {
                dialog = dialog.child(
                    ElementSpec::new("button")
                        .attr("class", "dialog-primary")
                        .text(format!("  {}  ", self.submit_text)),
                );
            }
            SubmitMarkup::Missing => {}
        }
        dialog
    }

    /// Build the document and register the host's reactions.
    pub fn build(&self) -> Result<MemoryDocument, DomError> {
        let doc = MemoryDocument::new();
        doc.set_url(self.url.clone());

        let mut toolbar = ElementSpec::new("div")
            .attr("role", "toolbar")
            .child(ElementSpec::new("div").attr("aria-label", "Archive"));
        if self.with_trigger {
            toolbar = toolbar.child(
                ElementSpec::new("div")
                    .attr("role", "button")
                    .attr("aria-label", self.trigger_label.clone())
                    .attr("data-tooltip", self.trigger_label.clone()),
            );
        }
        doc.append(None, InsertPosition::Last, &toolbar)?;

        doc.on_event_after(
            self.trigger_selector(),
            "mousedown",
            self.menu_delay,
            Reaction::Insert {
                parent: None,
                position: InsertPosition::Last,
                element: self.menu_spec(),
            },
            self.ignored_presses,
        );

        if self.with_dialog {
            doc.on_event(
                Self::pick_item_selector(),
                "mouseup",
                self.dialog_delay,
                Reaction::Sequence(vec![
                    Reaction::Remove(self.menu_selector()),
                    Reaction::Insert {
                        parent: None,
                        position: InsertPosition::Last,
                        element: self.dialog_spec(),
                    },
                ]),
            );
        }

        let closes_dialog = match self.submit {
            SubmitMarkup::DataAttribute => {
                Some(Selector::tag("button").attr("data-mdc-dialog-action", "ok"))
            }
            SubmitMarkup::TextOnly => Some(Selector::tag("button").class("dialog-primary")),
            SubmitMarkup::Missing => None,
        };
        if let Some(button) = closes_dialog {
            doc.on_event(
                button,
                "click",
                Duration::ZERO,
                Reaction::Remove(Self::dialog_selector()),
            );
        }

        Ok(doc)
    }
}
