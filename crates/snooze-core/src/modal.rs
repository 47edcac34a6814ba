//! Modal filler.
//!
//! Fills the host's date & time dialog with a target and submits it. The
//! host only accepts a new value after it sees `input`, `change` and `blur`,
//! so assigning the value alone is not enough.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::dom::{HostDocument, NodeId, SyntheticEvent};
use crate::error::{DomError, SnoozeError};
use crate::format::FormatSpec;
use crate::locator::Locators;
use crate::waiter::wait_for;

/// Fixed waits around the dialog. No readiness signal exists, so these are
/// lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    /// After the dialog appears, before reading its inputs.
    pub after_open: Duration,
    /// After filling, before submitting.
    pub before_submit: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_open: Duration::from_millis(100),
            before_submit: Duration::from_millis(100),
        }
    }
}

/// What was written into the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledValues {
    pub format: FormatSpec,
    pub date: String,
    pub time: String,
}

/// Assign a value the way a user edit would look to the host.
pub async fn set_input_value(
    doc: &dyn HostDocument,
    input: NodeId,
    value: &str,
) -> Result<(), DomError> {
    doc.focus(input).await?;
    doc.set_value(input, value).await?;
    for event in [SyntheticEvent::INPUT, SyntheticEvent::CHANGE, SyntheticEvent::BLUR] {
        doc.dispatch(input, event).await?;
    }
    Ok(())
}

/// Fills and submits the date & time dialog.
pub struct ModalFiller<'a> {
    doc: &'a dyn HostDocument,
    locators: &'a Locators,
    delays: SettleDelays,
}

impl<'a> ModalFiller<'a> {
    pub fn new(doc: &'a dyn HostDocument, locators: &'a Locators, delays: SettleDelays) -> Self {
        Self {
            doc,
            locators,
            delays,
        }
    }

    /// Wait for the dialog to appear anywhere in the document.
    pub async fn await_modal(&self, timeout: Duration) -> Result<NodeId, SnoozeError> {
        let modal = wait_for(self.doc, None, timeout, || {
            self.doc.query(None, &self.locators.modal)
        })
        .await?;
        modal.ok_or(SnoozeError::ModalNotFound)
    }

    /// Fill the dialog with `target` and submit it.
    pub async fn fill(
        &self,
        modal: NodeId,
        target: &NaiveDateTime,
    ) -> Result<FilledValues, SnoozeError> {
        tokio::time::sleep(self.delays.after_open).await;
        self.ensure_attached(modal).await?;

        let date_input = self
            .doc
            .query(Some(modal), &self.locators.date_input)
            .await?
            .ok_or(SnoozeError::DateInputMissing)?;
        let time_input = self
            .doc
            .query(Some(modal), &self.locators.time_input)
            .await?
            .ok_or(SnoozeError::TimeInputMissing)?;

        let original_date = self.doc.value(date_input).await?;
        let original_time = self.doc.value(time_input).await?;
        let format = FormatSpec::infer(&original_date, &original_time);
        let date = format.render_date(target);
        let time = format.render_time(target);
        debug!(%original_date, %original_time, %date, %time, "filling dialog");

        set_input_value(self.doc, date_input, &date).await?;
        set_input_value(self.doc, time_input, &time).await?;

        let submit = self
            .find_submit(modal)
            .await?
            .ok_or(SnoozeError::SubmitMissing)?;

        tokio::time::sleep(self.delays.before_submit).await;
        self.ensure_attached(modal).await?;
        self.doc.native_click(submit).await?;
        debug!(%submit, "dialog submitted");

        Ok(FilledValues { format, date, time })
    }

    /// The submit control: by data attribute, else the button whose trimmed
    /// text is exactly the submit text.
    pub async fn find_submit(&self, modal: NodeId) -> Result<Option<NodeId>, DomError> {
        if let Some(submit) = self.doc.query(Some(modal), &self.locators.submit).await? {
            return Ok(Some(submit));
        }
        for button in self
            .doc
            .query_all(Some(modal), &self.locators.buttons())
            .await?
        {
            if self.doc.text_content(button).await?.trim() == self.locators.submit_text {
                return Ok(Some(button));
            }
        }
        Ok(None)
    }

    async fn ensure_attached(&self, modal: NodeId) -> Result<(), SnoozeError> {
        if self.doc.is_attached(modal).await? {
            Ok(())
        } else {
            debug!(%modal, "dialog detached");
            Err(SnoozeError::ModalNotFound)
        }
    }
}
