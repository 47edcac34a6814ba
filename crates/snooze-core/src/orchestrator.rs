//! Automation orchestrator.
//!
//! Drives one snooze run end to end:
//! `Idle → Triggering → AwaitingModal → Filling → Done | Failed`.
//! The trigger step is retried a bounded number of times; dialog problems
//! fail the run at once. At most one run is in flight; a second submit
//! while one is active is dropped.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::dom::{HostDocument, NodeId};
use crate::error::{DomError, SnoozeError};
use crate::locator::Locators;
use crate::modal::{ModalFiller, SettleDelays};
use crate::notify::{Notifier, SnoozeConfirmation};
use crate::trigger::MenuTrigger;

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

/// Run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// No run has started, or the last one was released.
    Idle = 0,
    /// Opening the menu and activating the custom item.
    Triggering = 1,
    /// Waiting for the date & time dialog.
    AwaitingModal = 2,
    /// Writing the target into the dialog.
    Filling = 3,
    /// The last run succeeded.
    Done = 4,
    /// The last run failed.
    Failed = 5,
}

impl From<u8> for RunState {
    fn from(v: u8) -> Self {
        match v {
            1 => RunState::Triggering,
            2 => RunState::AwaitingModal,
            3 => RunState::Filling,
            4 => RunState::Done,
            5 => RunState::Failed,
            _ => RunState::Idle,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Triggering => write!(f, "triggering"),
            RunState::AwaitingModal => write!(f, "awaiting-modal"),
            RunState::Filling => write!(f, "filling"),
            RunState::Done => write!(f, "done"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Timeouts, settling delays and the retry budget of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationTiming {
    /// How long to wait for the menu after activating the trigger.
    pub menu_timeout: Duration,
    /// How long to wait for the custom item inside the menu.
    pub item_timeout: Duration,
    /// How long to wait for the dialog after activating the item.
    pub modal_timeout: Duration,
    /// Pause after the menu appears, before looking for items.
    pub menu_populate: Duration,
    /// Settling delays around the dialog.
    pub settle: SettleDelays,
    /// Pause between failed trigger attempts.
    pub retry_backoff: Duration,
    /// Trigger attempts per run.
    pub max_attempts: u32,
}

impl Default for AutomationTiming {
    fn default() -> Self {
        Self {
            menu_timeout: Duration::from_millis(3000),
            item_timeout: Duration::from_millis(1500),
            modal_timeout: Duration::from_millis(3000),
            menu_populate: Duration::from_millis(150),
            settle: SettleDelays::default(),
            retry_backoff: Duration::from_millis(400),
            max_attempts: 3,
        }
    }
}

/// How a submit ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Done(SnoozeConfirmation),
    Failed(SnoozeError),
    /// Another run was in flight; nothing happened.
    Skipped,
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, RunOutcome::Done(_))
    }
}

/// Proof of holding the single-flight slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct RunPermit<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owns the run lifecycle and the single-flight slot.
pub struct Orchestrator {
    doc: Arc<dyn HostDocument>,
    notifier: Arc<dyn Notifier>,
    locators: Locators,
    timing: AutomationTiming,
    in_flight: AtomicBool,
    state: AtomicU8,
    attempts: AtomicU32,
}

impl Orchestrator {
    pub fn new(
        doc: Arc<dyn HostDocument>,
        notifier: Arc<dyn Notifier>,
        locators: Locators,
        timing: AutomationTiming,
    ) -> Self {
        Self {
            doc,
            notifier,
            locators,
            timing,
            in_flight: AtomicBool::new(false),
            state: AtomicU8::new(RunState::Idle as u8),
            attempts: AtomicU32::new(0),
        }
    }

    /// Claim the single-flight slot, or `None` when a run is active.
    pub fn try_begin(&self) -> Option<RunPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                flag: &self.in_flight,
            })
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// State of the current or last run.
    pub fn state(&self) -> RunState {
        RunState::from(self.state.load(Ordering::Acquire))
    }

    /// Trigger attempts made by the current or last run.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    pub fn locators(&self) -> &Locators {
        &self.locators
    }

    pub fn document(&self) -> &Arc<dyn HostDocument> {
        &self.doc
    }

    fn set_state(&self, state: RunState) {
        debug!(%state, "run state");
        self.state.store(state as u8, Ordering::Release);
    }

    /// Snooze the open conversation until `target`.
    ///
    /// `menu_hint` is the menu the request came from; it is only trusted on
    /// the first attempt and only while attached. Exactly one notification
    /// is emitted per run that starts.
    pub async fn submit(&self, target: NaiveDateTime, menu_hint: Option<NodeId>) -> RunOutcome {
        let Some(permit) = self.try_begin() else {
            debug!(%target, "run already in flight, ignoring submit");
            return RunOutcome::Skipped;
        };
        self.run_with_permit(permit, target, menu_hint).await
    }

    /// Like [`submit`](Self::submit), for a caller that claimed the slot
    /// with [`try_begin`](Self::try_begin) and had work to do before the run.
    pub async fn run_with_permit(
        &self,
        permit: RunPermit<'_>,
        target: NaiveDateTime,
        menu_hint: Option<NodeId>,
    ) -> RunOutcome {
        debug_assert!(std::ptr::eq(permit.flag, &self.in_flight));
        let _permit = permit;
        let run_id = Uuid::new_v4();
        let span = info_span!("snooze_run", %run_id, %target);
        async move {
            self.attempts.store(0, Ordering::Release);

            // The host may navigate once automation starts.
            let origin_url = match self.doc.location().await {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "could not read page location");
                    String::new()
                }
            };
            info!(origin = %origin_url, "snooze run started");

            match self.run(target, menu_hint, origin_url).await {
                Ok(confirmation) => {
                    self.set_state(RunState::Done);
                    info!(attempts = self.attempts(), "snooze run done");
                    self.notifier.snoozed(&confirmation).await;
                    RunOutcome::Done(confirmation)
                }
                Err(err) => {
                    self.set_state(RunState::Failed);
                    error!(error = %err, attempts = self.attempts(), "snooze run failed");
                    self.notifier.failed(&failure_message(&err)).await;
                    RunOutcome::Failed(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        target: NaiveDateTime,
        menu_hint: Option<NodeId>,
        origin_url: String,
    ) -> Result<SnoozeConfirmation, SnoozeError> {
        self.open_picker(menu_hint).await?;

        self.set_state(RunState::AwaitingModal);
        let filler = ModalFiller::new(self.doc.as_ref(), &self.locators, self.timing.settle);
        let modal = filler.await_modal(self.timing.modal_timeout).await?;

        self.set_state(RunState::Filling);
        let filled = filler.fill(modal, &target).await?;
        debug!(date = %filled.date, time = %filled.time, format = %filled.format, "dialog filled");

        Ok(SnoozeConfirmation { target, origin_url })
    }

    /// Bounded retries of menu + custom item activation.
    async fn open_picker(&self, menu_hint: Option<NodeId>) -> Result<(), SnoozeError> {
        let max_attempts = self.timing.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.attempts.store(attempt, Ordering::Release);
            self.set_state(RunState::Triggering);

            // The host rebuilds the menu after a failed click.
            let hint = if attempt == 1 { menu_hint } else { None };
            match self.trigger_once(hint).await {
                Ok(true) => {
                    debug!(attempt, "custom item activated");
                    return Ok(());
                }
                Ok(false) => warn!(attempt, max_attempts, "trigger attempt failed"),
                Err(DomError::Closed) => return Err(DomError::Closed.into()),
                Err(e) => warn!(attempt, max_attempts, error = %e, "trigger attempt errored"),
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.timing.retry_backoff).await;
            }
        }

        Err(SnoozeError::TriggerExhausted {
            attempts: max_attempts,
        })
    }

    async fn trigger_once(&self, hint: Option<NodeId>) -> Result<bool, DomError> {
        let trigger = MenuTrigger::new(self.doc.as_ref(), &self.locators);
        let Some(menu) = trigger.ensure_menu(hint, self.timing.menu_timeout).await? else {
            return Ok(false);
        };

        tokio::time::sleep(self.timing.menu_populate).await;
        if !self.doc.is_attached(menu).await? {
            debug!(%menu, "menu detached while populating");
            return Ok(false);
        }

        trigger.trigger_pick_item(menu, self.timing.item_timeout).await
    }
}

/// Text of the user-visible failure alert.
pub fn failure_message(err: &SnoozeError) -> String {
    format!("Snooze failed: {err}. Please use the snooze menu directly.")
}
