//! Error types for the snooze automation.

use thiserror::Error;

use crate::dom::NodeId;

/// Failures reported by a host document.
#[derive(Debug, Clone, Error)]
pub enum DomError {
    /// The handle does not refer to any node the host knows about.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The node exists but is no longer part of the document.
    #[error("Node {0} is detached from the document")]
    Detached(NodeId),

    /// The host backend failed (transport, script error, ...).
    #[error("Host error: {0}")]
    Host(String),

    /// The host document is gone.
    #[error("Host document closed")]
    Closed,
}

/// Typed failures of one automation run.
#[derive(Debug, Clone, Error)]
pub enum SnoozeError {
    /// The trigger step failed on every attempt.
    #[error("Could not open the date & time picker after {attempts} attempts")]
    TriggerExhausted { attempts: u32 },

    /// The date & time dialog never appeared, or vanished before use.
    #[error("Date & time dialog did not appear")]
    ModalNotFound,

    /// The dialog has no date input.
    #[error("Could not find the date input in the dialog")]
    DateInputMissing,

    /// The dialog has no time input.
    #[error("Could not find the time input in the dialog")]
    TimeInputMissing,

    /// The dialog has no submit control.
    #[error("Could not find the Save button in the dialog")]
    SubmitMissing,

    /// A host operation failed mid-step.
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl SnoozeError {
    /// Whether the error means the host UI did not have the expected shape.
    pub fn is_host_shape(&self) -> bool {
        matches!(
            self,
            SnoozeError::ModalNotFound
                | SnoozeError::DateInputMissing
                | SnoozeError::TimeInputMissing
                | SnoozeError::SubmitMissing
        )
    }
}
