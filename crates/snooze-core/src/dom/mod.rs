//! Host document abstraction.
//!
//! The automation never touches a browser API directly. Everything goes
//! through [`HostDocument`], which a live browser tab (see the `snooze-cdp`
//! crate) or the in-memory [`memory::MemoryDocument`] implement.
//!
//! Node handles are borrowed references into a DOM owned by the host UI. The
//! host may destroy a node at any time, so callers re-check
//! [`HostDocument::is_attached`] before using a handle across a suspension
//! point.

mod events;
pub mod fixture;
pub mod memory;
mod subscription;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomError;
use crate::locator::Selector;

pub use events::{ClickAction, ElementSpec, EventKind, InsertPosition, Key, SurfaceEvent, SyntheticEvent};
pub use subscription::{MutationRecord, MutationSubscription, SurfaceEvents};

/// Opaque handle to a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The host UI's document, as seen by the automation.
///
/// `scope = None` means the whole document. Query results are in document
/// order.
#[async_trait]
pub trait HostDocument: Send + Sync {
    /// First element under `scope` matching `selector`.
    async fn query(
        &self,
        scope: Option<NodeId>,
        selector: &Selector,
    ) -> Result<Option<NodeId>, DomError>;

    /// All elements under `scope` matching `selector`.
    async fn query_all(
        &self,
        scope: Option<NodeId>,
        selector: &Selector,
    ) -> Result<Vec<NodeId>, DomError>;

    /// Concatenated text of the element and its descendants.
    async fn text_content(&self, node: NodeId) -> Result<String, DomError>;

    /// Current value of an input element.
    async fn value(&self, node: NodeId) -> Result<String, DomError>;

    /// Assign an input element's value. Dispatches no events.
    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError>;

    /// Move keyboard focus to the element.
    async fn focus(&self, node: NodeId) -> Result<(), DomError>;

    /// Dispatch one synthetic event on the element.
    async fn dispatch(&self, node: NodeId, event: SyntheticEvent) -> Result<(), DomError>;

    /// Call the element's native `click()`.
    async fn native_click(&self, node: NodeId) -> Result<(), DomError>;

    /// Whether the element is still part of the document.
    async fn is_attached(&self, node: NodeId) -> Result<bool, DomError>;

    /// Subscribe to mutation batches under `scope` (subtree).
    ///
    /// Dropping the returned subscription unregisters it.
    async fn observe(&self, scope: Option<NodeId>) -> Result<MutationSubscription, DomError>;

    /// Create an element tree and insert it under `parent` (`None` = body).
    async fn insert(
        &self,
        parent: Option<NodeId>,
        position: InsertPosition,
        element: ElementSpec,
    ) -> Result<NodeId, DomError>;

    /// Detach an element. Removing an already detached element is a no-op.
    async fn remove(&self, node: NodeId) -> Result<(), DomError>;

    /// Replace the element's text.
    async fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError>;

    /// Stream of user input on an injected text box.
    async fn surface_events(&self, node: NodeId) -> Result<SurfaceEvents, DomError>;

    /// URL of the page the document belongs to.
    async fn location(&self) -> Result<String, DomError>;

    /// Show a blocking alert to the user.
    async fn alert(&self, message: &str) -> Result<(), DomError>;

    /// Number of live mutation subscriptions.
    fn active_observers(&self) -> usize;
}
