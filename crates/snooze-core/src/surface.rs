//! Input surface.
//!
//! A text box injected at the top of the snooze menu. Typing updates a live
//! preview; Enter hands the parsed time to the [`Orchestrator`]; Escape or
//! losing focus removes the box.
//!
//! [`SurfaceState`] is the pure input state machine. [`InputSurface`] binds
//! it to the host document.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::dom::{ElementSpec, HostDocument, InsertPosition, Key, NodeId, SurfaceEvent, SurfaceEvents};
use crate::error::DomError;
use crate::locator::Selector;
use crate::orchestrator::{Orchestrator, RunOutcome};
use crate::parser::{DateParser, resolve_future};

/// Placeholder of the injected text box.
pub const PLACEHOLDER: &str = "Type a time... (e.g. 'next Tue 9am')";

/// Inline message for a commit that does not resolve to a future time.
pub const UNRESOLVED_MESSAGE: &str = "Couldn't find a future date in that";

/// `Sat, Jan 10, 2026 at 1:30 PM`
pub fn preview_text(resolved: &DateTime<Local>) -> String {
    resolved.format("%a, %b %-d, %Y at %-I:%M %p").to_string()
}

/// What the surface should do after an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceAction {
    /// Replace the preview line (`None` clears it).
    Preview(Option<String>),
    /// Show an inline error in the preview line.
    Error(String),
    /// Hand the target to the orchestrator and remove the surface.
    Commit(DateTime<Local>),
    /// Remove the surface without committing.
    Dismiss,
    /// Nothing to do.
    Ignore,
}

/// Input state of one surface.
#[derive(Debug, Default, Clone)]
pub struct SurfaceState {
    text: String,
    committing: bool,
}

impl SurfaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_committing(&self) -> bool {
        self.committing
    }

    /// Text changed: re-parse and refresh the preview. Unresolved text
    /// clears the preview without an error.
    pub fn on_changed(
        &mut self,
        value: String,
        parser: &dyn DateParser,
        now: DateTime<Local>,
    ) -> SurfaceAction {
        self.text = value;
        let preview = resolve_future(parser, &self.text, now).map(|c| preview_text(&c.resolved));
        SurfaceAction::Preview(preview)
    }

    /// A key was pressed.
    pub fn on_key(
        &mut self,
        key: &Key,
        parser: &dyn DateParser,
        now: DateTime<Local>,
    ) -> SurfaceAction {
        match key {
            Key::Enter => self.commit(parser, now),
            Key::Escape => SurfaceAction::Dismiss,
            Key::Other(_) => SurfaceAction::Ignore,
        }
    }

    /// Focus left the text box. Ignored once a commit is under way.
    pub fn on_blur(&self) -> SurfaceAction {
        if self.committing {
            SurfaceAction::Ignore
        } else {
            SurfaceAction::Dismiss
        }
    }

    fn commit(&mut self, parser: &dyn DateParser, now: DateTime<Local>) -> SurfaceAction {
        if self.committing || self.text.trim().is_empty() {
            return SurfaceAction::Ignore;
        }
        match resolve_future(parser, &self.text, now) {
            Some(candidate) => {
                self.committing = true;
                SurfaceAction::Commit(candidate.resolved)
            }
            None => SurfaceAction::Error(UNRESOLVED_MESSAGE.to_string()),
        }
    }
}

/// Why a surface went away.
#[derive(Debug)]
pub enum SurfaceExit {
    /// The user committed; carries the run outcome.
    Committed(RunOutcome),
    /// Escape or blur.
    Dismissed,
    /// The host removed the text box.
    Closed,
}

/// An injected surface: its nodes and its input stream.
#[derive(Debug)]
pub struct SurfaceHandle {
    pub menu: NodeId,
    pub container: NodeId,
    pub input: NodeId,
    pub preview: NodeId,
    events: SurfaceEvents,
}

/// Injects surfaces into menus and drives them.
pub struct InputSurface {
    orchestrator: Arc<Orchestrator>,
    parser: Arc<dyn DateParser>,
    clock: fn() -> DateTime<Local>,
}

impl InputSurface {
    pub fn new(orchestrator: Arc<Orchestrator>, parser: Arc<dyn DateParser>) -> Self {
        Self {
            orchestrator,
            parser,
            clock: Local::now,
        }
    }

    /// Use a fixed clock for "now".
    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    fn doc(&self) -> &dyn HostDocument {
        self.orchestrator.document().as_ref()
    }

    fn container_class(&self) -> String {
        format!("{}-container", self.orchestrator.locators().surface_class)
    }

    fn preview_class(&self) -> String {
        format!("{}-preview", self.orchestrator.locators().surface_class)
    }

    fn spec(&self) -> ElementSpec {
        let locators = self.orchestrator.locators();
        ElementSpec::new("div")
            .class(self.container_class())
            .child(
                ElementSpec::new("input")
                    .attr("type", "text")
                    .class(locators.surface_class.clone())
                    .attr("placeholder", PLACEHOLDER)
                    .attr("aria-label", "Snooze until"),
            )
            .child(ElementSpec::new("div").class(self.preview_class()))
    }

    /// Inject a surface at the top of `menu`.
    ///
    /// Returns `None` when a surface already exists in the document.
    pub async fn inject(&self, menu: NodeId) -> Result<Option<SurfaceHandle>, DomError> {
        let doc = self.doc();
        let locators = self.orchestrator.locators();
        if doc.query(None, &locators.surface()).await?.is_some() {
            debug!(%menu, "surface already present");
            return Ok(None);
        }

        let container = doc
            .insert(Some(menu), InsertPosition::First, self.spec())
            .await?;
        match self.bind(menu, container).await {
            Ok(handle) => {
                debug!(%menu, input = %handle.input, "surface injected");
                Ok(Some(handle))
            }
            Err(e) => {
                // A box nobody drives would block every later injection.
                if let Err(cleanup) = doc.remove(container).await {
                    debug!(error = %cleanup, "could not remove half-injected surface");
                }
                Err(e)
            }
        }
    }

    async fn bind(&self, menu: NodeId, container: NodeId) -> Result<SurfaceHandle, DomError> {
        let doc = self.doc();
        let input = doc
            .query(Some(container), &self.orchestrator.locators().surface())
            .await?
            .ok_or(DomError::Detached(container))?;
        let preview = doc
            .query(
                Some(container),
                &Selector::tag("div").class(self.preview_class()),
            )
            .await?
            .ok_or(DomError::Detached(container))?;

        let events = doc.surface_events(input).await?;
        doc.focus(input).await?;

        Ok(SurfaceHandle {
            menu,
            container,
            input,
            preview,
            events,
        })
    }

    /// Drive one surface until it commits, is dismissed, or disappears.
    pub async fn run(&self, mut handle: SurfaceHandle) -> Result<SurfaceExit, DomError> {
        let doc = self.doc();
        let mut state = SurfaceState::new();

        loop {
            let Some(event) = handle.events.next().await else {
                debug!(input = %handle.input, "surface closed by host");
                return Ok(SurfaceExit::Closed);
            };

            let now = (self.clock)();
            let action = match event {
                SurfaceEvent::Changed(value) => state.on_changed(value, self.parser.as_ref(), now),
                SurfaceEvent::Key(key) => state.on_key(&key, self.parser.as_ref(), now),
                SurfaceEvent::Blur => state.on_blur(),
            };

            match action {
                SurfaceAction::Preview(preview) => {
                    doc.set_text(handle.preview, preview.as_deref().unwrap_or(""))
                        .await?;
                }
                SurfaceAction::Error(message) => {
                    doc.set_text(handle.preview, &message).await?;
                }
                SurfaceAction::Commit(target) => {
                    info!(text = %state.text(), %target, "snooze committed");
                    let SurfaceHandle {
                        menu,
                        container,
                        events,
                        ..
                    } = handle;
                    drop(events);
                    // Claimed before the removal so watchers see the run as
                    // active once the surface leaves the menu.
                    let permit = self.orchestrator.try_begin();
                    // Out of the way before the host starts rebuilding the menu.
                    doc.remove(container).await?;
                    let Some(permit) = permit else {
                        debug!(%target, "run already in flight, commit dropped");
                        return Ok(SurfaceExit::Committed(RunOutcome::Skipped));
                    };
                    let outcome = self
                        .orchestrator
                        .run_with_permit(permit, target.naive_local(), Some(menu))
                        .await;
                    return Ok(SurfaceExit::Committed(outcome));
                }
                SurfaceAction::Dismiss => {
                    debug!(input = %handle.input, "surface dismissed");
                    doc.remove(handle.container).await?;
                    return Ok(SurfaceExit::Dismissed);
                }
                SurfaceAction::Ignore => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "surface_tests.rs"]
mod tests;
