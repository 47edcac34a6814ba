//! In-memory host document.
//!
//! A small element tree with mutation broadcasting, an event log and
//! scripted reactions ("when this element receives `mousedown`, insert that
//! subtree 200ms later"). It stands in for the mail client in tests and in
//! dry runs.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

use super::{
    ClickAction, ElementSpec, HostDocument, InsertPosition, MutationRecord, MutationSubscription,
    NodeId, SurfaceEvent, SurfaceEvents, SyntheticEvent,
};
use crate::error::DomError;
use crate::locator::Selector;

const ROOT: usize = 0;

/// What the document saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Dispatched { node: NodeId, event_type: String },
    NativeClick { node: NodeId },
    ValueSet { node: NodeId, value: String },
    Focused { node: NodeId },
    Inserted { node: NodeId },
    Removed { node: NodeId },
    Alert(String),
}

/// A scripted host response.
#[derive(Debug, Clone)]
pub enum Reaction {
    /// Insert a subtree under the first element matching `parent` (`None` = body).
    Insert {
        parent: Option<Selector>,
        position: InsertPosition,
        element: ElementSpec,
    },
    /// Remove the first element matching the selector.
    Remove(Selector),
    /// Run several reactions in order.
    Sequence(Vec<Reaction>),
}

struct Rule {
    selector: Selector,
    event_type: String,
    delay: Duration,
    reaction: Reaction,
    skip: usize,
    remaining: Option<usize>,
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    value: String,
    parent: Option<usize>,
    children: Vec<usize>,
    on_click: Option<ClickAction>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            text: String::new(),
            value: String::new(),
            parent: None,
            children: Vec::new(),
            on_click: None,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct ObserverEntry {
    id: u64,
    scope: Option<usize>,
    tx: mpsc::UnboundedSender<Vec<MutationRecord>>,
}

struct Tree {
    nodes: Vec<Element>,
}

impl Tree {
    fn get(&self, node: NodeId) -> Result<&Element, DomError> {
        usize::try_from(node.0)
            .ok()
            .and_then(|i| self.nodes.get(i))
            .ok_or(DomError::NodeNotFound(node))
    }

    fn get_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        usize::try_from(node.0)
            .ok()
            .and_then(|i| self.nodes.get_mut(i))
            .ok_or(DomError::NodeNotFound(node))
    }

    fn index(&self, node: NodeId) -> Result<usize, DomError> {
        self.get(node)?;
        Ok(node.0 as usize)
    }

    fn is_attached(&self, mut index: usize) -> bool {
        loop {
            if index == ROOT {
                return true;
            }
            match self.nodes[index].parent {
                Some(parent) => index = parent,
                None => return false,
            }
        }
    }

    /// `ancestor` is `index` itself or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: usize, mut index: usize) -> bool {
        loop {
            if index == ancestor {
                return true;
            }
            match self.nodes[index].parent {
                Some(parent) => index = parent,
                None => return false,
            }
        }
    }

    fn descendants(&self, index: usize, out: &mut Vec<usize>) {
        for &child in &self.nodes[index].children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn matches(&self, index: usize, selector: &Selector) -> bool {
        let element = &self.nodes[index];
        selector.matches(&element.tag, |name| element.attr(name))
    }

    fn select(&self, scope: usize, selector: &Selector) -> Vec<usize> {
        let mut all = Vec::new();
        self.descendants(scope, &mut all);
        all.into_iter()
            .filter(|&i| self.matches(i, selector))
            .collect()
    }

    fn text_content(&self, index: usize) -> String {
        let element = &self.nodes[index];
        let mut text = element.text.clone();
        for &child in &element.children {
            text.push_str(&self.text_content(child));
        }
        text
    }

    fn build(&mut self, spec: &ElementSpec) -> usize {
        let mut element = Element::new(&spec.tag);
        element.attrs = spec.attributes.clone();
        element.text = spec.text.clone().unwrap_or_default();
        element.value = spec.get_attr("value").unwrap_or_default().to_string();
        element.on_click = spec.on_click.clone();
        let index = self.nodes.len();
        self.nodes.push(element);
        for child in &spec.children {
            let child_index = self.build(child);
            self.nodes[child_index].parent = Some(index);
            self.nodes[index].children.push(child_index);
        }
        index
    }

    fn attach(&mut self, parent: usize, child: usize, position: InsertPosition) {
        self.nodes[child].parent = Some(parent);
        match position {
            InsertPosition::First => self.nodes[parent].children.insert(0, child),
            InsertPosition::Last => self.nodes[parent].children.push(child),
        }
    }

    fn detach(&mut self, index: usize) -> Option<usize> {
        let parent = self.nodes[index].parent.take()?;
        self.nodes[parent].children.retain(|&c| c != index);
        Some(parent)
    }

    fn closest_with_class(&self, mut index: usize, class: &str) -> Option<usize> {
        loop {
            let has_class = self.nodes[index]
                .attr("class")
                .is_some_and(|c| c.split_whitespace().any(|w| w == class));
            if has_class {
                return Some(index);
            }
            index = self.nodes[index].parent?;
        }
    }
}

struct Shared {
    tree: Mutex<Tree>,
    observers: Mutex<Vec<ObserverEntry>>,
    surfaces: Mutex<HashMap<usize, mpsc::UnboundedSender<SurfaceEvent>>>,
    rules: Mutex<Vec<Rule>>,
    log: Mutex<Vec<Recorded>>,
    url: Mutex<String>,
    next_observer: AtomicU64,
    remove_latency: Mutex<Duration>,
    faults: Mutex<HashMap<&'static str, VecDeque<DomError>>>,
}

/// In-memory [`HostDocument`]. Cloning yields another handle to the same
/// document.
#[derive(Clone)]
pub struct MemoryDocument {
    shared: Arc<Shared>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty document (just a body).
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tree: Mutex::new(Tree {
                    nodes: vec![Element::new("body")],
                }),
                observers: Mutex::new(Vec::new()),
                surfaces: Mutex::new(HashMap::new()),
                rules: Mutex::new(Vec::new()),
                log: Mutex::new(Vec::new()),
                url: Mutex::new("https://mail.google.com/mail/u/0/#inbox".to_string()),
                next_observer: AtomicU64::new(1),
                remove_latency: Mutex::new(Duration::ZERO),
                faults: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The body element.
    pub fn body(&self) -> NodeId {
        NodeId(ROOT as i64)
    }

    /// Set the page URL reported by [`HostDocument::location`].
    pub fn set_url(&self, url: impl Into<String>) {
        *self.shared.url.lock() = url.into();
    }

    /// Delay [`HostDocument::remove`] replies by `latency`. The node is
    /// detached (and observers notified) before the delay, as a remote page
    /// mutates before its reply arrives.
    pub fn set_remove_latency(&self, latency: Duration) {
        *self.shared.remove_latency.lock() = latency;
    }

    /// Make the next call of `operation` (`"insert"`, `"focus"` or
    /// `"surface_events"`) fail with `err`.
    pub fn fail_next(&self, operation: &'static str, err: DomError) {
        self.shared
            .faults
            .lock()
            .entry(operation)
            .or_default()
            .push_back(err);
    }

    fn fault(&self, operation: &str) -> Result<(), DomError> {
        match self
            .shared
            .faults
            .lock()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Insert a subtree synchronously and notify observers.
    pub fn append(
        &self,
        parent: Option<NodeId>,
        position: InsertPosition,
        spec: &ElementSpec,
    ) -> Result<NodeId, DomError> {
        let (node, parent_index) = {
            let mut tree = self.shared.tree.lock();
            let parent_index = match parent {
                Some(p) => tree.index(p)?,
                None => ROOT,
            };
            let index = tree.build(spec);
            tree.attach(parent_index, index, position);
            (NodeId(index as i64), parent_index)
        };
        self.record(Recorded::Inserted { node });
        self.notify(
            parent_index,
            MutationRecord::ChildList {
                target: NodeId(parent_index as i64),
            },
        );
        Ok(node)
    }

    /// Detach a node synchronously. Already detached nodes are ignored.
    pub fn detach(&self, node: NodeId) -> Result<(), DomError> {
        let (parent, removed) = {
            let mut tree = self.shared.tree.lock();
            let index = tree.index(node)?;
            if index == ROOT {
                return Err(DomError::Host("cannot remove the body".to_string()));
            }
            let Some(parent) = tree.detach(index) else {
                return Ok(());
            };
            let mut removed = vec![index];
            tree.descendants(index, &mut removed);
            (parent, removed)
        };
        {
            // A removed text box delivers no more input.
            let mut surfaces = self.shared.surfaces.lock();
            for index in removed {
                surfaces.remove(&index);
            }
        }
        self.record(Recorded::Removed { node });
        self.notify(
            parent,
            MutationRecord::ChildList {
                target: NodeId(parent as i64),
            },
        );
        Ok(())
    }

    /// First attached element matching the selector.
    pub fn find(&self, selector: &Selector) -> Option<NodeId> {
        let tree = self.shared.tree.lock();
        tree.select(ROOT, selector)
            .first()
            .map(|&i| NodeId(i as i64))
    }

    /// Number of attached elements matching the selector.
    pub fn count(&self, selector: &Selector) -> usize {
        self.shared.tree.lock().select(ROOT, selector).len()
    }

    /// Attribute value of a node.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let tree = self.shared.tree.lock();
        tree.get(node).ok()?.attr(name).map(str::to_string)
    }

    /// Current value of a node, ignoring unknown handles.
    pub fn current_value(&self, node: NodeId) -> Option<String> {
        let tree = self.shared.tree.lock();
        tree.get(node).ok().map(|e| e.value.clone())
    }

    /// Own text plus descendant text, ignoring unknown handles.
    pub fn text_of(&self, node: NodeId) -> Option<String> {
        let tree = self.shared.tree.lock();
        let index = tree.index(node).ok()?;
        Some(tree.text_content(index))
    }

    /// Register a scripted reaction to an event on matching elements.
    ///
    /// A native `click()` counts as a `click` event.
    pub fn on_event(
        &self,
        selector: Selector,
        event_type: &str,
        delay: Duration,
        reaction: Reaction,
    ) {
        self.push_rule(selector, event_type, delay, reaction, 0, None);
    }

    /// Like [`on_event`](Self::on_event) but fires at most `times` times.
    pub fn on_event_times(
        &self,
        selector: Selector,
        event_type: &str,
        delay: Duration,
        reaction: Reaction,
        times: usize,
    ) {
        self.push_rule(selector, event_type, delay, reaction, 0, Some(times));
    }

    /// Like [`on_event`](Self::on_event) but ignores the first `skip` matches.
    pub fn on_event_after(
        &self,
        selector: Selector,
        event_type: &str,
        delay: Duration,
        reaction: Reaction,
        skip: usize,
    ) {
        self.push_rule(selector, event_type, delay, reaction, skip, None);
    }

    fn push_rule(
        &self,
        selector: Selector,
        event_type: &str,
        delay: Duration,
        reaction: Reaction,
        skip: usize,
        remaining: Option<usize>,
    ) {
        self.shared.rules.lock().push(Rule {
            selector,
            event_type: event_type.to_string(),
            delay,
            reaction,
            skip,
            remaining,
        });
    }

    /// Deliver user input to an injected text box.
    ///
    /// Returns `false` when nothing listens on that node.
    pub fn emit(&self, node: NodeId, event: SurfaceEvent) -> bool {
        if let SurfaceEvent::Changed(ref value) = event {
            if let Ok(element) = self.shared.tree.lock().get_mut(node) {
                element.value = value.clone();
            }
        }
        let Ok(index) = usize::try_from(node.0) else {
            return false;
        };
        match self.shared.surfaces.lock().get(&index) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Whether someone listens for input on the node.
    pub fn has_surface_listener(&self, node: NodeId) -> bool {
        usize::try_from(node.0)
            .map(|i| self.shared.surfaces.lock().contains_key(&i))
            .unwrap_or(false)
    }

    /// Everything recorded so far.
    pub fn log(&self) -> Vec<Recorded> {
        self.shared.log.lock().clone()
    }

    /// Number of `event_type` dispatches (synthetic or native) on matching elements.
    pub fn activations(&self, selector: &Selector, event_type: &str) -> usize {
        let log = self.shared.log.lock().clone();
        let tree = self.shared.tree.lock();
        log.iter()
            .filter(|entry| match entry {
                Recorded::Dispatched { node, event_type: t } => {
                    t == event_type && tree.matches(node.0 as usize, selector)
                }
                Recorded::NativeClick { node } => {
                    event_type == "native-click" && tree.matches(node.0 as usize, selector)
                }
                _ => false,
            })
            .count()
    }

    /// Alerts shown so far.
    pub fn alerts(&self) -> Vec<String> {
        self.shared
            .log
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                Recorded::Alert(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, entry: Recorded) {
        trace!(?entry, "memory document");
        self.shared.log.lock().push(entry);
    }

    fn notify(&self, target: usize, record: MutationRecord) {
        let recipients: Vec<mpsc::UnboundedSender<Vec<MutationRecord>>> = {
            let tree = self.shared.tree.lock();
            let observers = self.shared.observers.lock();
            observers
                .iter()
                .filter(|o| match o.scope {
                    None => true,
                    Some(scope) => tree.is_inclusive_ancestor(scope, target),
                })
                .map(|o| o.tx.clone())
                .collect()
        };
        for tx in recipients {
            let _ = tx.send(vec![record.clone()]);
        }
    }

    fn fire(&self, node: NodeId, event_type: &str) {
        let mut due = Vec::new();
        {
            let tree = self.shared.tree.lock();
            let Ok(index) = tree.index(node) else {
                return;
            };
            let mut rules = self.shared.rules.lock();
            for rule in rules.iter_mut() {
                if rule.event_type != event_type || !tree.matches(index, &rule.selector) {
                    continue;
                }
                if rule.skip > 0 {
                    rule.skip -= 1;
                    continue;
                }
                if let Some(ref mut remaining) = rule.remaining {
                    if *remaining == 0 {
                        continue;
                    }
                    *remaining -= 1;
                }
                due.push((rule.delay, rule.reaction.clone()));
            }
        }

        for (delay, reaction) in due {
            if delay.is_zero() {
                self.react(&reaction);
            } else {
                let weak: Weak<Shared> = Arc::downgrade(&self.shared);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(shared) = weak.upgrade() {
                        MemoryDocument { shared }.react(&reaction);
                    }
                });
            }
        }
    }

    fn react(&self, reaction: &Reaction) {
        match reaction {
            Reaction::Insert {
                parent,
                position,
                element,
            } => {
                let parent = match parent {
                    Some(selector) => match self.find(selector) {
                        Some(node) => Some(node),
                        None => return,
                    },
                    None => None,
                };
                let _ = self.append(parent, *position, element);
            }
            Reaction::Remove(selector) => {
                if let Some(node) = self.find(selector) {
                    let _ = self.detach(node);
                }
            }
            Reaction::Sequence(steps) => {
                for step in steps {
                    self.react(step);
                }
            }
        }
    }

    fn run_click_action(&self, node: NodeId) {
        let target = {
            let tree = self.shared.tree.lock();
            let Ok(index) = tree.index(node) else {
                return;
            };
            match tree.nodes[index].on_click {
                Some(ClickAction::RemoveClosest(ref class)) => tree.closest_with_class(index, class),
                None => None,
            }
        };
        if let Some(index) = target {
            let _ = self.detach(NodeId(index as i64));
        }
    }
}

#[async_trait]
impl HostDocument for MemoryDocument {
    async fn query(
        &self,
        scope: Option<NodeId>,
        selector: &Selector,
    ) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_all(scope, selector).await?.into_iter().next())
    }

    async fn query_all(
        &self,
        scope: Option<NodeId>,
        selector: &Selector,
    ) -> Result<Vec<NodeId>, DomError> {
        let tree = self.shared.tree.lock();
        let scope = match scope {
            Some(node) => tree.index(node)?,
            None => ROOT,
        };
        Ok(tree
            .select(scope, selector)
            .into_iter()
            .map(|i| NodeId(i as i64))
            .collect())
    }

    async fn text_content(&self, node: NodeId) -> Result<String, DomError> {
        let tree = self.shared.tree.lock();
        let index = tree.index(node)?;
        Ok(tree.text_content(index))
    }

    async fn value(&self, node: NodeId) -> Result<String, DomError> {
        Ok(self.shared.tree.lock().get(node)?.value.clone())
    }

    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.shared.tree.lock().get_mut(node)?.value = value.to_string();
        self.record(Recorded::ValueSet {
            node,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn focus(&self, node: NodeId) -> Result<(), DomError> {
        self.fault("focus")?;
        self.shared.tree.lock().get(node)?;
        self.record(Recorded::Focused { node });
        Ok(())
    }

    async fn dispatch(&self, node: NodeId, event: SyntheticEvent) -> Result<(), DomError> {
        self.shared.tree.lock().get(node)?;
        self.record(Recorded::Dispatched {
            node,
            event_type: event.event_type.to_string(),
        });
        if event.event_type == "click" {
            self.run_click_action(node);
        }
        self.fire(node, event.event_type);
        Ok(())
    }

    async fn native_click(&self, node: NodeId) -> Result<(), DomError> {
        self.shared.tree.lock().get(node)?;
        self.record(Recorded::NativeClick { node });
        self.run_click_action(node);
        self.fire(node, "click");
        Ok(())
    }

    async fn is_attached(&self, node: NodeId) -> Result<bool, DomError> {
        let tree = self.shared.tree.lock();
        let index = tree.index(node)?;
        Ok(tree.is_attached(index))
    }

    async fn observe(&self, scope: Option<NodeId>) -> Result<MutationSubscription, DomError> {
        let scope = match scope {
            Some(node) => Some(self.shared.tree.lock().index(node)?),
            None => None,
        };
        let id = self.shared.next_observer.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared
            .observers
            .lock()
            .push(ObserverEntry { id, scope, tx });

        let weak = Arc::downgrade(&self.shared);
        Ok(MutationSubscription::new(rx, move || {
            if let Some(shared) = weak.upgrade() {
                shared.observers.lock().retain(|o| o.id != id);
            }
        }))
    }

    async fn insert(
        &self,
        parent: Option<NodeId>,
        position: InsertPosition,
        element: ElementSpec,
    ) -> Result<NodeId, DomError> {
        self.fault("insert")?;
        self.append(parent, position, &element)
    }

    async fn remove(&self, node: NodeId) -> Result<(), DomError> {
        self.detach(node)?;
        let latency = *self.shared.remove_latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }

    async fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.shared.tree.lock().get_mut(node)?.text = text.to_string();
        self.notify(node.0 as usize, MutationRecord::CharacterData { target: node });
        Ok(())
    }

    async fn surface_events(&self, node: NodeId) -> Result<SurfaceEvents, DomError> {
        self.fault("surface_events")?;
        let index = self.shared.tree.lock().index(node)?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.surfaces.lock().insert(index, tx);
        let weak = Arc::downgrade(&self.shared);
        Ok(SurfaceEvents::new(rx, move || {
            if let Some(shared) = weak.upgrade() {
                shared.surfaces.lock().remove(&index);
            }
        }))
    }

    async fn location(&self) -> Result<String, DomError> {
        Ok(self.shared.url.lock().clone())
    }

    async fn alert(&self, message: &str) -> Result<(), DomError> {
        self.record(Recorded::Alert(message.to_string()));
        Ok(())
    }

    fn active_observers(&self) -> usize {
        self.shared.observers.lock().len()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
