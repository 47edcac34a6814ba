//! [`HostDocument`] backed by a live browser tab.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use snooze_core::dom::{
    ElementSpec, InsertPosition, MutationRecord, MutationSubscription, SurfaceEvent, SurfaceEvents,
    SyntheticEvent,
};
use snooze_core::{DomError, HostDocument, NodeId, Selector};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::bridge::{self, BridgeEvent, BridgeFailure, RawMutation};
use crate::cdp::{BINDING_CALLED, BindingCalled, CONTEXTS_CLEARED, CdpError, CdpResponse, PageSession};

/// Where page events are delivered.
#[derive(Default)]
struct Routes {
    observers: HashMap<u64, mpsc::UnboundedSender<Vec<MutationRecord>>>,
    surfaces: HashMap<i64, mpsc::UnboundedSender<SurfaceEvent>>,
}

impl Routes {
    fn clear(&mut self) {
        self.observers.clear();
        self.surfaces.clear();
    }
}

/// Page-side registrations to undo once their Rust handle is dropped.
#[derive(Debug)]
enum Release {
    Observer(u64),
    Surface(i64),
}

struct Inner {
    session: Arc<PageSession>,
    routes: Mutex<Routes>,
    release_tx: mpsc::UnboundedSender<Release>,
    next_observer: AtomicU64,
    closed: AtomicBool,
}

impl Inner {
    async fn call(&self, method: &str, args: &[Value]) -> Result<Value, DomError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DomError::Closed);
        }
        let expression = bridge::call_expression(method, args);
        let reply = bridge::parse_reply(self.session.evaluate(&expression).await?);
        let reply = match reply {
            Err(BridgeFailure::NotInstalled) => {
                debug!("bridge missing, reinstalling");
                self.session.evaluate(bridge::script()).await?;
                bridge::parse_reply(self.session.evaluate(&expression).await?)
            }
            other => other,
        };
        reply.map_err(|failure| match failure {
            BridgeFailure::UnknownNode(id) => DomError::NodeNotFound(NodeId(id)),
            BridgeFailure::NotInstalled => DomError::Host("bridge could not be installed".to_string()),
            BridgeFailure::Script(message) => DomError::Host(message),
        })
    }

    fn route(&self, event: BridgeEvent) {
        let mut routes = self.routes.lock();
        if let Some((node, input)) = event.surface_event() {
            if let Some(tx) = routes.surfaces.get(&node) {
                let _ = tx.send(input);
            }
            return;
        }
        match event {
            BridgeEvent::Mutation { observer, records } => {
                let records: Vec<MutationRecord> =
                    records.into_iter().filter_map(RawMutation::into_record).collect();
                if let Some(tx) = routes.observers.get(&observer) {
                    let _ = tx.send(records);
                }
            }
            BridgeEvent::Detached { node } => {
                // Closing the channel ends the surface's event stream.
                routes.surfaces.remove(&node);
            }
            _ => {}
        }
    }
}

/// A mail tab seen through the page bridge.
///
/// Node ids are issued by the bridge and stay valid while the element is
/// alive. A navigation clears every subscription; node ids from the old
/// document then report [`DomError::NodeNotFound`].
pub struct CdpDocument {
    inner: Arc<Inner>,
    pump: JoinHandle<()>,
}

impl CdpDocument {
    /// Install the bridge in `session`'s page and start routing its events.
    pub async fn attach(session: Arc<PageSession>) -> Result<Self, CdpError> {
        let events = session
            .take_events()
            .ok_or_else(|| CdpError::InvalidResponse("session events already taken".to_string()))?;

        session.add_binding(bridge::BINDING).await?;
        session.add_script_on_new_document(bridge::script()).await?;
        session.evaluate(bridge::script()).await?;

        let (release_tx, release_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            session,
            routes: Mutex::new(Routes::default()),
            release_tx,
            next_observer: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });
        let pump = tokio::spawn(Self::pump(Arc::downgrade(&inner), events, release_rx));
        debug!(target_id = inner.session.target_id(), "bridge attached");

        Ok(Self { inner, pump })
    }

    /// The underlying page session.
    pub fn session(&self) -> &Arc<PageSession> {
        &self.inner.session
    }

    async fn pump(
        inner: std::sync::Weak<Inner>,
        mut events: mpsc::UnboundedReceiver<CdpResponse>,
        mut releases: mpsc::UnboundedReceiver<Release>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(inner) = inner.upgrade() else { break };
                    let Some(event) = event else {
                        debug!("page session ended");
                        inner.closed.store(true, Ordering::SeqCst);
                        inner.routes.lock().clear();
                        break;
                    };
                    Self::handle_event(&inner, event);
                }
                Some(release) = releases.recv() => {
                    let Some(inner) = inner.upgrade() else { break };
                    let result = match release {
                        Release::Observer(id) => inner.call("unobserve", &[json!(id)]).await,
                        Release::Surface(node) => inner.call("unlisten", &[json!(node)]).await,
                    };
                    if let Err(e) = result {
                        debug!(error = %e, "page-side release failed");
                    }
                }
            }
        }
    }

    fn handle_event(inner: &Inner, event: CdpResponse) {
        if event.is_event(CONTEXTS_CLEARED) {
            debug!("page navigated, dropping subscriptions");
            inner.routes.lock().clear();
            return;
        }
        if !event.is_event(BINDING_CALLED) {
            return;
        }
        let Some(params) = event.params else {
            return;
        };
        let called: BindingCalled = match serde_json::from_value(params) {
            Ok(called) => called,
            Err(e) => {
                warn!("malformed binding event: {}", e);
                return;
            }
        };
        if called.name != bridge::BINDING {
            return;
        }
        trace!(payload = %called.payload, "bridge event");
        match BridgeEvent::parse(&called.payload) {
            Ok(event) => inner.route(event),
            Err(e) => warn!("malformed bridge payload: {}", e),
        }
    }
}

impl Drop for CdpDocument {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

fn node_id(value: Value) -> Result<Option<NodeId>, DomError> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_i64()
            .map(|id| Some(NodeId(id)))
            .ok_or_else(|| DomError::Host(format!("expected a node id, got {}", other))),
    }
}

fn string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        _ => String::new(),
    }
}

#[async_trait]
impl HostDocument for CdpDocument {
    async fn query(
        &self,
        scope: Option<NodeId>,
        selector: &Selector,
    ) -> Result<Option<NodeId>, DomError> {
        let args = [bridge::node_arg(scope), json!(selector.to_css()), json!(false)];
        node_id(self.inner.call("query", &args).await?)
    }

    async fn query_all(
        &self,
        scope: Option<NodeId>,
        selector: &Selector,
    ) -> Result<Vec<NodeId>, DomError> {
        let args = [bridge::node_arg(scope), json!(selector.to_css()), json!(true)];
        match self.inner.call("query", &args).await? {
            Value::Array(ids) => ids
                .into_iter()
                .filter_map(|id| node_id(id).transpose())
                .collect(),
            other => Err(DomError::Host(format!("expected node ids, got {}", other))),
        }
    }

    async fn text_content(&self, node: NodeId) -> Result<String, DomError> {
        Ok(string(self.inner.call("text", &[json!(node.0)]).await?))
    }

    async fn value(&self, node: NodeId) -> Result<String, DomError> {
        Ok(string(self.inner.call("value", &[json!(node.0)]).await?))
    }

    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.inner.call("setValue", &[json!(node.0), json!(value)]).await?;
        Ok(())
    }

    async fn focus(&self, node: NodeId) -> Result<(), DomError> {
        self.inner.call("focus", &[json!(node.0)]).await?;
        Ok(())
    }

    async fn dispatch(&self, node: NodeId, event: SyntheticEvent) -> Result<(), DomError> {
        let args = [
            json!(node.0),
            json!(event.kind),
            json!(event.event_type),
            json!(event.cancelable),
        ];
        self.inner.call("dispatch", &args).await?;
        Ok(())
    }

    async fn native_click(&self, node: NodeId) -> Result<(), DomError> {
        self.inner.call("click", &[json!(node.0)]).await?;
        Ok(())
    }

    async fn is_attached(&self, node: NodeId) -> Result<bool, DomError> {
        let attached = self.inner.call("attached", &[json!(node.0)]).await?;
        Ok(attached.as_bool().unwrap_or(false))
    }

    async fn observe(&self, scope: Option<NodeId>) -> Result<MutationSubscription, DomError> {
        let id = self.inner.next_observer.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.routes.lock().observers.insert(id, tx);

        if let Err(e) = self.inner.call("observe", &[json!(id), bridge::node_arg(scope)]).await {
            self.inner.routes.lock().observers.remove(&id);
            return Err(e);
        }

        let weak = Arc::downgrade(&self.inner);
        Ok(MutationSubscription::new(rx, move || {
            if let Some(inner) = weak.upgrade() {
                inner.routes.lock().observers.remove(&id);
                let _ = inner.release_tx.send(Release::Observer(id));
            }
        }))
    }

    async fn insert(
        &self,
        parent: Option<NodeId>,
        position: InsertPosition,
        element: ElementSpec,
    ) -> Result<NodeId, DomError> {
        let spec = serde_json::to_value(&element).map_err(|e| DomError::Host(e.to_string()))?;
        let args = [bridge::node_arg(parent), json!(position), spec];
        node_id(self.inner.call("insert", &args).await?)?
            .ok_or_else(|| DomError::Host("insert returned no element".to_string()))
    }

    async fn remove(&self, node: NodeId) -> Result<(), DomError> {
        match self.inner.call("remove", &[json!(node.0)]).await {
            // Collected elements are as gone as detached ones.
            Ok(_) | Err(DomError::NodeNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.inner.call("setText", &[json!(node.0), json!(text)]).await?;
        Ok(())
    }

    async fn surface_events(&self, node: NodeId) -> Result<SurfaceEvents, DomError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.routes.lock().surfaces.insert(node.0, tx);

        if let Err(e) = self.inner.call("listen", &[json!(node.0)]).await {
            self.inner.routes.lock().surfaces.remove(&node.0);
            return Err(e);
        }

        let weak = Arc::downgrade(&self.inner);
        Ok(SurfaceEvents::new(rx, move || {
            if let Some(inner) = weak.upgrade() {
                inner.routes.lock().surfaces.remove(&node.0);
                let _ = inner.release_tx.send(Release::Surface(node.0));
            }
        }))
    }

    async fn location(&self) -> Result<String, DomError> {
        Ok(string(self.inner.call("location", &[]).await?))
    }

    async fn alert(&self, message: &str) -> Result<(), DomError> {
        self.inner.call("alert", &[json!(message)]).await?;
        Ok(())
    }

    fn active_observers(&self) -> usize {
        self.inner.routes.lock().observers.len()
    }
}
