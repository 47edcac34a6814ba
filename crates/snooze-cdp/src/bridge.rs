//! Page-side bridge: the embedded script, call expressions and wire types.
//!
//! Every [`HostDocument`](snooze_core::HostDocument) operation becomes one
//! `Runtime.evaluate` of `window.__snoozeNl.call(method, args)`. Events flow
//! back through a `Runtime.addBinding` binding as JSON payloads.

use serde::Deserialize;
use serde_json::Value;
use snooze_core::NodeId;
use snooze_core::dom::{Key, MutationRecord, SurfaceEvent};

/// Name of the page binding events are emitted through.
pub(crate) const BINDING: &str = "__snoozeNlEmit";

/// The bridge script. Installing it twice is a no-op.
pub(crate) fn script() -> &'static str {
    include_str!("bridge.js")
}

/// Expression invoking one bridge method.
///
/// Arguments are embedded as JSON literals; evaluates to a `no-bridge`
/// error when the page has not loaded the bridge yet.
pub(crate) fn call_expression(method: &str, args: &[Value]) -> String {
    let method = Value::String(method.to_string());
    let args = Value::Array(args.to_vec());
    format!(
        "(window.__snoozeNl ? window.__snoozeNl.call({}, {}) : {{\"error\": \"no-bridge\"}})",
        method, args
    )
}

/// JSON for an optional node handle.
pub(crate) fn node_arg(node: Option<NodeId>) -> Value {
    node.map_or(Value::Null, |n| Value::from(n.0))
}

/// Why a bridge call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BridgeFailure {
    /// The page has no bridge (fresh document).
    NotInstalled,
    /// The id was never issued or its element was garbage collected.
    UnknownNode(i64),
    /// The method threw.
    Script(String),
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    ok: Value,
    error: Option<String>,
    message: Option<String>,
    node: Option<i64>,
}

/// Decode the value a bridge call evaluated to.
pub(crate) fn parse_reply(value: Value) -> Result<Value, BridgeFailure> {
    let reply: RawReply = serde_json::from_value(value)
        .map_err(|e| BridgeFailure::Script(format!("malformed bridge reply: {}", e)))?;
    match reply.error.as_deref() {
        None => Ok(reply.ok),
        Some("no-bridge") => Err(BridgeFailure::NotInstalled),
        Some("unknown-node") => Err(BridgeFailure::UnknownNode(reply.node.unwrap_or_default())),
        Some(other) => Err(BridgeFailure::Script(
            reply.message.unwrap_or_else(|| other.to_string()),
        )),
    }
}

/// One record of a page-side mutation batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMutation {
    #[serde(rename = "type")]
    kind: String,
    target: Option<i64>,
    attribute_name: Option<String>,
}

impl RawMutation {
    /// `None` for unknown kinds and for targets the page never issued an
    /// id for. The batch itself is still delivered.
    pub(crate) fn into_record(self) -> Option<MutationRecord> {
        let target = NodeId(self.target?);
        match self.kind.as_str() {
            "childList" => Some(MutationRecord::ChildList { target }),
            "attributes" => Some(MutationRecord::Attributes {
                target,
                name: self.attribute_name.unwrap_or_default(),
            }),
            "characterData" => Some(MutationRecord::CharacterData { target }),
            _ => None,
        }
    }
}

/// An event emitted by the page.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum BridgeEvent {
    Mutation { observer: u64, records: Vec<RawMutation> },
    Input { node: i64, value: String },
    Keydown { node: i64, key: String },
    Blur { node: i64 },
    /// An injected text box left the document.
    Detached { node: i64 },
}

impl BridgeEvent {
    pub(crate) fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// The surface input this event carries, if it is one.
    pub(crate) fn surface_event(&self) -> Option<(i64, SurfaceEvent)> {
        match self {
            BridgeEvent::Input { node, value } => Some((*node, SurfaceEvent::Changed(value.clone()))),
            BridgeEvent::Keydown { node, key } => Some((*node, SurfaceEvent::Key(Key::from_dom(key)))),
            BridgeEvent::Blur { node } => Some((*node, SurfaceEvent::Blur)),
            BridgeEvent::Mutation { .. } | BridgeEvent::Detached { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use snooze_core::dom::{ClickAction, ElementSpec, InsertPosition, SyntheticEvent};

    #[test]
    fn test_call_expression_embeds_json_arguments() {
        let expr = call_expression("query", &[Value::Null, json!(r#"div[aria-label="Snooze"]"#), json!(false)]);
        assert_eq!(
            expr,
            r#"(window.__snoozeNl ? window.__snoozeNl.call("query", [null,"div[aria-label=\"Snooze\"]",false]) : {"error": "no-bridge"})"#
        );
    }

    #[test]
    fn test_call_expression_escapes_text() {
        let expr = call_expression("setText", &[json!(4), json!("it's \"quoted\"\n</script>")]);
        assert!(expr.contains(r#"[4,"it's \"quoted\"\n</script>"]"#));
    }

    #[test]
    fn test_node_arg() {
        assert_eq!(node_arg(None), Value::Null);
        assert_eq!(node_arg(Some(NodeId(12))), json!(12));
    }

    #[test]
    fn test_parse_reply_ok() {
        assert_eq!(parse_reply(json!({"ok": [1, 2]})), Ok(json!([1, 2])));
        assert_eq!(parse_reply(json!({"ok": null})), Ok(Value::Null));
    }

    #[test]
    fn test_parse_reply_failures() {
        assert_eq!(
            parse_reply(json!({"error": "no-bridge"})),
            Err(BridgeFailure::NotInstalled)
        );
        assert_eq!(
            parse_reply(json!({"error": "unknown-node", "node": 9})),
            Err(BridgeFailure::UnknownNode(9))
        );
        assert_eq!(
            parse_reply(json!({"error": "script", "message": "boom"})),
            Err(BridgeFailure::Script("boom".to_string()))
        );
        assert!(matches!(parse_reply(json!(42)), Err(BridgeFailure::Script(_))));
    }

    #[test]
    fn test_mutation_event() {
        let payload = r#"{"kind":"mutation","observer":3,"records":[
            {"type":"childList","target":1,"attributeName":null},
            {"type":"attributes","target":2,"attributeName":"aria-hidden"},
            {"type":"characterData","target":5}
        ]}"#;
        let BridgeEvent::Mutation { observer, records } = BridgeEvent::parse(payload).unwrap() else {
            panic!("expected a mutation batch");
        };
        assert_eq!(observer, 3);
        let records: Vec<MutationRecord> = records.into_iter().filter_map(RawMutation::into_record).collect();
        assert_eq!(
            records,
            vec![
                MutationRecord::ChildList { target: NodeId(1) },
                MutationRecord::Attributes {
                    target: NodeId(2),
                    name: "aria-hidden".to_string()
                },
                MutationRecord::CharacterData { target: NodeId(5) },
            ]
        );
    }

    #[test]
    fn test_untracked_targets_keep_the_batch() {
        let payload = r#"{"kind":"mutation","observer":1,"records":[
            {"type":"childList","target":null,"attributeName":null},
            {"type":"childList","target":8,"attributeName":null}
        ]}"#;
        let BridgeEvent::Mutation { records, .. } = BridgeEvent::parse(payload).unwrap() else {
            panic!("expected a mutation batch");
        };
        assert_eq!(records.len(), 2);
        let records: Vec<MutationRecord> = records.into_iter().filter_map(RawMutation::into_record).collect();
        assert_eq!(records, vec![MutationRecord::ChildList { target: NodeId(8) }]);
    }

    #[test]
    fn test_script_observes_child_lists_only() {
        let source = script();
        assert!(source.contains("{ childList: true, subtree: true }"));
        assert!(!source.contains("characterData: true"));
        assert!(source.contains("new FinalizationRegistry"));
    }

    #[test]
    fn test_surface_events() {
        let input = BridgeEvent::parse(r#"{"kind":"input","node":7,"value":"next tue 9am"}"#).unwrap();
        assert_eq!(
            input.surface_event(),
            Some((7, SurfaceEvent::Changed("next tue 9am".to_string())))
        );

        let enter = BridgeEvent::parse(r#"{"kind":"keydown","node":7,"key":"Enter"}"#).unwrap();
        assert_eq!(enter.surface_event(), Some((7, SurfaceEvent::Key(Key::Enter))));

        let blur = BridgeEvent::parse(r#"{"kind":"blur","node":7}"#).unwrap();
        assert_eq!(blur.surface_event(), Some((7, SurfaceEvent::Blur)));

        let gone = BridgeEvent::parse(r#"{"kind":"detached","node":7}"#).unwrap();
        assert!(gone.surface_event().is_none());
    }

    #[test]
    fn test_unknown_event_kind_is_rejected() {
        assert!(BridgeEvent::parse(r#"{"kind":"scroll"}"#).is_err());
    }

    #[test]
    fn test_element_spec_wire_shape() {
        let spec = ElementSpec::new("button")
            .class("dismiss")
            .text("Dismiss")
            .on_click(ClickAction::RemoveClosest("snooze-nl-toast".to_string()));
        let wire = serde_json::to_value(&spec).unwrap();
        assert_eq!(wire["tag"], "button");
        assert_eq!(wire["attributes"], json!([["class", "dismiss"]]));
        assert_eq!(wire["text"], "Dismiss");
        assert_eq!(wire["on_click"], json!({"RemoveClosest": "snooze-nl-toast"}));
        assert_eq!(wire["children"], json!([]));
    }

    #[test]
    fn test_event_and_position_wire_names() {
        assert_eq!(serde_json::to_value(InsertPosition::First).unwrap(), json!("First"));
        assert_eq!(
            serde_json::to_value(SyntheticEvent::POINTER_DOWN.kind).unwrap(),
            json!("pointer")
        );
    }

    #[test]
    fn test_script_defines_every_method() {
        let source = script();
        for method in [
            "query", "text", "value", "setValue", "focus", "dispatch", "click", "attached",
            "observe", "unobserve", "insert", "remove", "setText", "listen", "unlisten",
            "location", "alert",
        ] {
            assert!(source.contains(&format!("    {}(", method)), "bridge lacks {}", method);
        }
        assert!(source.contains(BINDING));
    }
}
