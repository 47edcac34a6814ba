use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 1,
        method: "Runtime.evaluate".to_string(),
        params: Some(serde_json::json!({"expression": "1 + 1"})),
        session_id: Some("S1".to_string()),
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("Runtime.evaluate"));
    assert!(json.contains("\"sessionId\":\"S1\""));
}

#[test]
fn test_request_without_session_omits_field() {
    let req = CdpRequest {
        id: 2,
        method: "Target.attachToTarget".to_string(),
        params: None,
        session_id: None,
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(!json.contains("sessionId"));
    assert!(!json.contains("params"));
}

#[test]
fn test_cdp_response_deserialize() {
    let json = r#"{"id": 1, "result": {"result": {"type": "number", "value": 2}}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, Some(1));
    assert!(resp.result.is_some());
    assert!(!resp.is_event(BINDING_CALLED));
}

#[test]
fn test_binding_event_deserialize() {
    let json = r#"{
        "method": "Runtime.bindingCalled",
        "params": {"name": "__snoozeNlEmit", "payload": "{\"kind\":\"blur\",\"node\":3}", "executionContextId": 4},
        "sessionId": "S1"
    }"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert!(resp.is_event(BINDING_CALLED));
    let called: BindingCalled = serde_json::from_value(resp.params.unwrap()).unwrap();
    assert_eq!(called.name, "__snoozeNlEmit");
    assert_eq!(called.execution_context_id, 4);
}

#[test]
fn test_page_info_deserialize() {
    let json = r#"{
        "id": "page123",
        "type": "page",
        "title": "Inbox",
        "url": "https://mail.google.com/mail/u/0/#inbox",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/page123"
    }"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.id, "page123");
    assert_eq!(info.page_type, "page");
}

#[test]
fn test_browser_version_deserialize() {
    let json = r#"{
        "Browser": "Chrome/120.0",
        "Protocol-Version": "1.3",
        "User-Agent": "Mozilla/5.0",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/browser/abc"
    }"#;
    let version: BrowserVersion = serde_json::from_str(json).unwrap();
    assert_eq!(version.browser, "Chrome/120.0");
    assert!(version.web_socket_debugger_url.starts_with("ws://"));
}

#[test]
fn test_exception_message_prefers_description() {
    let json = r#"{"text": "Uncaught", "exception": {"description": "TypeError: x is undefined"}}"#;
    let details: ExceptionDetails = serde_json::from_str(json).unwrap();
    assert_eq!(details.message(), "TypeError: x is undefined");

    let bare: ExceptionDetails = serde_json::from_str(r#"{"text": "Uncaught"}"#).unwrap();
    assert_eq!(bare.message(), "Uncaught");
}
