use super::*;

#[test]
fn retryable_for_transport_and_server_errors() {
    assert!(LlmError::ApiRequest("reset".into()).retryable());
    assert!(LlmError::ApiResponse { status: 429, body: String::new() }.retryable());
    assert!(LlmError::ApiResponse { status: 503, body: String::new() }.retryable());
}

#[test]
fn not_retryable_for_client_and_config_errors() {
    assert!(!LlmError::ApiResponse { status: 400, body: String::new() }.retryable());
    assert!(!LlmError::ApiParse("bad".into()).retryable());
    assert!(!LlmError::MissingApiKey { var: "X".into() }.retryable());
    assert!(!LlmError::ConfigParse("x".into()).retryable());
}

#[test]
fn error_display_includes_context() {
    let err = LlmError::MissingApiKey { var: "ANTHROPIC_API_KEY".into() };
    assert_eq!(err.to_string(), "missing API key: env var ANTHROPIC_API_KEY not set");
    let err = LlmError::ApiResponse { status: 500, body: "oops".into() };
    assert_eq!(err.to_string(), "API response error: status 500");
}

#[test]
fn message_constructors_set_roles() {
    assert_eq!(Message::user("hi"), Message { role: "user".into(), content: "hi".into() });
    assert_eq!(Message::assistant("yo").role, "assistant");
}

#[test]
fn message_serializes_as_role_and_content() {
    let json = serde_json::to_value(Message::user("xin chào")).unwrap();
    assert_eq!(json, serde_json::json!({ "role": "user", "content": "xin chào" }));
}
