use super::*;

#[test]
fn role_serializes_lowercase() {
    let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
    assert_eq!(json["role"], "assistant");
    assert_eq!(json["content"], "hi");
}

#[test]
fn message_deserializes_from_wire_shape() {
    let msg: ChatMessage = serde_json::from_str(r#"{"role":"system","content":"be brief"}"#).unwrap();
    assert_eq!(msg, ChatMessage::system("be brief"));
}

#[test]
fn retryable_covers_transport_and_server_errors() {
    assert!(LlmError::ApiRequest("reset".into()).retryable());
    assert!(LlmError::ApiResponse { status: 429, body: String::new() }.retryable());
    assert!(LlmError::ApiResponse { status: 503, body: String::new() }.retryable());
}

#[test]
fn retryable_excludes_client_errors() {
    assert!(!LlmError::ApiResponse { status: 401, body: String::new() }.retryable());
    assert!(!LlmError::ApiParse("bad json".into()).retryable());
    assert!(!LlmError::MissingApiKey { var: "OPENAI_API_KEY".into() }.retryable());
}

#[test]
fn api_response_display_omits_body() {
    let err = LlmError::ApiResponse { status: 401, body: "secret detail".into() };
    assert_eq!(err.to_string(), "API response error: status 401");
}
