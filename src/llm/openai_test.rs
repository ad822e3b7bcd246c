use super::*;

#[test]
fn cc_parse_text_response() {
    let json = serde_json::json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Hello!" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert_eq!(resp.text, "Hello!");
    assert_eq!(resp.model, "gpt-4o-mini");
    assert_eq!(resp.stop_reason, "end_turn");
    assert_eq!(resp.input_tokens, 10);
    assert_eq!(resp.output_tokens, 5);
}

#[test]
fn cc_parse_length_finish_maps_to_max_tokens() {
    let json = serde_json::json!({
        "choices": [{ "message": { "content": "cut" }, "finish_reason": "length" }]
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert_eq!(resp.stop_reason, "max_tokens");
    assert_eq!(resp.input_tokens, 0);
}

#[test]
fn cc_parse_null_content_is_empty_text() {
    let json = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": null }, "finish_reason": "stop" }]
    })
    .to_string();
    let resp = parse_chat_completions_response(&json).unwrap();
    assert!(resp.text.is_empty());
}

#[test]
fn cc_parse_missing_choices_is_error() {
    let json = serde_json::json!({ "model": "gpt-4o-mini", "choices": [] }).to_string();
    assert!(matches!(parse_chat_completions_response(&json), Err(LlmError::ApiParse(_))));
}

#[test]
fn cc_parse_invalid_json_is_error() {
    assert!(matches!(parse_chat_completions_response("{"), Err(LlmError::ApiParse(_))));
}

#[test]
fn build_messages_prepends_system() {
    let msgs = build_messages("be brief", &[Message::user("hi")]);
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0].role, "system");
    assert_eq!(msgs[0].content, "be brief");
    assert_eq!(msgs[1], Message::user("hi"));
}

#[test]
fn build_messages_skips_blank_system() {
    let msgs = build_messages("  ", &[Message::user("hi")]);
    assert_eq!(msgs, vec![Message::user("hi")]);
}
