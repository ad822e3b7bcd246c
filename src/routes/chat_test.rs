use super::*;
use crate::state::test_helpers;

fn body(session_id: Option<&str>, message: &str) -> Json<ChatBody> {
    Json(ChatBody { session_id: session_id.map(str::to_string), message: message.to_string() })
}

#[tokio::test]
async fn send_message_replies_in_session() {
    let state = test_helpers::test_app_state();
    let Json(resp) = send_message(State(state.clone()), body(Some("s1"), "có bao nhiêu sách")).await.unwrap();
    assert_eq!(resp.session_id, "s1");
    assert_eq!(resp.reply, "Thư viện hiện có 6 cuốn sách.");
    assert_eq!(resp.intent, Intent::CountBooks);
    assert_eq!(resp.stage, Stage::LocalQueried);

    let Json(entries) = history(State(state), Path("s1".to_string())).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].content, "Thư viện hiện có 6 cuốn sách.");
}

#[tokio::test]
async fn send_message_assigns_session_when_missing() {
    let state = test_helpers::test_app_state();
    let Json(resp) = send_message(State(state), body(None, "xin chào")).await.unwrap();
    assert!(Uuid::parse_str(&resp.session_id).is_ok());
    assert_eq!(resp.intent, Intent::Greeting);
}

#[tokio::test]
async fn send_message_rejects_blank_session_and_oversized_message() {
    let state = test_helpers::test_app_state();
    let err = send_message(State(state.clone()), body(Some("  "), "hi")).await.unwrap_err();
    assert_eq!(err, StatusCode::BAD_REQUEST);

    let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
    let err = send_message(State(state), body(Some("s1"), &long)).await.unwrap_err();
    assert_eq!(err, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn history_of_unknown_session_is_empty() {
    let Json(entries) = history(State(test_helpers::test_app_state()), Path("nobody".to_string())).await.unwrap();
    assert!(entries.is_empty());
}

#[test]
fn transcript_error_to_status_maps_unknown_role() {
    let err = TranscriptError::UnknownRole("system".into());
    assert_eq!(transcript_error_to_status(err), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn response_serializes_stage_and_intent() {
    let resp = ChatResponse {
        session_id: "s1".into(),
        reply: "ok".into(),
        stage: Stage::AiFreeform,
        intent: Intent::GeneralChat,
    };
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["stage"], "AI_FREEFORM");
    assert_eq!(json["intent"], "general_chat");
}
