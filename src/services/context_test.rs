use super::*;

#[test]
fn add_message_appends_in_order() {
    let mut ctx = ConversationContext::new("s", 20);
    ctx.add_message(ChatRole::User, "xin chào");
    ctx.add_message(ChatRole::Assistant, "Chào bạn!");
    let contents: Vec<&str> = ctx.messages().map(ChatMessage::content).collect();
    assert_eq!(contents, vec!["xin chào", "Chào bạn!"]);
    assert_eq!(ctx.session_id(), "s");
}

#[test]
fn context_keeps_twenty_most_recent() {
    let mut ctx = ConversationContext::new("s", 20);
    for i in 0..27 {
        ctx.add_message(ChatRole::User, format!("m{i}"));
    }
    assert_eq!(ctx.len(), 20);
    let contents: Vec<String> = ctx.messages().map(|m| m.content().to_string()).collect();
    let expected: Vec<String> = (7..27).map(|i| format!("m{i}")).collect();
    assert_eq!(contents, expected);
}

#[test]
fn zero_limit_is_clamped_to_one() {
    let mut ctx = ConversationContext::new("s", 0);
    ctx.add_message(ChatRole::User, "a");
    ctx.add_message(ChatRole::User, "b");
    assert_eq!(ctx.len(), 1);
    assert_eq!(ctx.messages().next().unwrap().content(), "b");
}

#[test]
fn formatted_history_empty_placeholder() {
    let ctx = ConversationContext::new("s", 20);
    assert_eq!(ctx.formatted_history(5), EMPTY_HISTORY);
}

#[test]
fn formatted_history_last_n_lines() {
    let mut ctx = ConversationContext::new("s", 20);
    ctx.push(ChatMessage::new(ChatRole::User, "one", 1));
    ctx.push(ChatMessage::new(ChatRole::Assistant, "two", 2));
    ctx.push(ChatMessage::new(ChatRole::User, "three", 3));
    assert_eq!(ctx.formatted_history(2), "assistant: two\nuser: three");
    assert_eq!(ctx.formatted_history(10), "user: one\nassistant: two\nuser: three");
}

#[test]
fn last_assistant_message_finds_most_recent() {
    let mut ctx = ConversationContext::new("s", 20);
    assert!(ctx.last_assistant_message().is_none());
    ctx.push(ChatMessage::new(ChatRole::Assistant, "first", 1));
    ctx.push(ChatMessage::new(ChatRole::Assistant, "second", 2));
    ctx.push(ChatMessage::new(ChatRole::User, "question", 3));
    assert_eq!(ctx.last_assistant_message().unwrap().content(), "second");
}

#[test]
fn clear_empties_context() {
    let mut ctx = ConversationContext::new("s", 20);
    ctx.add_message(ChatRole::User, "a");
    ctx.clear();
    assert!(ctx.is_empty());
    assert!(ctx.last_assistant_message().is_none());
}

#[test]
fn chat_role_parses_and_rejects() {
    assert_eq!("user".parse::<ChatRole>().unwrap(), ChatRole::User);
    assert_eq!("assistant".parse::<ChatRole>().unwrap(), ChatRole::Assistant);
    assert!("system".parse::<ChatRole>().is_err());
}

#[tokio::test]
async fn sessions_are_created_lazily_and_reused() {
    let store = SessionContexts::new(20);
    assert!(store.is_empty().await);

    let a = store.session("a").await;
    a.lock().await.add_message(ChatRole::User, "hi");
    let again = store.session("a").await;
    assert!(Arc::ptr_eq(&a, &again));
    assert_eq!(again.lock().await.len(), 1);

    let b = store.session("b").await;
    assert!(b.lock().await.is_empty());
    assert_eq!(store.len().await, 2);
}
