use super::*;

struct FixedLlm(Result<&'static str, u16>);

#[async_trait::async_trait]
impl LlmChat for FixedLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, _messages: &[Message]) -> Result<ChatResponse, LlmError> {
        match self.0 {
            Ok(text) => Ok(ChatResponse {
                text: text.into(),
                model: "fixed".into(),
                stop_reason: "end_turn".into(),
                input_tokens: 0,
                output_tokens: 0,
            }),
            Err(status) => Err(LlmError::ApiResponse { status, body: String::new() }),
        }
    }
}

struct StalledLlm;

#[async_trait::async_trait]
impl LlmChat for StalledLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, _messages: &[Message]) -> Result<ChatResponse, LlmError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(LlmError::ApiRequest("unreachable".into()))
    }
}

#[tokio::test]
async fn complete_returns_trimmed_text() {
    let llm = FixedLlm(Ok("  hello  \n"));
    let out = complete(&llm, "sys", "prompt", 64, Duration::from_secs(1)).await;
    assert_eq!(out, "hello");
}

#[tokio::test]
async fn complete_folds_error_status_to_empty() {
    let llm = FixedLlm(Err(500));
    let out = complete(&llm, "sys", "prompt", 64, Duration::from_secs(1)).await;
    assert!(out.is_empty());
}

#[tokio::test(start_paused = true)]
async fn complete_folds_timeout_to_empty() {
    let out = complete(&StalledLlm, "sys", "prompt", 64, Duration::from_secs(30)).await;
    assert!(out.is_empty());
}
