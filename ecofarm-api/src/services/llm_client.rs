//! Chat-completion gateway client
//!
//! OpenAI-compatible `POST {base_url}/chat/completions` with bearer auth.
//! The reply is `choices[0].message.content`.

use async_trait::async_trait;
use ecofarm_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmSettings;
use crate::models::ChatMessage;
use crate::services::http::{build_client, ensure_success, send_with_retry};

const PROVIDER: &str = "AI gateway";

/// Anything that can answer a chat conversation with one text reply
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl CompletionResponse {
    fn into_text(self) -> Result<String> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        match content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(Error::MalformedResponse(format!(
                "{} returned empty content",
                PROVIDER
            ))),
            None => Err(Error::MalformedResponse(format!(
                "{} response missing choices[0].message.content",
                PROVIDER
            ))),
        }
    }
}

/// HTTP client for the chat-completion gateway
pub struct LlmClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            http_client: build_client(settings.timeout)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl ChatCompleter for LlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("LOVABLE_API_KEY is not configured".to_string()))?;

        if messages.is_empty() {
            return Err(Error::InvalidInput("messages must not be empty".to_string()));
        }

        tracing::debug!(model = %self.model, messages = messages.len(), "Requesting chat completion");

        let request = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            });

        let response = send_with_retry(request, PROVIDER).await?;
        let response = ensure_success(response, PROVIDER).await?;

        let payload: CompletionResponse = response.json().await.map_err(|e| {
            Error::MalformedResponse(format!("{} payload not valid JSON: {}", PROVIDER, e))
        })?;
        let text = payload.into_text()?;

        tracing::info!(
            model = %self.model,
            reply_chars = text.chars().count(),
            "Chat completion received"
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(json: &str) -> Result<String> {
        serde_json::from_str::<CompletionResponse>(json)
            .unwrap()
            .into_text()
    }

    #[test]
    fn test_reply_text_extracted() {
        let text = parse(
            r#"{"id": "c1", "choices": [{"index": 0,
                "message": {"role": "assistant", "content": "Plant sorghum."},
                "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert_eq!(text, "Plant sorghum.");
    }

    #[test]
    fn test_missing_content_is_malformed() {
        assert!(matches!(parse(r#"{"choices": []}"#), Err(Error::MalformedResponse(_))));
        assert!(matches!(parse(r#"{}"#), Err(Error::MalformedResponse(_))));
        assert!(matches!(
            parse(r#"{"choices": [{"message": {"role": "assistant"}}]}"#),
            Err(Error::MalformedResponse(_))
        ));
        assert!(matches!(
            parse(r#"{"choices": [{"message": {"content": "  "}}]}"#),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::user("hello")];
        let body = serde_json::to_value(CompletionRequest {
            model: "google/gemini-2.5-flash",
            messages: &messages,
        })
        .unwrap();
        assert_eq!(body["model"], "google/gemini-2.5-flash");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = LlmClient::new(&LlmSettings {
            api_key: None,
            base_url: "http://127.0.0.1:9/v1".to_string(),
            model: "m".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let result = client.complete(&[ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
