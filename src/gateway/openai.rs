//! OpenAI chat-completions back end.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{
    error_for_status, error_for_transport, GatewayError, GatewayResult, TextModel,
    DEFAULT_TIMEOUT_SECS,
};

const PROVIDER: &str = "openai";
const API_BASE: &str = "https://api.openai.com/v1/";

/// System prompt sent with every completion request.
const SYSTEM_PROMPT: &str =
    "You are a helpful assistant specializing in mobile app development and Flutter.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiModel {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiModel {
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        let endpoint = Url::parse(API_BASE)
            .and_then(|base| base.join("chat/completions"))
            .expect("static OpenAI endpoint URL is valid");

        Self {
            client,
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl TextModel for OpenAiModel {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> GatewayResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature,
        };

        let request_id = Uuid::new_v4().to_string();
        debug!("=== OpenAI Request ===");
        debug!("URL: {}", self.endpoint);
        debug!("Model: {}, max_tokens: {}", self.model, max_tokens);

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .header("x-request-id", &request_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| error_for_transport(PROVIDER, e))?;

        let status = response.status();
        debug!("Status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(PROVIDER, status, body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| error_for_transport(PROVIDER, e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::MalformedResponse(PROVIDER, "no completion choices".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            max_tokens: 100,
            temperature: 0.7,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn test_response_parse() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"some dart"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("some dart")
        );
    }
}
