//! Anthropic messages back end.

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

const PROVIDER: &str = "anthropic";
const API_BASE: &str = "https://api.anthropic.com/v1/";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicModel {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl AnthropicModel {
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        let endpoint = Url::parse(API_BASE)
            .and_then(|base| base.join("messages"))
            .expect("static Anthropic endpoint URL is valid");

        Self {
            client,
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl TextModel for AnthropicModel {
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
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let request_id = Uuid::new_v4().to_string();
        debug!("=== Anthropic Request ===");
        debug!("URL: {}", self.endpoint);
        debug!("Model: {}, max_tokens: {}", self.model, max_tokens);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| error_for_transport(PROVIDER, e))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(GatewayError::MalformedResponse(
                PROVIDER,
                "no text blocks in response".to_string(),
            ));
        }
        Ok(text)
    }
}
