//! Text-generation gateway over interchangeable LLM back ends.
//!
//! Exposes one uniform `generate` call for the whole pipeline. The back
//! end is chosen once at start-up from the run configuration and never
//! substituted afterwards. The gateway performs exactly one outbound
//! network call per invocation; retry policy belongs to the caller.

use async_trait::async_trait;
use thiserror::Error;

mod anthropic;
mod openai;

pub use anthropic::AnthropicModel;
pub use openai::OpenAiModel;

use crate::config::RunConfig;

/// Request timeout applied to every back-end HTTP client.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Sampling temperature used for every pipeline call.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default per-call token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Failure kinds for a single generation call.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The caller violated the request contract (empty prompt, zero budget,
    /// or an operation refused before any network call was made).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Invalid or missing credential.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),
    /// Rate limit or quota exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    /// Transient network failure (connect, timeout, upstream 5xx).
    #[error("Network failure: {0}")]
    NetworkFailure(String),
    /// The upstream payload was empty, truncated, or not decodable.
    #[error("Malformed response from {0}: {1}")]
    MalformedResponse(&'static str, String),
    /// The configured back-end selector names no known provider.
    #[error("Unsupported LLM provider: {0}")]
    UnsupportedBackend(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// One interchangeable generation back end.
#[async_trait]
pub trait TextModel: Send + Sync {
    fn provider(&self) -> &'static str;
    fn model_id(&self) -> &str;
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> GatewayResult<String>;
}

/// Uniform call interface over the configured back end.
pub struct Gateway {
    model: Box<dyn TextModel>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("provider", &self.model.provider())
            .field("model_id", &self.model.model_id())
            .finish()
    }
}

impl Gateway {
    pub fn new(model: Box<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Select a back end from the run configuration.
    ///
    /// Fails with `UnsupportedBackend` for an unknown selector and
    /// `AuthFailure` when the matching credential is absent; it never
    /// falls back to a different provider than configured.
    pub fn from_config(config: &RunConfig) -> GatewayResult<Self> {
        match config.provider.as_str() {
            "openai" => {
                let api_key = config.api_key.clone().ok_or_else(|| {
                    GatewayError::AuthFailure("OPENAI_API_KEY not set".to_string())
                })?;
                Ok(Self::new(Box::new(OpenAiModel::new(
                    api_key,
                    config.model.clone(),
                ))))
            }
            "anthropic" => {
                let api_key = config.api_key.clone().ok_or_else(|| {
                    GatewayError::AuthFailure("ANTHROPIC_API_KEY not set".to_string())
                })?;
                Ok(Self::new(Box::new(AnthropicModel::new(
                    api_key,
                    config.model.clone(),
                ))))
            }
            other => Err(GatewayError::UnsupportedBackend(other.to_string())),
        }
    }

    pub fn provider(&self) -> &'static str {
        self.model.provider()
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Issue one generation call.
    ///
    /// `prompt` must be non-empty and `max_tokens` positive; a successful
    /// result is guaranteed non-empty.
    pub async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> GatewayResult<String> {
        if prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        if max_tokens == 0 {
            return Err(GatewayError::InvalidRequest(
                "max_tokens must be positive".to_string(),
            ));
        }

        let text = self.model.generate(prompt, max_tokens, temperature).await?;
        if text.trim().is_empty() {
            return Err(GatewayError::MalformedResponse(
                self.model.provider(),
                "empty completion".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Map a non-success HTTP status to the gateway error taxonomy.
pub(crate) fn error_for_status(
    provider: &'static str,
    status: reqwest::StatusCode,
    body: String,
) -> GatewayError {
    match status.as_u16() {
        401 | 403 => GatewayError::AuthFailure(format!(
            "{} rejected the credential (HTTP {}): {}",
            provider, status, body
        )),
        429 => GatewayError::RateLimited(format!("{} (HTTP 429): {}", provider, body)),
        408 | 500..=599 => {
            GatewayError::NetworkFailure(format!("{} (HTTP {}): {}", provider, status, body))
        }
        400 => GatewayError::InvalidRequest(format!("{} (HTTP 400): {}", provider, body)),
        _ => GatewayError::MalformedResponse(provider, format!("HTTP {}: {}", status, body)),
    }
}

/// Map a reqwest transport error to the gateway error taxonomy.
pub(crate) fn error_for_transport(provider: &'static str, err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::MalformedResponse(provider, err.to_string())
    } else {
        GatewayError::NetworkFailure(format!("{}: {}", provider, err))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic stub back end for pipeline tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{GatewayError, GatewayResult, TextModel};
    use async_trait::async_trait;

    type Responder = Box<dyn Fn(usize, &str) -> GatewayResult<String> + Send + Sync>;

    /// Scripted [`TextModel`]: the responder receives the zero-based call
    /// index and the prompt, and the shared counter records every call.
    pub struct StubModel {
        calls: Arc<AtomicUsize>,
        respond: Responder,
    }

    impl StubModel {
        pub fn new(
            respond: impl Fn(usize, &str) -> GatewayResult<String> + Send + Sync + 'static,
        ) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    respond: Box::new(respond),
                },
                calls,
            )
        }

        /// Stub that replays the same text for every call.
        pub fn constant(text: &str) -> (Self, Arc<AtomicUsize>) {
            let text = text.to_string();
            Self::new(move |_, _| Ok(text.clone()))
        }
    }

    #[async_trait]
    impl TextModel for StubModel {
        fn provider(&self) -> &'static str {
            "stub"
        }

        fn model_id(&self) -> &str {
            "stub-1"
        }

        async fn generate(
            &self,
            prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> GatewayResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            (self.respond)(n, prompt)
        }
    }

    pub fn network_down() -> GatewayError {
        GatewayError::NetworkFailure("stub: connection refused".to_string())
    }
}
