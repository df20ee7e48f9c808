//! Run configuration, read once at controller start-up.
//!
//! Configuration is immutable for the duration of a run. Values come from
//! environment variables (loaded from `.env` by `main`), with CLI flags
//! taking precedence:
//!
//! - `LLM_PROVIDER`: back-end selector (`openai` or `anthropic`)
//! - `OPENAI_API_KEY` / `OPENAI_MODEL`
//! - `ANTHROPIC_API_KEY` / `ANTHROPIC_MODEL`
//! - `LLM_MAX_TOKENS`: default per-call token budget

use std::path::PathBuf;

use tracing::warn;

use crate::gateway::DEFAULT_MAX_TOKENS;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Back-end selector.
    pub provider: String,
    /// Credential for the selected back end, if present in the environment.
    pub api_key: Option<String>,
    /// Model identifier for the selected back end.
    pub model: String,
    /// Default token budget per generation call.
    pub max_tokens: u32,
    /// Directory for run artifacts and the generated project.
    pub output_dir: PathBuf,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl RunConfig {
    /// Build the configuration from the environment plus CLI overrides.
    pub fn load(
        provider: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        output_dir: PathBuf,
    ) -> Self {
        let provider = provider
            .or_else(|| env_var("LLM_PROVIDER"))
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
            .to_lowercase();

        let (api_key, default_model) = match provider.as_str() {
            "openai" => (env_var("OPENAI_API_KEY"), env_var("OPENAI_MODEL")),
            "anthropic" => (env_var("ANTHROPIC_API_KEY"), env_var("ANTHROPIC_MODEL")),
            _ => (None, None),
        };

        let model = model.or(default_model).unwrap_or_else(|| {
            match provider.as_str() {
                "anthropic" => DEFAULT_ANTHROPIC_MODEL,
                _ => DEFAULT_OPENAI_MODEL,
            }
            .to_string()
        });

        let max_tokens = max_tokens
            .or_else(|| {
                env_var("LLM_MAX_TOKENS").and_then(|raw| match raw.parse() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        warn!("Ignoring unparseable LLM_MAX_TOKENS: {:?}", raw);
                        None
                    }
                })
            })
            .unwrap_or(DEFAULT_MAX_TOKENS);

        Self {
            provider,
            api_key,
            model,
            max_tokens,
            output_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Clears the config environment variables for the test's duration and
    /// restores them afterwards.
    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    const VARS: [&str; 6] = [
        "LLM_PROVIDER",
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "ANTHROPIC_API_KEY",
        "ANTHROPIC_MODEL",
        "LLM_MAX_TOKENS",
    ];

    impl EnvGuard {
        fn new() -> Self {
            let saved = VARS
                .iter()
                .map(|name| {
                    let value = std::env::var(name).ok();
                    std::env::remove_var(name);
                    (*name, value)
                })
                .collect();
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => std::env::set_var(name, v),
                    None => std::env::remove_var(name),
                }
            }
        }
    }

    // One test covers defaults, env selection and override precedence:
    // the scenarios mutate shared process environment, so they must not
    // run on parallel test threads.
    #[test]
    fn test_env_and_override_precedence() {
        let _guard = EnvGuard::new();

        let config = RunConfig::load(None, None, None, "output".into());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(config.api_key.is_none());

        std::env::set_var("LLM_PROVIDER", "anthropic");
        std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
        let config = RunConfig::load(None, None, None, "output".into());
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.api_key.as_deref(), Some("sk-ant-test"));
        assert_eq!(config.model, DEFAULT_ANTHROPIC_MODEL);

        // CLI flags win over the environment.
        let config = RunConfig::load(
            Some("openai".to_string()),
            Some("gpt-4o".to_string()),
            Some(1234),
            "out".into(),
        );
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 1234);
    }
}
