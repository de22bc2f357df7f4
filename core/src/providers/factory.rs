use crate::config::{Config, DEFAULT_MODEL};
use crate::error::AgentError;
use crate::providers::{GeminiProvider, OllamaProvider, RetryProvider};
use crate::traits::Provider;
use anyhow::Result;
use std::sync::Arc;

const GEMINI_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "ROSTER_API_KEY"];

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match config.provider.to_lowercase().as_str() {
        "ollama" => {
            let mut provider = OllamaProvider::new()
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        "gemini" | "google" => {
            let api_key = resolve_api_key_with_fallback(GEMINI_KEY_VARS, &config.api_key)?;
            let mut provider = GeminiProvider::new(api_key).with_temperature(config.temperature);
            // the default model only exists on ollama
            if config.model != DEFAULT_MODEL {
                provider = provider.with_model(config.model.clone());
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        other => {
            return Err(AgentError::Config(format!(
                "Unknown provider: {}. Available: ollama, gemini",
                other
            ))
            .into());
        }
    };

    if config.max_retries > 0 {
        return Ok(Arc::new(RetryProvider::new(provider, config.max_retries)));
    }

    Ok(provider)
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.is_empty()
        {
            return Ok(key);
        }
    }

    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(AgentError::Config(format!(
            "No API key found. Set one of {} or api_key in the config file",
            env_vars.join(", ")
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_ollama_by_default() {
        let provider = create_provider(&Config::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn config_key_is_the_fallback() {
        let key = resolve_api_key_with_fallback(&["ROSTER_TEST_UNSET_KEY"], "from-config").unwrap();
        assert_eq!(key, "from-config");
        assert!(resolve_api_key_with_fallback(&["ROSTER_TEST_UNSET_KEY"], "").is_err());
    }

    #[test]
    fn retries_wrap_the_provider() {
        let config = Config {
            max_retries: 3,
            ..Config::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = Config {
            provider: "openai".into(),
            ..Config::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown provider: openai"));
    }
}
