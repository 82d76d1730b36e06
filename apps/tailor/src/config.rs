use std::time::Duration;

use crate::errors::AppError;
use crate::llm_client::backend::DEFAULT_BASE_URL;
use crate::llm_client::DEFAULT_MODEL;
use crate::tailoring::controller::DEFAULT_MAX_REFINEMENTS;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Values given on the command line. They win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_refinements: Option<u32>,
    pub verbose: bool,
}

/// Run configuration, resolved once at startup and passed into constructors.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub llm_timeout: Duration,
    pub max_retries: u32,
    pub max_refinements: u32,
    pub log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("llm_timeout", &self.llm_timeout)
            .field("max_retries", &self.max_retries)
            .field("max_refinements", &self.max_refinements)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// CLI overrides, then the process environment, then `.env`, then defaults.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = overrides
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup("OPENAI_API_KEY"))
            .ok_or_else(|| {
                AppError::config(
                    "OpenAI API key is not set",
                    "export OPENAI_API_KEY=... or pass --api-key",
                )
            })?;

        let max_refinements = match overrides.max_refinements {
            Some(n) => n,
            None => parse_or(&lookup, "TAILOR_MAX_REFINEMENTS", DEFAULT_MAX_REFINEMENTS)?,
        };

        Ok(Config {
            api_key,
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: overrides
                .model
                .or_else(|| lookup("TAILOR_MODEL"))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_timeout: Duration::from_secs(parse_or(
                &lookup,
                "TAILOR_LLM_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_retries: parse_or(&lookup, "TAILOR_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            max_refinements,
            log_level: if overrides.verbose { "debug" } else { "info" }.to_string(),
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            AppError::config(
                format!("{key} must be a non-negative integer, got '{raw}'"),
                format!("unset {key} to use the default"),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_config_error_with_hint() {
        let err = Config::from_lookup(ConfigOverrides::default(), env(&[])).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
        assert!(err.to_string().contains("--api-key"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let err = Config::from_lookup(ConfigOverrides::default(), env(&[("OPENAI_API_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            Config::from_lookup(ConfigOverrides::default(), env(&[("OPENAI_API_KEY", "sk-env")]))
                .unwrap();
        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.llm_timeout, Duration::from_secs(120));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_refinements, 2);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_cli_overrides_environment() {
        let overrides = ConfigOverrides {
            api_key: Some("sk-cli".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            max_refinements: Some(0),
            verbose: true,
        };
        let config = Config::from_lookup(
            overrides,
            env(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("TAILOR_MODEL", "gpt-4-turbo"),
                ("TAILOR_MAX_REFINEMENTS", "5"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api_key, "sk-cli");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_refinements, 0);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_environment_values_parsed() {
        let config = Config::from_lookup(
            ConfigOverrides::default(),
            env(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("OPENAI_BASE_URL", "http://localhost:8000/v1"),
                ("TAILOR_LLM_TIMEOUT_SECS", "30"),
                ("TAILOR_MAX_RETRIES", "0"),
                ("TAILOR_MAX_REFINEMENTS", "4"),
            ]),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.max_refinements, 4);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = Config::from_lookup(
            ConfigOverrides::default(),
            env(&[("OPENAI_API_KEY", "sk"), ("TAILOR_MAX_RETRIES", "lots")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("TAILOR_MAX_RETRIES"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config =
            Config::from_lookup(ConfigOverrides::default(), env(&[("OPENAI_API_KEY", "sk-secret")]))
                .unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
