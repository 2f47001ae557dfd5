use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported backends for content generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    /// Gemini through its OpenAI-compatible endpoint.
    Gemini,
    /// Deterministic canned content; needs no credentials or network.
    Offline,
}

impl Provider {
    /// Base URL of the provider's OpenAI-compatible API.
    pub fn api_base(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("https://api.openai.com/v1"),
            Provider::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Provider::Offline => None,
        }
    }
}

/// Values supplied on the command line; they win over the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub provider: Option<Provider>,
    pub chat_model: Option<String>,
    pub prompts_path: Option<PathBuf>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub log_level: Level,
    pub prompts_path: Option<PathBuf>,
    pub docs_limit: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(Overrides::default())
    }

    /// Loads configuration from environment variables, then applies `overrides`.
    pub fn from_env_with(overrides: Overrides) -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let provider = match overrides.provider {
            Some(provider) => provider,
            None => {
                let provider_str =
                    std::env::var("COACH_PROVIDER").unwrap_or_else(|_| "openai".to_string());
                match provider_str.to_lowercase().as_str() {
                    "openai" => Provider::OpenAI,
                    "gemini" => Provider::Gemini,
                    "offline" => Provider::Offline,
                    other => {
                        return Err(ConfigError::InvalidValue(
                            "COACH_PROVIDER".to_string(),
                            format!("'{}' is not one of openai, gemini, offline", other),
                        ));
                    }
                }
            }
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model = overrides.chat_model.unwrap_or_else(|| {
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
        });

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = overrides
            .prompts_path
            .or_else(|| std::env::var("PROMPTS_PATH").ok().map(PathBuf::from));

        let docs_limit = match std::env::var("COACH_DOCS_LIMIT") {
            Ok(raw) => match raw.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "COACH_DOCS_LIMIT".to_string(),
                        format!("'{}' is not a positive integer", raw),
                    ));
                }
            },
            Err(_) => coach_core::controller::DEFAULT_DOCS_LIMIT,
        };

        match provider {
            Provider::OpenAI => {
                if openai_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                    ));
                }
            }
            Provider::Gemini => {
                if gemini_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                    ));
                }
            }
            Provider::Offline => {}
        }

        Ok(Self {
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            log_level,
            prompts_path,
            docs_limit,
        })
    }

    /// The API key for the selected provider, if it needs one.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Offline => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("COACH_PROVIDER");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("RUST_LOG");
            env::remove_var("PROMPTS_PATH");
            env::remove_var("COACH_DOCS_LIMIT");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    fn test_provider_api_base() {
        assert!(Provider::OpenAI.api_base().unwrap().contains("openai.com"));
        assert!(Provider::Gemini.api_base().unwrap().contains("googleapis"));
        assert_eq!(Provider::Offline.api_base(), None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal_openai() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.api_key(), Some("test-openai-key"));
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.prompts_path, None);
        assert_eq!(config.docs_limit, 3);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("COACH_PROVIDER", "Gemini");
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
            env::set_var("CHAT_MODEL", "gemini-2.0-flash");
            env::set_var("RUST_LOG", "debug");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
            env::set_var("COACH_DOCS_LIMIT", "5");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api_key(), Some("test-gemini-key"));
        assert_eq!(config.chat_model, "gemini-2.0-flash");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.prompts_path, Some(PathBuf::from("/custom/prompts")));
        assert_eq!(config.docs_limit, 5);
    }

    #[test]
    #[serial]
    fn test_offline_needs_no_key() {
        clear_env_vars();
        unsafe {
            env::set_var("COACH_PROVIDER", "offline");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.provider, Provider::Offline);
        assert_eq!(config.api_key(), None);
    }

    #[test]
    #[serial]
    fn test_overrides_win_over_env() {
        clear_env_vars();
        unsafe {
            env::set_var("COACH_PROVIDER", "openai");
            env::set_var("CHAT_MODEL", "gpt-4o");
            env::set_var("PROMPTS_PATH", "/env/prompts");
        }

        let config = Config::from_env_with(Overrides {
            provider: Some(Provider::Offline),
            chat_model: Some("local-model".to_string()),
            prompts_path: Some(PathBuf::from("./prompts")),
        })
        .expect("Config should load successfully");

        assert_eq!(config.provider, Provider::Offline);
        assert_eq!(config.chat_model, "local-model");
        assert_eq!(config.prompts_path, Some(PathBuf::from("./prompts")));
    }

    #[test]
    #[serial]
    fn test_config_invalid_provider() {
        clear_env_vars();
        unsafe {
            env::set_var("COACH_PROVIDER", "claude-on-a-toaster");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "COACH_PROVIDER"),
            _ => panic!("Expected InvalidValue for COACH_PROVIDER"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_docs_limit() {
        clear_env_vars();
        unsafe {
            env::set_var("COACH_PROVIDER", "offline");
            env::set_var("COACH_DOCS_LIMIT", "0");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "COACH_DOCS_LIMIT"),
            _ => panic!("Expected InvalidValue for COACH_DOCS_LIMIT"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("OPENAI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_gemini_key() {
        clear_env_vars();
        unsafe {
            env::set_var("COACH_PROVIDER", "gemini");
            env::set_var("OPENAI_API_KEY", "present-but-irrelevant");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("GEMINI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }
}
