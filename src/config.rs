//! Runtime configuration
//!
//! Everything is read from environment variables so the server can be
//! launched directly by an MCP client.

use std::path::PathBuf;
use std::time::Duration;

pub const DATABASE_PATH_ENV: &str = "NUTRIPLAN_DATABASE_PATH";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "NUTRIPLAN_GEMINI_MODEL";
pub const GEMINI_BASE_URL_ENV: &str = "NUTRIPLAN_GEMINI_BASE_URL";
pub const AI_TIMEOUT_ENV: &str = "NUTRIPLAN_AI_TIMEOUT_SECS";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;

/// Settings for the generative-language API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// None when no key is configured; AI tools then report an error
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(DATABASE_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let timeout_secs = lookup(AI_TIMEOUT_ENV)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_AI_TIMEOUT_SECS);

        Self {
            database_path,
            gemini: GeminiConfig {
                api_key: lookup(GEMINI_API_KEY_ENV).filter(|k| !k.trim().is_empty()),
                model: lookup(GEMINI_MODEL_ENV).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: lookup(GEMINI_BASE_URL_ENV)
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        }
    }
}

/// `<project root>/data/nutriplan.db`, where the project root is found by
/// walking up out of target/debug or target/release
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("nutriplan.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert!(config.database_path.ends_with("data/nutriplan.db"));
        assert_eq!(config.gemini.api_key, None);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.gemini.timeout, Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (DATABASE_PATH_ENV, "/tmp/profiles.db"),
            (GEMINI_API_KEY_ENV, "secret"),
            (GEMINI_MODEL_ENV, "gemini-1.5-flash"),
            (GEMINI_BASE_URL_ENV, "http://localhost:8080/"),
            (AI_TIMEOUT_ENV, "5"),
        ]);
        assert_eq!(config.database_path, PathBuf::from("/tmp/profiles.db"));
        assert_eq!(config.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.base_url, "http://localhost:8080");
        assert_eq!(config.gemini.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_key_and_bad_timeout_ignored() {
        let config = config_from(&[(GEMINI_API_KEY_ENV, "  "), (AI_TIMEOUT_ENV, "soon")]);
        assert_eq!(config.gemini.api_key, None);
        assert_eq!(config.gemini.timeout, Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS));
    }
}
