use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PolyjudgeError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyjudgeConfig {
    #[serde(default)]
    pub judge0: Judge0Config,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

impl PolyjudgeConfig {
    /// Load from a JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                serde_json::from_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("JUDGE0_URL") {
            self.judge0.base_url = url;
        }
        if let Some(key) = lookup("JUDGE0_API_KEY") {
            self.judge0.api_key = Some(key);
        }
        if let Some(host) = lookup("JUDGE0_RAPIDAPI_HOST") {
            self.judge0.rapidapi_host = Some(host);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.max_attempts == 0 {
            return Err(PolyjudgeError::Config(
                "polling.max_attempts must be at least 1".into(),
            ));
        }
        if self.polling.initial_delay_ms > self.polling.max_delay_ms {
            return Err(PolyjudgeError::Config(
                "polling.initial_delay_ms exceeds polling.max_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judge0Config {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Set when the instance is reached through RapidAPI
    #[serde(default)]
    pub rapidapi_host: Option<String>,
}

impl Default for Judge0Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:2358".to_string(),
            api_key: None,
            rapidapi_host: None,
        }
    }
}

fn default_max_attempts() -> u32 {
    20
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    2000
}

/// Capped exponential backoff for result polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl PollingConfig {
    /// Delay before poll `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt.min(32)).unwrap_or(u64::MAX);
        self.initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

fn default_run_timeout_ms() -> u64 {
    5000
}

fn default_compile_timeout_ms() -> u64 {
    30000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,
    #[serde(default = "default_compile_timeout_ms")]
    pub compile_timeout_ms: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            run_timeout_ms: default_run_timeout_ms(),
            compile_timeout_ms: default_compile_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let polling = PollingConfig::default();
        let delays: Vec<u64> = (0..6).map(|a| polling.delay_for(a)).collect();
        assert_eq!(delays, vec![250, 500, 1000, 2000, 2000, 2000]);
        assert_eq!(polling.delay_for(200), 2000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: PolyjudgeConfig =
            serde_json::from_str(r#"{"polling": {"max_attempts": 3}}"#).unwrap();
        assert_eq!(config.polling.max_attempts, 3);
        assert_eq!(config.polling.initial_delay_ms, 250);
        assert_eq!(config.judge0.base_url, "http://localhost:2358");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PolyjudgeConfig::default();
        config.apply_env(|key| match key {
            "JUDGE0_URL" => Some("https://judge0.example".into()),
            "JUDGE0_API_KEY" => Some("secret".into()),
            _ => None,
        });
        assert_eq!(config.judge0.base_url, "https://judge0.example");
        assert_eq!(config.judge0.api_key.as_deref(), Some("secret"));
        assert!(config.judge0.rapidapi_host.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = PolyjudgeConfig::default();
        config.polling.max_attempts = 0;
        assert!(matches!(config.validate(), Err(PolyjudgeError::Config(_))));
    }
}
