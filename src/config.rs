//! Runtime configuration for the broker service

use crate::error::{BrokerError, Result};
use crate::oracle::OllamaConfig;
use crate::session::StoreSettings;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Which strategy oracle drives the buyer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    Ollama,
    Rules,
}

impl FromStr for OracleKind {
    type Err = BrokerError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "rules" => Ok(Self::Rules),
            other => Err(BrokerError::InvalidConfig(format!(
                "unsupported oracle `{}` (expected ollama|rules)",
                other
            ))),
        }
    }
}

/// Complete service configuration
#[derive(Clone, Debug, PartialEq)]
pub struct BrokerConfig {
    pub bind_addr: SocketAddr,
    pub oracle: OracleKind,
    pub ollama: OllamaConfig,
    pub oracle_timeout: Duration,
    pub idle_timeout: Duration,
    pub sweep_interval: Duration,
    pub max_sessions: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        let store = StoreSettings::default();
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            oracle: OracleKind::Ollama,
            ollama: OllamaConfig::default(),
            oracle_timeout: store.oracle_timeout,
            idle_timeout: store.idle_timeout,
            sweep_interval: Duration::from_secs(60 * 60),
            max_sessions: store.max_sessions,
        }
    }
}

impl BrokerConfig {
    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("oracle timeout", self.oracle_timeout),
            ("idle timeout", self.idle_timeout),
            ("sweep interval", self.sweep_interval),
        ] {
            if value.is_zero() {
                return Err(BrokerError::InvalidConfig(format!("{} must be positive", name)));
            }
        }

        if self.max_sessions == 0 {
            return Err(BrokerError::InvalidConfig(
                "session cap must be at least 1".to_string(),
            ));
        }

        if self.oracle == OracleKind::Ollama {
            if self.ollama.base_url.trim().is_empty() {
                return Err(BrokerError::InvalidConfig(
                    "ollama url is required for the ollama oracle".to_string(),
                ));
            }
            if self.ollama.model.trim().is_empty() {
                return Err(BrokerError::InvalidConfig(
                    "ollama model is required for the ollama oracle".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            idle_timeout: self.idle_timeout,
            oracle_timeout: self.oracle_timeout,
            max_sessions: self.max_sessions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BrokerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_timeout, Duration::from_secs(3600));
        assert_eq!(config.sweep_interval, Duration::from_secs(3600));
        assert_eq!(config.ollama.model, "phi3");
    }

    #[test]
    fn test_oracle_kind_parsing() {
        assert_eq!("Rules".parse::<OracleKind>().unwrap(), OracleKind::Rules);
        assert_eq!(" ollama ".parse::<OracleKind>().unwrap(), OracleKind::Ollama);
        assert!(matches!(
            "openai".parse::<OracleKind>(),
            Err(BrokerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let config = BrokerConfig {
            sweep_interval: Duration::ZERO,
            ..BrokerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration value: sweep interval must be positive"
        );
    }

    #[test]
    fn test_zero_session_cap_rejected() {
        let config = BrokerConfig {
            max_sessions: 0,
            ..BrokerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ollama_settings_only_checked_for_ollama() {
        let mut config = BrokerConfig::default();
        config.ollama.model = " ".to_string();
        assert!(config.validate().is_err());

        config.oracle = OracleKind::Rules;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_settings_follow_config() {
        let config = BrokerConfig {
            idle_timeout: Duration::from_secs(5),
            max_sessions: 7,
            ..BrokerConfig::default()
        };
        let settings = config.store_settings();
        assert_eq!(settings.idle_timeout, Duration::from_secs(5));
        assert_eq!(settings.max_sessions, 7);
    }
}
