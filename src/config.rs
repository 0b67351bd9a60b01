//! Startup configuration for the effect sequencer.
//!
//! Validation uses Stillwater's `Validation` type so every violated rule
//! is reported in one pass instead of stopping at the first.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// How overlapping requests on one channel are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Every request runs its handler to completion; none are canceled.
    #[default]
    Every,
    /// A new request abandons the handler still in flight for its channel.
    Latest,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Every => "every",
            Self::Latest => "latest",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every" => Ok(Self::Every),
            "latest" => Ok(Self::Latest),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Configuration for the sequencer, chosen once at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Concurrency policy for overlapping requests
    pub policy: Policy,

    /// Logical channel the request handlers are tracked under
    pub channel: String,

    /// Delay of the simulated external call in milliseconds
    pub call_delay_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Every,
            channel: "request".to_string(),
            call_delay_ms: 1000,
        }
    }
}

impl SequencerConfig {
    pub fn with_policy(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn call_delay(&self) -> Duration {
        Duration::from_millis(self.call_delay_ms)
    }

    /// Check every rule, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        let channel_check = if self.channel.is_empty() {
            Validation::fail(ConfigError::EmptyChannel)
        } else if self.channel.chars().any(char::is_whitespace) {
            Validation::fail(ConfigError::WhitespaceInChannel {
                channel: self.channel.clone(),
            })
        } else {
            Validation::success(())
        };

        let delay_check = if self.call_delay_ms == 0 {
            Validation::fail(ConfigError::ZeroDelay)
        } else {
            Validation::success(())
        };

        Validation::all_vec(vec![channel_check, delay_check]).map(|_| ())
    }

    /// Validate and flatten the violations into a plain list.
    pub fn check(&self) -> Result<(), Vec<ConfigError>> {
        match self.validate() {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => Err(errors.iter().cloned().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SequencerConfig::default();
        assert_eq!(config.policy, Policy::Every);
        assert_eq!(config.call_delay(), Duration::from_secs(1));
        assert!(config.validate().is_success());
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let config = SequencerConfig {
            policy: Policy::Latest,
            channel: String::new(),
            call_delay_ms: 0,
        };

        match config.validate() {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().any(|e| matches!(e, ConfigError::EmptyChannel)));
                assert!(errors.iter().any(|e| matches!(e, ConfigError::ZeroDelay)));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn whitespace_channel_is_rejected() {
        let config = SequencerConfig {
            channel: "hoge request".to_string(),
            ..SequencerConfig::default()
        };

        assert_eq!(
            config.check(),
            Err(vec![ConfigError::WhitespaceInChannel {
                channel: "hoge request".to_string()
            }])
        );
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("every".parse::<Policy>(), Ok(Policy::Every));
        assert_eq!(" Latest ".parse::<Policy>(), Ok(Policy::Latest));
        assert_eq!(
            "sometimes".parse::<Policy>(),
            Err(ConfigError::UnknownPolicy("sometimes".to_string()))
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: SequencerConfig = serde_json::from_str(r#"{"policy":"latest"}"#).unwrap();
        assert_eq!(config.policy, Policy::Latest);
        assert_eq!(config.channel, "request");
        assert_eq!(config.call_delay_ms, 1000);
    }
}
