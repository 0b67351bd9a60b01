//! Error types for the request saga.

use thiserror::Error;

/// Failure reported by the external call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// The backend refused the call. The reason is whatever the backend said.
    #[error("Call rejected: {reason}")]
    Rejected { reason: String },
}

/// A single configuration rule violation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Channel name must not be empty")]
    EmptyChannel,

    #[error("Channel name '{channel}' must not contain whitespace")]
    WhitespaceInChannel { channel: String },

    #[error("Call delay must be positive")]
    ZeroDelay,

    #[error("Unknown policy '{0}', expected 'every' or 'latest'")]
    UnknownPolicy(String),
}

/// Errors that can occur when building a store.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("External call not specified. Call .call(..) or .simulated() before .build()")]
    MissingCall,

    #[error("Invalid configuration ({} violation(s)): {}", .0.len(), join_violations(.0))]
    InvalidConfig(Vec<ConfigError>),
}

/// Errors returned when dispatching into a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No Tokio runtime available to run the request handler")]
    NoRuntime,
}

fn join_violations(violations: &[ConfigError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_reason() {
        let err = CallError::Rejected {
            reason: "x hoge".to_string(),
        };
        assert_eq!(err.to_string(), "Call rejected: x hoge");
    }

    #[test]
    fn invalid_config_lists_every_violation() {
        let err = BuildError::InvalidConfig(vec![ConfigError::EmptyChannel, ConfigError::ZeroDelay]);
        assert_eq!(
            err.to_string(),
            "Invalid configuration (2 violation(s)): Channel name must not be empty; Call delay must be positive"
        );
    }
}
