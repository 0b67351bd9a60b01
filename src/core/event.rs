//! Events consumed by the state machine and the effect sequencer.

use serde::{Deserialize, Serialize};

/// Something that happened to the request.
///
/// Events are created by callers (or by the sequencer for follow-ups) and
/// consumed exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A caller asked for the external call to run with this input.
    Request(String),
    /// The external call resolved with this output.
    Success(String),
    /// The external call was rejected; carries the reported detail.
    Failure(String),
    /// A caller asked to abandon the request.
    Cancel,
}

impl Event {
    pub fn request(input: impl Into<String>) -> Self {
        Self::Request(input.into())
    }

    pub fn success(output: impl Into<String>) -> Self {
        Self::Success(output.into())
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self::Failure(detail.into())
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
            Self::Cancel => "cancel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_build_matching_variants() {
        assert_eq!(Event::request("x"), Event::Request("x".to_string()));
        assert_eq!(Event::success("x hoge"), Event::Success("x hoge".to_string()));
        assert_eq!(Event::failure("error"), Event::Failure("error".to_string()));
    }

    #[test]
    fn kind_names_each_variant() {
        assert_eq!(Event::request("x").kind(), "request");
        assert_eq!(Event::success("x").kind(), "success");
        assert_eq!(Event::failure("x").kind(), "failure");
        assert_eq!(Event::Cancel.kind(), "cancel");
    }
}
