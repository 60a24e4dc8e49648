use serde::Serialize;
use thiserror::Error;

/// Per-request routing failure
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum RoutingError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("no matching or fallback profile among {loaded} loaded profiles")]
    NoCandidate { loaded: usize },
}

impl RoutingError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RoutingError::EmptyPrompt => "empty_prompt",
            RoutingError::NoCandidate { .. } => "no_candidate",
        }
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
