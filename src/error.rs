use thiserror::Error;

pub type Result<T, E = AcoError> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AcoError {
    /// Rejected before any ant is spawned
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("node {index} is out of range for {len} nodes")]
    OutOfRange { index: usize, len: usize },
    /// An ant ran out of unvisited neighbors before its tour was complete
    #[error("ant at node {node} has no eligible move after visiting {visited} nodes")]
    NoEligibleMove { node: usize, visited: usize },
    #[error("ant exceeded the step limit of {limit} without reaching its destination")]
    StepLimitExceeded { limit: usize },
}

impl AcoError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}
