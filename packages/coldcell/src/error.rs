//! Error taxonomy for pipeline execution

use thiserror::Error;

/// Failures surfaced by an [`AsyncValue`](crate::AsyncValue) pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The initiating computation failed
    #[error("computation failed: {0}")]
    Computation(String),

    /// A transformation step failed
    #[error("transform failed: {0}")]
    Transform(String),

    /// An error-recovery step itself failed
    #[error("recovery failed: {0}")]
    Recovery(String),

    /// The executing side dropped the handoff cell before settling
    #[error("pipeline dropped before delivering a result")]
    Disconnected,
}

impl ValueError {
    /// Create a computation failure
    #[must_use]
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    /// Create a transform failure
    #[must_use]
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    /// Create a recovery failure
    #[must_use]
    pub fn recovery(msg: impl Into<String>) -> Self {
        Self::Recovery(msg.into())
    }

    /// Re-tag a failure that surfaced while a recovery pipeline was executing
    pub(crate) fn into_recovery(self) -> Self {
        match self {
            Self::Recovery(_) => self,
            other => Self::Recovery(other.to_string()),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ValueError>;
