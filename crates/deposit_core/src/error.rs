use std::fmt;

use shared::{domain::Draft, error::BackendError, validation::ErrorNode};
use thiserror::Error;

/// The lifecycle operation families driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Save,
    Publish,
    SubmitReview,
    Preview,
    Delete,
    ReservePid,
    DiscardPid,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Publish => "publish",
            Self::SubmitReview => "submit_review",
            Self::Preview => "preview",
            Self::Delete => "delete",
            Self::ReservePid => "reserve_pid",
            Self::DiscardPid => "discard_pid",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DepositError {
    #[error("{operation} failed: {source}")]
    Backend {
        operation: Operation,
        #[source]
        source: BackendError,
    },
    /// The draft was stored but the backend reported validation problems.
    #[error("draft saved with validation errors")]
    Validation {
        data: Box<Draft>,
        errors: ErrorNode,
    },
}

impl DepositError {
    pub fn backend(operation: Operation, source: BackendError) -> Self {
        Self::Backend { operation, source }
    }

    pub fn errors(&self) -> &ErrorNode {
        match self {
            Self::Backend { source, .. } => &source.errors,
            Self::Validation { errors, .. } => errors,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
