use std::fmt;

use shared::domain::PlateId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Load,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PlateListError {
    #[error("no plate is selected for editing")]
    NoEditTarget,
    #[error("plate {0} is not in the list")]
    UnknownPlate(PlateId),
    #[error("{operation} request failed: {source:#}")]
    Request {
        operation: Operation,
        source: anyhow::Error,
    },
}

impl PlateListError {
    pub fn request(operation: Operation, source: anyhow::Error) -> Self {
        Self::Request { operation, source }
    }

    /// Operation a failure belongs to. Precondition failures are only
    /// raised by update.
    pub fn operation(&self) -> Operation {
        match self {
            Self::NoEditTarget | Self::UnknownPlate(_) => Operation::Update,
            Self::Request { operation, .. } => *operation,
        }
    }

    /// True when the failure was detected locally and nothing was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NoEditTarget | Self::UnknownPlate(_))
    }
}

/// User-visible record of the most recent failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub operation: Operation,
    pub message: String,
}

impl From<&PlateListError> for OperationFailure {
    fn from(value: &PlateListError) -> Self {
        Self {
            operation: value.operation(),
            message: value.to_string(),
        }
    }
}
