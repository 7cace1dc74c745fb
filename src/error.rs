//! Error types for timetable operations.
//!
//! `Validation` and `Conflict` are safe to retry once the caller adjusts the
//! request. `NotFound` is terminal. No variant is ever returned after a
//! partial write.

use thiserror::Error;

use crate::config::ConfigError;
use crate::conflict::Conflict;
use crate::validation::ValidationError;

/// Result type for timetable operations.
pub type TimetableResult<T> = Result<T, TimetableError>;

/// Errors raised by the timetable service.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// Malformed input or dangling references; raised before any scan.
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    /// The request collides with existing bookings. Never empty.
    #[error("{} conflict(s): {}", .0.len(), join(.0))]
    Conflict(Vec<Conflict>),

    /// Entity lookup returned no result.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The caller's deadline passed before the change could commit.
    #[error("Deadline exceeded; no changes were made")]
    DeadlineExceeded,

    /// A writer panicked while holding the state lock.
    #[error("Timetable state lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TimetableError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// The reported conflicts, empty for other variants.
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            Self::Conflict(c) => c,
            _ => &[],
        }
    }

    /// The reported validation problems, empty for other variants.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation(v) => v,
            _ => &[],
        }
    }
}

impl From<Vec<ValidationError>> for TimetableError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
