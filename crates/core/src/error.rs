//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::LessonId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// One lesson that could not cover the seats requested from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatShortfall {
    pub lesson_id: LessonId,
    pub requested: u32,
    pub available: u32,
}

impl core::fmt::Display for SeatShortfall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "lesson {} has {} space(s), {} requested",
            self.lesson_id, self.available, self.requested
        )
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// availability). Storage concerns belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, unknown lesson).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// At least one lesson cannot cover the seats requested from it.
    #[error("insufficient seats: {}", format_shortfalls(.0))]
    InsufficientSeats(Vec<SeatShortfall>),
}

fn format_shortfalls(shortfalls: &[SeatShortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
