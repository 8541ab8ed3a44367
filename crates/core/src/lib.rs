//! Domain building blocks shared by every afterschool crate.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, SeatShortfall};
pub use id::{LessonId, OrderId};
