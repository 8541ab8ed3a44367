//! Lesson booking domain module.
//!
//! This crate contains the business rules for lessons and orders, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). Storage
//! backends supply isolation; the decisions they act on are made here.

pub mod icons;
pub mod lesson;
pub mod order;
pub mod reservation;
pub mod search;

pub use icons::{icon_for_subject, DEFAULT_ICON};
pub use lesson::{Lesson, LessonPatch, NewLesson};
pub use order::{Order, OrderRequest, ValidOrderRequest};
pub use reservation::{plan_reservation, ReservationPlan, SeatDecrement, SeatTally};
pub use search::LessonSearch;
