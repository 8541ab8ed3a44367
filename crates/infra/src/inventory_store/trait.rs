use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use afterschool_core::{DomainError, LessonId, SeatShortfall};
use afterschool_lessons::{Lesson, LessonPatch, LessonSearch, NewLesson, Order, OrderRequest};

use crate::seed::{SeedMode, SeedReport};

/// Inventory store operation error.
///
/// Every variant is terminal for the call that produced it; the store never
/// retries internally and never leaves a partial mutation behind.
///
/// ## Error Categories
///
/// - **InvalidInput**: malformed or missing fields, empty updates, unknown lesson ids in an order
/// - **InsufficientSeats**: at least one lesson cannot cover the seats requested from it
/// - **NotFound**: unknown lesson id on a point lookup or update
/// - **StorageFault**: backend unavailable, lock wait exceeded, or commit failed
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient seats: {}", describe_shortfalls(.0))]
    InsufficientSeats(Vec<SeatShortfall>),

    #[error("lesson not found")]
    NotFound,

    #[error("storage failure: {0}")]
    StorageFault(String),
}

fn describe_shortfalls(shortfalls: &[SeatShortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl StoreError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::InvalidInput(_) => "invalid_input",
            StoreError::InsufficientSeats(_) => "insufficient_seats",
            StoreError::NotFound => "not_found",
            StoreError::StorageFault(_) => "storage_fault",
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        StoreError::StorageFault(msg.into())
    }
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => StoreError::InvalidInput(msg),
            DomainError::InvalidId(msg) => StoreError::InvalidInput(msg),
            DomainError::NotFound => StoreError::NotFound,
            DomainError::InsufficientSeats(shortfalls) => StoreError::InsufficientSeats(shortfalls),
        }
    }
}

/// Owner of lesson seat counts and order history.
///
/// ## Consistency
///
/// - `reserve` is the only multi-record operation. It runs as one isolated
///   unit of work: two reservations touching the same lesson never both see
///   the pre-decrement seat count, and a rejected batch changes nothing.
/// - `update_lesson` is atomic per record.
/// - Reads see committed state (read-committed); no cross-call snapshot.
/// - No operation waits indefinitely; lock waits past the configured bound
///   surface as `StorageFault`.
///
/// Callers only ever receive owned copies of stored records.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, StoreError>;

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StoreError>;

    async fn search_lessons(&self, search: &LessonSearch) -> Result<Vec<Lesson>, StoreError>;

    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError>;

    /// Apply a sparse update. Empty or invalid patches are rejected before
    /// storage is touched.
    async fn update_lesson(&self, id: LessonId, patch: LessonPatch) -> Result<Lesson, StoreError>;

    /// Atomically take one seat per entry in `request.lesson_ids` and record the order.
    async fn reserve(&self, request: OrderRequest) -> Result<Order, StoreError>;

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Load a catalogue, skipping lessons whose `(subject, location)` already exists.
    async fn seed_lessons(
        &self,
        lessons: Vec<NewLesson>,
        mode: SeedMode,
    ) -> Result<SeedReport, StoreError>;

    /// Readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, StoreError> {
        (**self).get_lesson(id).await
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        (**self).list_lessons().await
    }

    async fn search_lessons(&self, search: &LessonSearch) -> Result<Vec<Lesson>, StoreError> {
        (**self).search_lessons(search).await
    }

    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        (**self).insert_lesson(lesson).await
    }

    async fn update_lesson(&self, id: LessonId, patch: LessonPatch) -> Result<Lesson, StoreError> {
        (**self).update_lesson(id, patch).await
    }

    async fn reserve(&self, request: OrderRequest) -> Result<Order, StoreError> {
        (**self).reserve(request).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders().await
    }

    async fn seed_lessons(
        &self,
        lessons: Vec<NewLesson>,
        mode: SeedMode,
    ) -> Result<SeedReport, StoreError> {
        (**self).seed_lessons(lessons, mode).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}
