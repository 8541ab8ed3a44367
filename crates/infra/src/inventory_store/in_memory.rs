use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use afterschool_core::{LessonId, OrderId};
use afterschool_lessons::{
    plan_reservation, Lesson, LessonPatch, LessonSearch, NewLesson, Order, OrderRequest,
};

use super::r#trait::{InventoryStore, StoreError};
use crate::config::DEFAULT_LOCK_TIMEOUT;
use crate::seed::{dedup_by_natural_key, SeedMode, SeedReport};

#[derive(Debug, Default)]
struct State {
    lessons: BTreeMap<LessonId, Lesson>,
    orders: Vec<Order>,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. One async `RwLock` guards lessons and orders
/// together, so a reservation's read-check-write runs under a single write
/// guard. Lock waits are bounded by `lock_timeout`.
#[derive(Debug)]
pub struct InMemoryInventoryStore {
    state: RwLock<State>,
    lock_timeout: Duration,
}

impl Default for InMemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(State::default()),
            lock_timeout,
        }
    }

    async fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        tokio::time::timeout(self.lock_timeout, self.state.read())
            .await
            .map_err(|_| self.lock_timed_out())
    }

    async fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        tokio::time::timeout(self.lock_timeout, self.state.write())
            .await
            .map_err(|_| self.lock_timed_out())
    }

    fn lock_timed_out(&self) -> StoreError {
        StoreError::storage(format!(
            "timed out after {}ms waiting for the store lock",
            self.lock_timeout.as_millis()
        ))
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, StoreError> {
        let state = self.read().await?;
        state.lessons.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        let state = self.read().await?;
        Ok(state.lessons.values().cloned().collect())
    }

    async fn search_lessons(&self, search: &LessonSearch) -> Result<Vec<Lesson>, StoreError> {
        let state = self.read().await?;
        Ok(state
            .lessons
            .values()
            .filter(|l| search.matches(l))
            .cloned()
            .collect())
    }

    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let lesson = lesson.into_lesson(LessonId::new())?;
        let mut state = self.write().await?;
        state.lessons.insert(lesson.id, lesson.clone());
        Ok(lesson)
    }

    async fn update_lesson(&self, id: LessonId, patch: LessonPatch) -> Result<Lesson, StoreError> {
        patch.validate()?;

        let mut state = self.write().await?;
        let lesson = state.lessons.get_mut(&id).ok_or(StoreError::NotFound)?;
        lesson.apply_patch(&patch)?;
        Ok(lesson.clone())
    }

    async fn reserve(&self, request: OrderRequest) -> Result<Order, StoreError> {
        let valid = request.validate()?;

        let mut state = self.write().await?;

        let plan = plan_reservation(valid.tally(), |id| state.lessons.get(id).map(|l| l.spaces))
            .inspect_err(|e| tracing::warn!(error = %e, "reservation rejected"))?;

        // Decrement copies first so a failure leaves the stored lessons intact.
        let mut updated = Vec::with_capacity(plan.decrements.len());
        for d in &plan.decrements {
            let mut lesson = state
                .lessons
                .get(&d.lesson_id)
                .cloned()
                .ok_or(StoreError::NotFound)?;
            lesson.take_seats(d.requested)?;
            updated.push(lesson);
        }
        for lesson in updated {
            state.lessons.insert(lesson.id, lesson);
        }

        let order = valid.into_order(OrderId::new(), Utc::now());
        state.orders.push(order.clone());

        tracing::info!(
            order_id = %order.id,
            lessons = plan.decrements.len(),
            seats = plan.total_seats(),
            "reservation committed"
        );
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let state = self.read().await?;
        Ok(state.orders.clone())
    }

    async fn seed_lessons(
        &self,
        lessons: Vec<NewLesson>,
        mode: SeedMode,
    ) -> Result<SeedReport, StoreError> {
        let mut state = self.write().await?;

        let existing: Vec<_> = match mode {
            SeedMode::Reset => Vec::new(),
            SeedMode::Merge => state.lessons.values().map(Lesson::natural_key).collect(),
        };
        let (fresh, skipped) = dedup_by_natural_key(existing, lessons);

        // Validate the whole batch before touching stored state.
        let fresh = fresh
            .into_iter()
            .map(|l| l.into_lesson(LessonId::new()))
            .collect::<Result<Vec<_>, _>>()?;

        if mode == SeedMode::Reset {
            state.lessons.clear();
            state.orders.clear();
        }

        let inserted = fresh.len();
        for lesson in fresh {
            state.lessons.insert(lesson.id, lesson);
        }

        Ok(SeedReport { inserted, skipped })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().await.map(|_| ())
    }
}
