//! Postgres-backed inventory store implementation.
//!
//! Lessons and orders live in two tables, `lessons` and `orders`. A reservation
//! is one transaction: the touched lesson rows are locked with
//! `SELECT … FOR UPDATE` (in id order, so concurrent batches acquire locks in
//! the same order), checked, decremented, and the order row is inserted before
//! commit. Lock waits are capped with a transaction-local `lock_timeout`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (check violation) | `23514` | `InvalidInput` | Value outside column constraints |
//! | Database (lock not available) | `55P03` | `StorageFault` | `lock_timeout` exceeded |
//! | Database (query canceled) | `57014` | `StorageFault` | statement timeout |
//! | Database (other) | Any other | `StorageFault` | Other database errors |
//! | PoolTimedOut / PoolClosed | N/A | `StorageFault` | No connection within the bound |
//! | Other | N/A | `StorageFault` | Network errors, connection failures, etc. |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};
use uuid::Uuid;

use afterschool_core::{LessonId, OrderId};
use afterschool_lessons::{
    plan_reservation, Lesson, LessonPatch, LessonSearch, NewLesson, Order, OrderRequest,
};

use super::r#trait::{InventoryStore, StoreError};
use crate::config::StoreConfig;
use crate::seed::{dedup_by_natural_key, SeedMode, SeedReport};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS lessons (
        id UUID PRIMARY KEY,
        subject TEXT NOT NULL,
        location TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL CHECK (price >= 0),
        spaces BIGINT NOT NULL CHECK (spaces >= 0 AND spaces <= 4294967295),
        icon TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        customer_name TEXT NOT NULL,
        customer_phone TEXT NOT NULL,
        lesson_ids UUID[] NOT NULL CHECK (cardinality(lesson_ids) > 0),
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_created_at_idx ON orders (created_at)",
];

const LESSON_COLUMNS: &str = "id, subject, location, price, spaces, icon";

/// Postgres-backed inventory store.
///
/// ## Thread Safety
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
/// Every write runs in its own transaction.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
    lock_timeout: Duration,
}

impl PostgresInventoryStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self {
            pool: Arc::new(pool),
            lock_timeout,
        }
    }

    /// Open a pool from configuration. Connection acquisition shares the lock bound.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| StoreError::storage("database_url is not configured"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.lock_timeout)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool, config.lock_timeout))
    }

    /// Create tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Begin a transaction whose lock waits are capped at `lock_timeout`.
    async fn begin_bounded(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_lock_timeout", e))?;

        Ok(tx)
    }

    async fn insert_lesson_tx(
        tx: &mut Transaction<'static, Postgres>,
        lesson: &Lesson,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO lessons (id, subject, location, price, spaces, icon)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(lesson.id.as_uuid())
        .bind(&lesson.subject)
        .bind(&lesson.location)
        .bind(lesson.price)
        .bind(i64::from(lesson.spaces))
        .bind(&lesson.icon)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_lesson", e))?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self), fields(lesson_id = %id), err)]
    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, StoreError> {
        let row = sqlx::query(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_lesson", e))?
            .ok_or(StoreError::NotFound)?;

        lesson_from_row(&row)
    }

    #[instrument(skip(self), fields(lesson_count = tracing::field::Empty), err)]
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons ORDER BY subject, location"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_lessons", e))?;

        let lessons = rows.iter().map(lesson_from_row).collect::<Result<Vec<_>, _>>()?;
        Span::current().record("lesson_count", lessons.len());
        Ok(lessons)
    }

    #[instrument(skip(self, search), fields(token = %search.token()), err)]
    async fn search_lessons(&self, search: &LessonSearch) -> Result<Vec<Lesson>, StoreError> {
        if search.is_empty() {
            return self.list_lessons().await;
        }

        let pattern = format!("%{}%", escape_like(search.token()));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM lessons
            WHERE subject ILIKE $1
               OR location ILIKE $1
               OR ($2::float8 IS NOT NULL AND price = $2)
               OR ($3::bigint IS NOT NULL AND spaces = $3)
            ORDER BY subject, location
            "#
        ))
        .bind(pattern)
        .bind(search.number())
        .bind(search.spaces().map(i64::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("search_lessons", e))?;

        rows.iter().map(lesson_from_row).collect()
    }

    #[instrument(skip(self, lesson), err)]
    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let lesson = lesson.into_lesson(LessonId::new())?;

        let mut tx = self.begin_bounded().await?;
        Self::insert_lesson_tx(&mut tx, &lesson).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(lesson)
    }

    #[instrument(skip(self, patch), fields(lesson_id = %id), err)]
    async fn update_lesson(&self, id: LessonId, patch: LessonPatch) -> Result<Lesson, StoreError> {
        patch.validate()?;

        let mut tx = self.begin_bounded().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE lessons SET
                subject = COALESCE($2, subject),
                location = COALESCE($3, location),
                price = COALESCE($4, price),
                spaces = COALESCE($5, spaces),
                icon = COALESCE($6, icon)
            WHERE id = $1
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(patch.subject.as_deref().map(str::trim))
        .bind(patch.location.as_deref().map(str::trim))
        .bind(patch.price)
        .bind(patch.spaces.map(i64::from))
        .bind(patch.resolved_icon())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_lesson", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound);
        };

        let lesson = lesson_from_row(&row)?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(lesson)
    }

    #[instrument(
        skip(self, request),
        fields(lesson_count = request.lesson_ids.len(), seats = tracing::field::Empty),
        err
    )]
    async fn reserve(&self, request: OrderRequest) -> Result<Order, StoreError> {
        let valid = request.validate()?;
        let span = Span::current();

        let lesson_ids: Vec<Uuid> = valid.tally().lesson_ids().map(|id| *id.as_uuid()).collect();

        let mut tx = self.begin_bounded().await?;

        // Lock every touched row in id order before reading seat counts.
        let rows = sqlx::query(
            r#"
            SELECT id, spaces
            FROM lessons
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&lesson_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_lessons", e))?;

        let mut available = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id: Uuid = row
                .try_get("id")
                .map_err(|e| map_sqlx_error("decode_lesson", e))?;
            let spaces: i64 = row
                .try_get("spaces")
                .map_err(|e| map_sqlx_error("decode_lesson", e))?;
            available.insert(LessonId::from_uuid(id), spaces_from_db(spaces)?);
        }

        let plan = match plan_reservation(valid.tally(), |id| available.get(id).copied()) {
            Ok(plan) => plan,
            Err(e) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                tracing::warn!(error = %e, "reservation rejected");
                return Err(e.into());
            }
        };

        for d in &plan.decrements {
            sqlx::query("UPDATE lessons SET spaces = spaces - $2 WHERE id = $1")
                .bind(d.lesson_id.as_uuid())
                .bind(i64::from(d.requested))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("decrement_spaces", e))?;
        }

        // Postgres keeps microseconds; truncate so the returned order matches what is stored.
        let order = valid.into_order(OrderId::new(), Utc::now().trunc_subsecs(6));
        let stored_ids: Vec<Uuid> = order.lesson_ids.iter().map(|id| *id.as_uuid()).collect();

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_name, customer_phone, lesson_ids, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&stored_ids)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        span.record("seats", plan.total_seats());
        tracing::info!(order_id = %order.id, seats = plan.total_seats(), "reservation committed");
        Ok(order)
    }

    #[instrument(skip(self), err)]
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_name, customer_phone, lesson_ids, created_at
            FROM orders
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        rows.iter()
            .map(|row| {
                OrderRow::from_row(row)
                    .map(Order::from)
                    .map_err(|e| map_sqlx_error("decode_order", e))
            })
            .collect()
    }

    #[instrument(skip(self, lessons), fields(catalogue = lessons.len(), mode = ?mode), err)]
    async fn seed_lessons(
        &self,
        lessons: Vec<NewLesson>,
        mode: SeedMode,
    ) -> Result<SeedReport, StoreError> {
        let mut tx = self.begin_bounded().await?;

        // Serialize concurrent seeders; readers are unaffected.
        sqlx::query("LOCK TABLE lessons IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_lessons_table", e))?;

        if mode == SeedMode::Reset {
            for statement in ["DELETE FROM orders", "DELETE FROM lessons"] {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("reset", e))?;
            }
        }

        let existing = sqlx::query("SELECT subject, location FROM lessons")
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("load_natural_keys", e))?
            .iter()
            .map(|row| -> Result<(String, String), sqlx::Error> {
                let subject: String = row.try_get("subject")?;
                let location: String = row.try_get("location")?;
                Ok(NewLesson::new(subject, location, 0.0, 0).natural_key())
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error("load_natural_keys", e))?;

        let (fresh, skipped) = dedup_by_natural_key(existing, lessons);
        let fresh = fresh
            .into_iter()
            .map(|l| l.into_lesson(LessonId::new()))
            .collect::<Result<Vec<_>, _>>()?;

        for lesson in &fresh {
            Self::insert_lesson_tx(&mut tx, lesson).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(SeedReport {
            inserted: fresh.len(),
            skipped,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

fn lesson_from_row(row: &PgRow) -> Result<Lesson, StoreError> {
    let row = LessonRow::from_row(row).map_err(|e| map_sqlx_error("decode_lesson", e))?;
    row.try_into()
}

fn spaces_from_db(spaces: i64) -> Result<u32, StoreError> {
    u32::try_from(spaces)
        .map_err(|_| StoreError::storage(format!("stored spaces out of range: {spaces}")))
}

/// Escape `%`, `_` and `\` so user text is matched literally by `ILIKE`.
fn escape_like(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // Check constraint violation
                Some("23514") => StoreError::InvalidInput(msg),
                // lock_not_available / query_canceled: the bounded wait expired
                Some("55P03") | Some("57014") => {
                    StoreError::StorageFault(format!("timed out in {operation}: {}", db_err.message()))
                }
                _ => StoreError::StorageFault(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::StorageFault(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::StorageFault(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::StorageFault(format!("sqlx error in {operation}: {err}")),
    }
}

/// Database row representation of a lesson.
#[derive(Debug)]
struct LessonRow {
    id: Uuid,
    subject: String,
    location: String,
    price: f64,
    spaces: i64,
    icon: String,
}

impl<'r> FromRow<'r, PgRow> for LessonRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            subject: row.try_get("subject")?,
            location: row.try_get("location")?,
            price: row.try_get("price")?,
            spaces: row.try_get("spaces")?,
            icon: row.try_get("icon")?,
        })
    }
}

impl TryFrom<LessonRow> for Lesson {
    type Error = StoreError;

    fn try_from(row: LessonRow) -> Result<Self, Self::Error> {
        Ok(Lesson {
            id: LessonId::from_uuid(row.id),
            subject: row.subject,
            location: row.location,
            price: row.price,
            spaces: spaces_from_db(row.spaces)?,
            icon: row.icon,
        })
    }
}

/// Database row representation of an order.
#[derive(Debug)]
struct OrderRow {
    id: Uuid,
    customer_name: String,
    customer_phone: String,
    lesson_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            customer_name: row.try_get("customer_name")?,
            customer_phone: row.try_get("customer_phone")?,
            lesson_ids: row.try_get("lesson_ids")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: OrderId::from_uuid(row.id),
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            lesson_ids: row.lesson_ids.into_iter().map(LessonId::from_uuid).collect(),
            created_at: row.created_at,
        }
    }
}
