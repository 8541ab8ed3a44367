use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use afterschool_core::{DomainError, DomainResult, LessonId, OrderId};

use crate::reservation::SeatTally;

/// Durable record of seats reserved by a customer. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_phone: String,
    /// Lessons in the order the customer submitted them; duplicates are extra seats.
    pub lesson_ids: Vec<LessonId>,
    pub created_at: DateTime<Utc>,
}

/// Incoming order placement request (`POST /orders` body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub lesson_ids: Vec<LessonId>,
}

impl OrderRequest {
    pub fn new(
        customer_name: impl Into<String>,
        customer_phone: impl Into<String>,
        lesson_ids: Vec<LessonId>,
    ) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_phone: customer_phone.into(),
            lesson_ids,
        }
    }

    /// Check required fields and tally the requested seats per lesson.
    pub fn validate(self) -> DomainResult<ValidOrderRequest> {
        let customer_name = self.customer_name.trim().to_string();
        let customer_phone = self.customer_phone.trim().to_string();

        if customer_name.is_empty() {
            return Err(DomainError::validation("customerName is required"));
        }
        if customer_phone.is_empty() {
            return Err(DomainError::validation("customerPhone is required"));
        }
        if self.lesson_ids.is_empty() {
            return Err(DomainError::validation("lessonIds must contain at least one lesson"));
        }

        let tally = SeatTally::from_ids(&self.lesson_ids);
        Ok(ValidOrderRequest {
            customer_name,
            customer_phone,
            lesson_ids: self.lesson_ids,
            tally,
        })
    }
}

/// An order request that passed validation. Only this type can become an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidOrderRequest {
    customer_name: String,
    customer_phone: String,
    lesson_ids: Vec<LessonId>,
    tally: SeatTally,
}

impl ValidOrderRequest {
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_phone(&self) -> &str {
        &self.customer_phone
    }

    pub fn lesson_ids(&self) -> &[LessonId] {
        &self.lesson_ids
    }

    pub fn tally(&self) -> &SeatTally {
        &self.tally
    }

    /// Materialize the committed order record.
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            lesson_ids: self.lesson_ids,
            created_at,
        }
    }
}
