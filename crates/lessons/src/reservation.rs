//! Reservation decision logic.
//!
//! Everything here is pure: given the seats requested and the seats currently
//! available, decide whether the whole batch can be taken and what each lesson
//! ends up with. Backends run this inside their isolated unit of work and then
//! write the plan back; they never decrement seats on their own.

use std::collections::BTreeMap;

use afterschool_core::{DomainError, DomainResult, LessonId, SeatShortfall};

/// Seats requested per distinct lesson.
///
/// Ordered by lesson id so backends can lock rows in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatTally(BTreeMap<LessonId, u32>);

impl SeatTally {
    /// Count one seat per occurrence of each id.
    pub fn from_ids(ids: &[LessonId]) -> Self {
        let mut counts = BTreeMap::new();
        for id in ids {
            let count: &mut u32 = counts.entry(*id).or_insert(0);
            *count = count.saturating_add(1);
        }
        Self(counts)
    }

    pub fn requested(&self, id: &LessonId) -> u32 {
        self.0.get(id).copied().unwrap_or(0)
    }

    pub fn lesson_ids(&self) -> impl Iterator<Item = &LessonId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LessonId, u32)> {
        self.0.iter().map(|(id, n)| (id, *n))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Seats taken from one lesson and what remains afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatDecrement {
    pub lesson_id: LessonId,
    pub requested: u32,
    pub remaining: u32,
}

/// Accepted reservation: one decrement per distinct lesson, in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationPlan {
    pub decrements: Vec<SeatDecrement>,
}

impl ReservationPlan {
    pub fn total_seats(&self) -> u64 {
        self.decrements.iter().map(|d| u64::from(d.requested)).sum()
    }
}

/// Decide a reservation against the currently available seats.
///
/// `available` returns `None` for unknown lessons. Unknown ids fail the batch
/// with `Validation`; otherwise every lesson short of seats is reported in a
/// single `InsufficientSeats`. Either way nothing is planned.
pub fn plan_reservation<F>(tally: &SeatTally, mut available: F) -> DomainResult<ReservationPlan>
where
    F: FnMut(&LessonId) -> Option<u32>,
{
    if tally.is_empty() {
        return Err(DomainError::validation("lessonIds must contain at least one lesson"));
    }

    let mut unknown = Vec::new();
    let mut shortfalls = Vec::new();
    let mut decrements = Vec::with_capacity(tally.len());

    for (lesson_id, requested) in tally.iter() {
        let Some(spaces) = available(lesson_id) else {
            unknown.push(lesson_id.to_string());
            continue;
        };

        match spaces.checked_sub(requested) {
            Some(remaining) => decrements.push(SeatDecrement {
                lesson_id: *lesson_id,
                requested,
                remaining,
            }),
            None => shortfalls.push(SeatShortfall {
                lesson_id: *lesson_id,
                requested,
                available: spaces,
            }),
        }
    }

    if !unknown.is_empty() {
        return Err(DomainError::validation(format!(
            "unknown lesson id(s): {}",
            unknown.join(", ")
        )));
    }
    if !shortfalls.is_empty() {
        return Err(DomainError::InsufficientSeats(shortfalls));
    }

    Ok(ReservationPlan { decrements })
}
