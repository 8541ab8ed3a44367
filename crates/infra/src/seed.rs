//! Demo catalogue and seed/reset support.

use std::collections::HashSet;
use std::str::FromStr;

use thiserror::Error;

use afterschool_lessons::NewLesson;

/// How a seed run treats existing data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeedMode {
    /// Insert only lessons whose `(subject, location)` pair is not present yet.
    Merge,
    /// Delete all lessons and orders first, then insert the catalogue.
    Reset,
}

impl FromStr for SeedMode {
    type Err = SeedModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(SeedMode::Merge),
            "reset" => Ok(SeedMode::Reset),
            other => Err(SeedModeParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown seed mode '{0}' (expected merge or reset)")]
pub struct SeedModeParseError(pub String);

/// Outcome of a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Split a catalogue into lessons to insert and a skip count.
///
/// A lesson is skipped when its natural key is already stored or appears
/// earlier in the same batch.
pub fn dedup_by_natural_key<I>(existing: I, lessons: Vec<NewLesson>) -> (Vec<NewLesson>, usize)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut seen: HashSet<(String, String)> = existing.into_iter().collect();
    let mut skipped = 0;
    let mut fresh = Vec::with_capacity(lessons.len());

    for lesson in lessons {
        if seen.insert(lesson.natural_key()) {
            fresh.push(lesson);
        } else {
            skipped += 1;
        }
    }

    (fresh, skipped)
}

/// Demo catalogue loaded on first start.
pub fn default_catalogue() -> Vec<NewLesson> {
    [
        ("Math", "Hendon", 100.0),
        ("Math", "Colindale", 80.0),
        ("English", "Brent Cross", 90.0),
        ("English", "Golders Green", 95.0),
        ("Science", "Hendon", 110.0),
        ("Music", "Camden", 85.0),
        ("Art", "Finchley", 70.0),
        ("History", "Mill Hill", 75.0),
        ("Geography", "Edgware", 75.0),
        ("Coding", "Kings Cross", 120.0),
        ("Drama", "Hampstead", 90.0),
        ("Chess", "Barnet", 60.0),
    ]
    .into_iter()
    .map(|(subject, location, price)| NewLesson::new(subject, location, price, 5))
    .collect()
}
