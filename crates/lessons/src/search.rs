use crate::lesson::Lesson;

/// Free-text lesson search.
///
/// The token matches `subject` or `location` as a case-insensitive substring.
/// When it also parses as a number it matches `price` equality, and `spaces`
/// equality when the number is a non-negative integer.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonSearch {
    token: String,
    number: Option<f64>,
}

impl LessonSearch {
    pub fn new(raw: &str) -> Self {
        let token = raw.trim().to_string();
        let number = token.parse::<f64>().ok().filter(|n| n.is_finite());
        Self { token, number }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Lower-cased token for substring matching.
    pub fn needle(&self) -> String {
        self.token.to_lowercase()
    }

    /// An empty search matches everything.
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    pub fn number(&self) -> Option<f64> {
        self.number
    }

    /// Seat count the token names, if it is a whole number that fits.
    pub fn spaces(&self) -> Option<u32> {
        self.number
            .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map(|n| n as u32)
    }

    pub fn matches(&self, lesson: &Lesson) -> bool {
        if self.is_empty() {
            return true;
        }

        let needle = self.needle();
        if lesson.subject.to_lowercase().contains(&needle)
            || lesson.location.to_lowercase().contains(&needle)
        {
            return true;
        }

        if let Some(n) = self.number {
            if lesson.price == n {
                return true;
            }
        }
        matches!(self.spaces(), Some(s) if lesson.spaces == s)
    }
}
