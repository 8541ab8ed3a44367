use serde::{Deserialize, Serialize};

use afterschool_core::{DomainError, DomainResult, LessonId, SeatShortfall};

use crate::icons::icon_for_subject;

/// A bookable lesson with a finite seat count.
///
/// `spaces` is unsigned, so a negative seat count is unrepresentable. Reservations
/// remove seats through [`Lesson::take_seats`], which refuses to go below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub subject: String,
    pub location: String,
    pub price: f64,
    pub spaces: u32,
    pub icon: String,
}

impl Lesson {
    /// Natural dedup key used by seed/reset.
    pub fn natural_key(&self) -> (String, String) {
        natural_key(&self.subject, &self.location)
    }

    /// Remove `count` seats, failing without mutation if not enough remain.
    pub fn take_seats(&mut self, count: u32) -> DomainResult<()> {
        match self.spaces.checked_sub(count) {
            Some(remaining) => {
                self.spaces = remaining;
                Ok(())
            }
            None => Err(DomainError::InsufficientSeats(vec![SeatShortfall {
                lesson_id: self.id,
                requested: count,
                available: self.spaces,
            }])),
        }
    }

    /// Apply a sparse update.
    ///
    /// The whole patch is validated before any field changes. A new `subject`
    /// re-derives `icon` unless the patch carries its own `icon`.
    pub fn apply_patch(&mut self, patch: &LessonPatch) -> DomainResult<()> {
        patch.validate()?;

        if let Some(subject) = &patch.subject {
            self.subject = subject.trim().to_string();
            self.icon = icon_for_subject(&self.subject).to_string();
        }
        if let Some(location) = &patch.location {
            self.location = location.trim().to_string();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(spaces) = patch.spaces {
            self.spaces = spaces;
        }
        if let Some(icon) = &patch.icon {
            self.icon = icon.trim().to_string();
        }
        Ok(())
    }
}

pub(crate) fn natural_key(subject: &str, location: &str) -> (String, String) {
    (
        subject.trim().to_lowercase(),
        location.trim().to_lowercase(),
    )
}

/// Author-supplied fields for a lesson that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLesson {
    pub subject: String,
    pub location: String,
    pub price: f64,
    pub spaces: u32,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewLesson {
    pub fn new(subject: impl Into<String>, location: impl Into<String>, price: f64, spaces: u32) -> Self {
        Self {
            subject: subject.into(),
            location: location.into(),
            price,
            spaces,
            icon: None,
        }
    }

    pub fn natural_key(&self) -> (String, String) {
        natural_key(&self.subject, &self.location)
    }

    /// Validate and materialize into a [`Lesson`] with the given id.
    pub fn into_lesson(self, id: LessonId) -> DomainResult<Lesson> {
        require_text("subject", &self.subject)?;
        require_text("location", &self.location)?;
        validate_price(self.price)?;
        if let Some(icon) = &self.icon {
            require_text("icon", icon)?;
        }

        let subject = self.subject.trim().to_string();
        let icon = match self.icon {
            Some(icon) => icon.trim().to_string(),
            None => icon_for_subject(&subject).to_string(),
        };

        Ok(Lesson {
            id,
            subject,
            location: self.location.trim().to_string(),
            price: self.price,
            spaces: self.spaces,
            icon,
        })
    }
}

/// Sparse update of lesson attributes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LessonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spaces: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl LessonPatch {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.location.is_none()
            && self.price.is_none()
            && self.spaces.is_none()
            && self.icon.is_none()
    }

    /// Reject empty patches and invalid field values.
    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation("update body cannot be empty"));
        }
        if let Some(subject) = &self.subject {
            require_text("subject", subject)?;
        }
        if let Some(location) = &self.location {
            require_text("location", location)?;
        }
        if let Some(icon) = &self.icon {
            require_text("icon", icon)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Icon the patched lesson ends up with, if the patch changes it.
    ///
    /// Backends that update in place (SQL) use this instead of `apply_patch`.
    pub fn resolved_icon(&self) -> Option<String> {
        match (&self.icon, &self.subject) {
            (Some(icon), _) => Some(icon.trim().to_string()),
            (None, Some(subject)) => Some(icon_for_subject(subject).to_string()),
            (None, None) => None,
        }
    }
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn validate_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("price must be a non-negative number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::DEFAULT_ICON;

    fn test_lesson() -> Lesson {
        NewLesson::new("Math", "Hendon", 100.0, 5)
            .into_lesson(LessonId::new())
            .unwrap()
    }

    #[test]
    fn new_lesson_derives_icon_from_subject() {
        let lesson = test_lesson();
        assert_eq!(lesson.icon, "fa-solid fa-calculator");
    }

    #[test]
    fn new_lesson_keeps_explicit_icon() {
        let mut new = NewLesson::new("Math", "Hendon", 100.0, 5);
        new.icon = Some("custom-icon".to_string());
        let lesson = new.into_lesson(LessonId::new()).unwrap();
        assert_eq!(lesson.icon, "custom-icon");
    }

    #[test]
    fn new_lesson_rejects_negative_price_and_blank_text() {
        let err = NewLesson::new("Math", "Hendon", -1.0, 5)
            .into_lesson(LessonId::new())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = NewLesson::new("  ", "Hendon", 1.0, 5)
            .into_lesson(LessonId::new())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn subject_patch_recomputes_icon_and_keeps_price_and_spaces() {
        let mut lesson = test_lesson();
        let patch = LessonPatch {
            subject: Some("Music".to_string()),
            ..LessonPatch::default()
        };

        lesson.apply_patch(&patch).unwrap();

        assert_eq!(lesson.subject, "Music");
        assert_eq!(lesson.icon, "fa-solid fa-music");
        assert_eq!(lesson.price, 100.0);
        assert_eq!(lesson.spaces, 5);
    }

    #[test]
    fn explicit_icon_wins_over_derived_icon() {
        let mut lesson = test_lesson();
        let patch = LessonPatch {
            subject: Some("Music".to_string()),
            icon: Some("fa-solid fa-guitar".to_string()),
            ..LessonPatch::default()
        };

        lesson.apply_patch(&patch).unwrap();
        assert_eq!(lesson.icon, "fa-solid fa-guitar");
        assert_eq!(patch.resolved_icon().as_deref(), Some("fa-solid fa-guitar"));
    }

    #[test]
    fn unknown_subject_patch_uses_default_icon() {
        let mut lesson = test_lesson();
        let patch = LessonPatch {
            subject: Some("Origami".to_string()),
            ..LessonPatch::default()
        };
        lesson.apply_patch(&patch).unwrap();
        assert_eq!(lesson.icon, DEFAULT_ICON);
    }

    #[test]
    fn empty_patch_is_rejected() {
        let mut lesson = test_lesson();
        let before = lesson.clone();
        let err = lesson.apply_patch(&LessonPatch::default()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(lesson, before);
    }

    #[test]
    fn invalid_patch_leaves_lesson_untouched() {
        let mut lesson = test_lesson();
        let before = lesson.clone();
        let patch = LessonPatch {
            subject: Some("Music".to_string()),
            price: Some(f64::NAN),
            ..LessonPatch::default()
        };
        assert!(lesson.apply_patch(&patch).is_err());
        assert_eq!(lesson, before);
    }

    #[test]
    fn patch_rejects_unknown_fields_when_deserialized() {
        let res: Result<LessonPatch, _> =
            serde_json::from_value(serde_json::json!({ "teacher": "Smith" }));
        assert!(res.is_err());
    }

    #[test]
    fn take_seats_never_goes_below_zero() {
        let mut lesson = test_lesson();
        lesson.take_seats(5).unwrap();
        assert_eq!(lesson.spaces, 0);

        let err = lesson.take_seats(1).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientSeats(_)));
        assert_eq!(lesson.spaces, 0);
    }

    #[test]
    fn lesson_serializes_in_camel_case() {
        let lesson = test_lesson();
        let json = serde_json::to_value(&lesson).unwrap();
        assert_eq!(json["subject"], "Math");
        assert_eq!(json["spaces"], 5);
        assert!(json.get("icon").is_some());
    }
}
