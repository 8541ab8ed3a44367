//! Fixed subject → icon lookup.
//!
//! Icons are Font Awesome class strings rendered by the storefront. The table
//! is static configuration; lookups are case-insensitive on the trimmed subject.

/// Icon used when a subject has no entry in the table.
pub const DEFAULT_ICON: &str = "fa-solid fa-book-open";

const SUBJECT_ICONS: &[(&str, &str)] = &[
    ("math", "fa-solid fa-calculator"),
    ("mathematics", "fa-solid fa-calculator"),
    ("english", "fa-solid fa-book"),
    ("science", "fa-solid fa-flask"),
    ("music", "fa-solid fa-music"),
    ("art", "fa-solid fa-palette"),
    ("history", "fa-solid fa-landmark"),
    ("geography", "fa-solid fa-earth-europe"),
    ("coding", "fa-solid fa-code"),
    ("programming", "fa-solid fa-code"),
    ("drama", "fa-solid fa-masks-theater"),
    ("sport", "fa-solid fa-futbol"),
    ("sports", "fa-solid fa-futbol"),
    ("football", "fa-solid fa-futbol"),
    ("chess", "fa-solid fa-chess"),
    ("dance", "fa-solid fa-person-running"),
];

/// Select the display icon for a subject, falling back to [`DEFAULT_ICON`].
pub fn icon_for_subject(subject: &str) -> &'static str {
    let subject = subject.trim();
    SUBJECT_ICONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(subject))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}
