use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("translation has {actual} options, question has {expected}")]
pub struct TranslationLengthMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Display-only translation of a question.
///
/// `options()[i]` is the translation of the canonical option at position `i`.
/// Translated strings are never stored as answers; a selection is kept as
/// option positions and resolved against the canonical options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedView {
    text: String,
    options: Vec<String>,
}

impl TranslatedView {
    #[must_use]
    pub fn new(text: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }
}
