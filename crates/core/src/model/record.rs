use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::model::options_literal::parse_string_list;
use crate::model::question::{MAX_CORRECT_ANSWERS, Question};

//
// ─── FIELDS ────────────────────────────────────────────────────────────────────
//

/// Required columns of a question row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Question,
    Options,
    Correct,
}

impl RecordField {
    pub const ALL: [RecordField; 3] = [Self::Question, Self::Options, Self::Correct];

    /// Column header used in tabular input.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Options => "options",
            Self::Correct => "correct",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(RecordField),

    #[error("options must be a list of quoted strings: {reason}")]
    InvalidOptionsFormat { reason: String },

    #[error("no options provided")]
    EmptyOptions,

    #[error("correct answer indices cannot be empty")]
    MissingCorrectAnswer,

    #[error("`{token}` is not a valid answer index")]
    InvalidCorrectAnswerFormat { token: String },

    #[error("correct index {index} out of range for {len} options")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("at most 6 correct answers allowed, found {count}")]
    TooManyCorrectAnswers { count: usize },

    #[error("at least one correct answer required")]
    NoCorrectAnswer,
}

//
// ─── RAW RECORD ────────────────────────────────────────────────────────────────
//

/// One loosely-typed input row. `None` means the cell is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question: Option<String>,
    pub options: Option<String>,
    pub correct: Option<String>,
}

impl QuestionRecord {
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        options: impl Into<String>,
        correct: impl Into<String>,
    ) -> Self {
        Self {
            question: Some(question.into()),
            options: Some(options.into()),
            correct: Some(correct.into()),
        }
    }

    /// Checks every constraint and builds the canonical `Question`.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` encountered, checking the question
    /// text, then the options, then the correct-answer indices.
    pub fn validate(&self) -> Result<Question, ValidationError> {
        let text = self
            .question
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .ok_or(ValidationError::MissingField(RecordField::Question))?;

        let raw_options = self
            .options
            .as_deref()
            .ok_or(ValidationError::MissingField(RecordField::Options))?;
        let options = parse_string_list(raw_options).map_err(|err| {
            ValidationError::InvalidOptionsFormat {
                reason: err.to_string(),
            }
        })?;
        if options.is_empty() {
            return Err(ValidationError::EmptyOptions);
        }

        let raw_correct = self
            .correct
            .as_deref()
            .ok_or(ValidationError::MissingField(RecordField::Correct))?;
        let indices = parse_correct_indices(raw_correct, options.len())?;

        Ok(Question::from_validated(text.to_owned(), options, &indices))
    }
}

impl fmt::Display for QuestionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |value: &Option<String>| value.clone().unwrap_or_else(|| "<absent>".into());
        write!(
            f,
            "question={:?}, options={:?}, correct={:?}",
            cell(&self.question),
            cell(&self.options),
            cell(&self.correct)
        )
    }
}

/// Decodes a comma-separated list of 0-based indices into a deduplicated set.
fn parse_correct_indices(raw: &str, len: usize) -> Result<BTreeSet<usize>, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::MissingCorrectAnswer);
    }

    let mut indices = BTreeSet::new();
    for token in raw.split(',').map(str::trim) {
        let index: i64 = token
            .parse()
            .map_err(|_| ValidationError::InvalidCorrectAnswerFormat {
                token: token.to_owned(),
            })?;
        let position = usize::try_from(index)
            .ok()
            .filter(|&idx| idx < len)
            .ok_or(ValidationError::IndexOutOfRange { index, len })?;
        indices.insert(position);
    }

    if indices.len() > MAX_CORRECT_ANSWERS {
        return Err(ValidationError::TooManyCorrectAnswers {
            count: indices.len(),
        });
    }
    if indices.is_empty() {
        return Err(ValidationError::NoCorrectAnswer);
    }
    Ok(indices)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
