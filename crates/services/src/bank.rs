use std::sync::Arc;

use rand::Rng;
use rand::seq::index;
use tracing::info;

use exam_core::model::{ExamItem, Question, QuestionRecord};

use crate::error::ImportError;

/// Pool of validated questions that exams are drawn from.
///
/// Questions are shared with drawn exams through `Arc`; session state is never
/// stored here, so a redraw always starts from a fresh `QuestionState`.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    pool: Vec<Arc<Question>>,
}

impl QuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Arc<Question>] {
        &self.pool
    }

    /// Validates every record, then replaces the pool.
    ///
    /// All-or-nothing: on any failure the previous pool is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::InvalidRow` for the first invalid record (1-based)
    /// and `ImportError::NoQuestions` when `records` is empty.
    pub fn load_all(&mut self, records: &[QuestionRecord]) -> Result<usize, ImportError> {
        let validated = records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                record
                    .validate()
                    .map(Arc::new)
                    .map_err(|source| ImportError::InvalidRow {
                        row: idx + 1,
                        content: record.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if validated.is_empty() {
            return Err(ImportError::NoQuestions);
        }

        self.pool = validated;
        info!(count = self.pool.len(), "question bank loaded");
        Ok(self.pool.len())
    }

    /// Draws up to `count` distinct questions uniformly at random.
    #[must_use]
    pub fn sample(&self, count: usize) -> Vec<ExamItem> {
        self.sample_with(count, &mut rand::rng())
    }

    /// Same as `sample` with a caller-supplied RNG.
    ///
    /// Every returned item starts with reset session state.
    pub fn sample_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<ExamItem> {
        let amount = count.min(self.pool.len());
        if amount == 0 {
            return Vec::new();
        }
        index::sample(rng, self.pool.len(), amount)
            .into_iter()
            .map(|idx| ExamItem::new(Arc::clone(&self.pool[idx])))
            .collect()
    }
}
