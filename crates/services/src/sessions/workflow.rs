use std::path::Path;
use std::sync::Arc;

use exam_core::model::{ExamSettings, QuestionRecord};
use tracing::info;

use crate::Clock;
use crate::bank::QuestionBank;
use crate::error::{ImportError, SessionError};
use crate::translation::TranslationPort;

use super::service::{ExamSession, TranslationOutcome};

/// Wires the question bank and the translator to exam sessions.
#[derive(Clone)]
pub struct ExamService {
    bank: QuestionBank,
    translator: Arc<dyn TranslationPort>,
    clock: Clock,
}

impl ExamService {
    #[must_use]
    pub fn new(translator: Arc<dyn TranslationPort>) -> Self {
        Self {
            bank: QuestionBank::new(),
            translator,
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Replace the bank with `records`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` if any record is invalid or none were given.
    pub fn import_records(&mut self, records: &[QuestionRecord]) -> Result<usize, ImportError> {
        self.bank.load_all(records)
    }

    /// Read a CSV file and replace the bank with its rows.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Storage` when the file cannot be read, otherwise
    /// see `import_records`.
    pub fn import_csv(&mut self, path: impl AsRef<Path>) -> Result<usize, ImportError> {
        let path = path.as_ref();
        let records = storage::read_records_from_path(path)?;
        let count = self.import_records(&records)?;
        info!(path = %path.display(), count, "imported questions");
        Ok(count)
    }

    #[must_use]
    pub fn new_session(&self) -> ExamSession {
        ExamSession::new(self.clock)
    }

    /// Start `session` with validated settings.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot start.
    pub fn start(&self, session: &mut ExamSession, settings: &ExamSettings) -> Result<(), SessionError> {
        let count = usize::try_from(settings.num_questions()).unwrap_or(usize::MAX);
        session.start(&self.bank, count, settings.time_limit_seconds())
    }

    /// Toggle the translated view and fetch a missing translation inline.
    ///
    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub async fn toggle_translation(
        &self,
        session: &mut ExamSession,
    ) -> Result<TranslationOutcome, SessionError> {
        let Some(request) = session.toggle_translated_view()? else {
            return Ok(TranslationOutcome::NotNeeded);
        };
        let response = request.run(self.translator.as_ref()).await;
        Ok(session.apply_translation(response))
    }

    /// Fetch the current question's translation if the translated view needs it.
    pub async fn ensure_translation(&self, session: &mut ExamSession) -> TranslationOutcome {
        let Some(request) = session.translation_request() else {
            return TranslationOutcome::NotNeeded;
        };
        let response = request.run(self.translator.as_ref()).await;
        session.apply_translation(response)
    }
}
