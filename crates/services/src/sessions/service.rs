use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use exam_core::Clock;
use exam_core::model::{AnswerSet, ExamItem};
use exam_core::scoring::{self, Report};

use super::progress::{ExamProgress, QuestionStatus, ReviewEntry};
use crate::bank::QuestionBank;
use crate::error::{SessionError, TranslationError};
use crate::translation::{TranslationRequest, TranslationResponse};

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Paused,
}

/// Lifecycle of an exam. `Submitted` returns to `InProgress` only via `start`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    NotStarted,
    InProgress { timer: TimerState },
    Submitted { report: Box<Report> },
}

/// Result of a navigation request. Out-of-bounds moves are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved(usize),
    AtFirstQuestion,
    /// `next` on the last question; the exam must be submitted.
    AtLastQuestion,
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining: u32 },
    Paused,
    /// Time ran out and the exam was submitted.
    Expired,
    /// No exam in progress; the tick was ignored.
    Idle,
}

#[derive(Debug)]
pub enum TranslationOutcome {
    /// The translated view already has what it needs.
    NotNeeded,
    Applied,
    /// Translation failed; the canonical text stays on display.
    Fallback(TranslationError),
    /// The response belongs to an earlier or finished exam.
    Discarded,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory exam session.
///
/// Owns the drawn questions, the current position, the pending selection for
/// the current question (as option positions), the countdown, and the
/// penalty count. Answers are committed in canonical form before every
/// navigation, flag, view toggle, and submission.
pub struct ExamSession {
    phase: SessionPhase,
    items: Vec<ExamItem>,
    current: usize,
    time_remaining: u32,
    penalties: usize,
    translated_view: bool,
    selection: Vec<usize>,
    generation: u64,
    clock: Clock,
    started_at: Option<DateTime<Utc>>,
}

impl Default for ExamSession {
    fn default() -> Self {
        Self::new(Clock::default())
    }
}

impl ExamSession {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            items: Vec::new(),
            current: 0,
            time_remaining: 0,
            penalties: 0,
            translated_view: false,
            selection: Vec::new(),
            generation: 0,
            clock,
            started_at: None,
        }
    }

    /// Draw questions from `bank` and begin the countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyInProgress` while an exam is running,
    /// `InvalidQuestionCount`/`InvalidTimeLimit` for zero values, and
    /// `EmptyBank` when nothing can be drawn.
    pub fn start(
        &mut self,
        bank: &QuestionBank,
        num_questions: usize,
        time_limit_seconds: u32,
    ) -> Result<(), SessionError> {
        self.start_with_rng(bank, num_questions, time_limit_seconds, &mut rand::rng())
    }

    /// Same as `start` with a caller-supplied RNG.
    ///
    /// # Errors
    ///
    /// See `start`.
    pub fn start_with_rng<R: Rng + ?Sized>(
        &mut self,
        bank: &QuestionBank,
        num_questions: usize,
        time_limit_seconds: u32,
        rng: &mut R,
    ) -> Result<(), SessionError> {
        if matches!(self.phase, SessionPhase::InProgress { .. }) {
            return Err(SessionError::AlreadyInProgress);
        }
        if num_questions < 1 {
            return Err(SessionError::InvalidQuestionCount);
        }
        if time_limit_seconds < 1 {
            return Err(SessionError::InvalidTimeLimit);
        }
        let items = bank.sample_with(num_questions, rng);
        if items.is_empty() {
            return Err(SessionError::EmptyBank);
        }

        self.items = items;
        self.current = 0;
        self.penalties = 0;
        self.time_remaining = time_limit_seconds;
        self.translated_view = false;
        self.generation += 1;
        self.started_at = Some(self.clock.now());
        self.phase = SessionPhase::InProgress {
            timer: TimerState::Running,
        };
        self.load_selection();

        info!(
            questions = self.items.len(),
            seconds = time_limit_seconds,
            "exam started"
        );
        Ok(())
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, SessionPhase::InProgress { .. })
    }

    #[must_use]
    pub fn report(&self) -> Option<&Report> {
        match &self.phase {
            SessionPhase::Submitted { report } => Some(report),
            _ => None,
        }
    }

    /// Final score; zero until submitted.
    #[must_use]
    pub fn score(&self) -> usize {
        self.report().map_or(0, |report| report.score)
    }

    #[must_use]
    pub fn items(&self) -> &[ExamItem] {
        &self.items
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&ExamItem> {
        self.items.get(self.current)
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn penalties(&self) -> usize {
        self.penalties
    }

    #[must_use]
    pub fn is_translated_view(&self) -> bool {
        self.translated_view
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Pending selection for the current question, as displayed.
    #[must_use]
    pub fn selection(&self) -> Vec<&str> {
        let options = self.display_options();
        self.selection
            .iter()
            .filter_map(|&idx| options.get(idx).map(String::as_str))
            .collect()
    }

    /// Option positions of the pending selection.
    #[must_use]
    pub fn selected_positions(&self) -> &[usize] {
        &self.selection
    }

    /// Question text in the active view.
    #[must_use]
    pub fn display_text(&self) -> Option<&str> {
        self.current_item()
            .map(|item| item.display_text(self.translated_view))
    }

    /// Options in the active view, index-aligned with the canonical options.
    #[must_use]
    pub fn display_options(&self) -> &[String] {
        match self.current_item() {
            Some(item) => item.display_options(self.translated_view),
            None => &[],
        }
    }

    //
    // ─── SELECTION ─────────────────────────────────────────────────────────────
    //

    /// Replace the pending selection with `label` (radio-button semantics).
    ///
    /// When two displayed options share a label the first one is chosen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownOption` if `label` is not displayed, or a
    /// phase error when no exam is running.
    pub fn choose(&mut self, label: &str) -> Result<(), SessionError> {
        let index = self.position_of(label)?;
        self.choose_index(index)
    }

    /// Add or remove `label` (checkbox semantics). On a single-choice
    /// question this selects `label`, or clears it if already selected.
    ///
    /// # Errors
    ///
    /// See `choose`.
    pub fn toggle(&mut self, label: &str) -> Result<(), SessionError> {
        let index = self.position_of(label)?;
        self.toggle_index(index)
    }

    /// `choose` by 0-based option position.
    ///
    /// # Errors
    ///
    /// See `choose`.
    pub fn choose_index(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_position(index)?;
        self.selection = vec![index];
        Ok(())
    }

    /// `toggle` by 0-based option position.
    ///
    /// # Errors
    ///
    /// See `choose`.
    pub fn toggle_index(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_position(index)?;
        let multiple = self
            .current_item()
            .is_some_and(|item| item.question().is_multiple_choice());
        if let Some(pos) = self.selection.iter().position(|&s| s == index) {
            self.selection.remove(pos);
        } else if multiple {
            self.selection.push(index);
        } else {
            self.selection = vec![index];
        }
        Ok(())
    }

    fn position_of(&self, label: &str) -> Result<usize, SessionError> {
        self.ensure_in_progress()?;
        self.display_options()
            .iter()
            .position(|option| option == label)
            .ok_or_else(|| SessionError::UnknownOption(label.to_owned()))
    }

    fn check_position(&self, index: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if index < self.display_options().len() {
            Ok(())
        } else {
            Err(SessionError::UnknownOption(format!("#{}", index + 1)))
        }
    }

    /// Commit the pending selection to the current question in canonical form.
    ///
    /// Selected positions index the canonical options directly, so the
    /// translated vocabulary never reaches the stored answer. An empty
    /// selection clears the answer.
    ///
    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn save_current_answer(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.commit_selection();
        Ok(())
    }

    fn commit_selection(&mut self) {
        let Some(item) = self.items.get_mut(self.current) else {
            return;
        };
        let take = if item.question().is_multiple_choice() {
            self.selection.len()
        } else {
            1
        };
        item.record_positions(self.selection.iter().take(take).copied());
    }

    /// Re-seed the pending selection from the stored answer.
    fn load_selection(&mut self) {
        self.selection = self
            .items
            .get(self.current)
            .map(ExamItem::answer_positions)
            .unwrap_or_default();
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn next(&mut self) -> Result<Navigation, SessionError> {
        self.save_current_answer()?;
        if self.current + 1 >= self.items.len() {
            return Ok(Navigation::AtLastQuestion);
        }
        Ok(self.move_to(self.current + 1))
    }

    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn prev(&mut self) -> Result<Navigation, SessionError> {
        self.save_current_answer()?;
        if self.current == 0 {
            return Ok(Navigation::AtFirstQuestion);
        }
        Ok(self.move_to(self.current - 1))
    }

    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn go_to(&mut self, index: usize) -> Result<Navigation, SessionError> {
        self.save_current_answer()?;
        if index >= self.items.len() {
            return Ok(Navigation::OutOfRange);
        }
        Ok(self.move_to(index))
    }

    /// Clear the current answer, then behave as `next`.
    ///
    /// Flag and viewed state are left untouched.
    ///
    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn skip(&mut self) -> Result<Navigation, SessionError> {
        self.ensure_in_progress()?;
        self.selection.clear();
        if let Some(item) = self.items.get_mut(self.current) {
            item.clear_answers();
        }
        self.next()
    }

    fn move_to(&mut self, index: usize) -> Navigation {
        self.current = index;
        self.load_selection();
        debug!(index, "moved to question");
        Navigation::Moved(index)
    }

    //
    // ─── FLAG / VIEW ANSWER ────────────────────────────────────────────────────
    //

    /// Commit the answer, then toggle the flag. Returns the new flag value.
    ///
    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn flag(&mut self) -> Result<bool, SessionError> {
        self.save_current_answer()?;
        Ok(self
            .items
            .get_mut(self.current)
            .is_some_and(ExamItem::toggle_flag))
    }

    /// Reveal the correct answers of the current question.
    ///
    /// The first reveal costs one penalty point; later reveals are free. The
    /// stored answer and pending selection are always cleared.
    ///
    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn view_answer(&mut self) -> Result<AnswerSet, SessionError> {
        self.ensure_in_progress()?;
        self.selection.clear();
        let Some(item) = self.items.get_mut(self.current) else {
            return Err(SessionError::NotStarted);
        };
        if item.reveal_answer() {
            self.penalties += 1;
            info!(index = self.current, penalties = self.penalties, "answer viewed");
        }
        Ok(item.question().correct_answers().clone())
    }

    //
    // ─── TRANSLATED VIEW ───────────────────────────────────────────────────────
    //

    /// Flip between canonical and translated display.
    ///
    /// Returns a request when the translated view needs a translation of the
    /// current question that is not cached yet.
    ///
    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn toggle_translated_view(&mut self) -> Result<Option<TranslationRequest>, SessionError> {
        self.save_current_answer()?;
        self.translated_view = !self.translated_view;
        self.load_selection();
        debug!(translated = self.translated_view, "toggled translated view");
        Ok(self.translation_request())
    }

    /// A request for the current question if the translated view lacks one.
    #[must_use]
    pub fn translation_request(&self) -> Option<TranslationRequest> {
        if !self.is_in_progress() || !self.translated_view {
            return None;
        }
        let item = self.current_item()?;
        if item.has_translation() {
            return None;
        }
        Some(TranslationRequest {
            generation: self.generation,
            index: self.current,
            text: item.question().text().to_owned(),
            options: item.question().options().to_vec(),
        })
    }

    /// Install a finished translation.
    ///
    /// Failures are not cached, so a later request retries. Responses from an
    /// earlier exam or arriving after submission are discarded.
    pub fn apply_translation(&mut self, response: TranslationResponse) -> TranslationOutcome {
        if !self.is_in_progress()
            || response.generation != self.generation
            || response.index >= self.items.len()
        {
            return TranslationOutcome::Discarded;
        }

        let view = match response.result {
            Ok(view) => view,
            Err(err) => {
                warn!(index = response.index, error = %err, "translation failed; showing original text");
                return TranslationOutcome::Fallback(err);
            }
        };

        let is_current = response.index == self.current;
        if is_current {
            self.commit_selection();
        }
        if let Err(mismatch) = self.items[response.index].set_translation(view) {
            warn!(index = response.index, error = %mismatch, "translation rejected");
            return TranslationOutcome::Fallback(mismatch.into());
        }
        if is_current {
            self.load_selection();
        }
        TranslationOutcome::Applied
    }

    //
    // ─── TIMER ─────────────────────────────────────────────────────────────────
    //

    /// Advance the countdown by one second; submits when it reaches zero.
    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            SessionPhase::InProgress {
                timer: TimerState::Running,
            } => {}
            SessionPhase::InProgress {
                timer: TimerState::Paused,
            } => return TickOutcome::Paused,
            _ => return TickOutcome::Idle,
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return TickOutcome::Running {
                remaining: self.time_remaining,
            };
        }

        warn!("time limit reached; submitting exam");
        self.finalize(true);
        TickOutcome::Expired
    }

    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn pause_timer(&mut self) -> Result<(), SessionError> {
        self.set_timer(TimerState::Paused)
    }

    /// # Errors
    ///
    /// Returns a phase error when no exam is running.
    pub fn resume_timer(&mut self) -> Result<(), SessionError> {
        self.set_timer(TimerState::Running)
    }

    #[must_use]
    pub fn timer_state(&self) -> Option<TimerState> {
        match self.phase {
            SessionPhase::InProgress { timer } => Some(timer),
            _ => None,
        }
    }

    fn set_timer(&mut self, state: TimerState) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.phase = SessionPhase::InProgress { timer: state };
        Ok(())
    }

    //
    // ─── REVIEW / SUBMIT ───────────────────────────────────────────────────────
    //

    /// Positions with no stored answer whose answer was not viewed.
    #[must_use]
    pub fn unanswered_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_unanswered())
            .map(|(idx, _)| idx)
            .collect()
    }

    #[must_use]
    pub fn status(&self, index: usize) -> Option<QuestionStatus> {
        let item = self.items.get(index)?;
        let status = if index == self.current && self.is_in_progress() {
            QuestionStatus::Current
        } else if item.state().flagged() {
            QuestionStatus::Flagged
        } else if item.is_answered() {
            QuestionStatus::Answered
        } else if item.state().answer_viewed() {
            QuestionStatus::Viewed
        } else {
            QuestionStatus::Unanswered
        };
        Some(status)
    }

    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        ExamProgress {
            position: if self.items.is_empty() { 0 } else { self.current + 1 },
            total: self.items.len(),
            answered: self.items.iter().filter(|item| item.is_answered()).count(),
            flagged: self.items.iter().filter(|item| item.state().flagged()).count(),
            viewed: self
                .items
                .iter()
                .filter(|item| item.state().answer_viewed())
                .count(),
        }
    }

    #[must_use]
    pub fn review_entries(&self) -> Vec<ReviewEntry> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| ReviewEntry {
                number: idx + 1,
                question: item.question().text().to_owned(),
                answer: item.answer_summary(),
                answer_viewed: item.state().answer_viewed(),
                flagged: item.state().flagged(),
            })
            .collect()
    }

    /// Commit the current answer, stop the timer, and score the exam.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` or `NotStarted` outside `InProgress`.
    pub fn submit(&mut self) -> Result<&Report, SessionError> {
        self.ensure_in_progress()?;
        self.finalize(false);
        self.report().ok_or(SessionError::NotStarted)
    }

    fn finalize(&mut self, timed_out: bool) {
        self.commit_selection();
        let submitted_at = self.clock.now();
        let started_at = self.started_at.unwrap_or(submitted_at);
        let report =
            scoring::score(&self.items, self.penalties).with_timing(started_at, submitted_at, timed_out);
        info!(
            correct = report.correct_count,
            total = report.total,
            penalties = report.penalties,
            score = report.score,
            timed_out,
            "exam submitted"
        );
        self.phase = SessionPhase::Submitted {
            report: Box::new(report),
        };
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::InProgress { .. } => Ok(()),
            SessionPhase::NotStarted => Err(SessionError::NotStarted),
            SessionPhase::Submitted { .. } => Err(SessionError::AlreadySubmitted),
        }
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("phase", &self.phase)
            .field("items_len", &self.items.len())
            .field("current", &self.current)
            .field("time_remaining", &self.time_remaining)
            .field("penalties", &self.penalties)
            .field("translated_view", &self.translated_view)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::translation::TranslationPort;
    use exam_core::model::QuestionRecord;

    fn bank(records: &[QuestionRecord]) -> QuestionBank {
        let mut bank = QuestionBank::new();
        bank.load_all(records).unwrap();
        bank
    }

    fn single(correct: &str) -> QuestionBank {
        bank(&[QuestionRecord::new("Pick", r#"["A","B","C","D"]"#, correct)])
    }

    fn started(bank: &QuestionBank, count: usize, seconds: u32) -> ExamSession {
        let mut session = ExamSession::new(exam_core::time::fixed_clock());
        session
            .start_with_rng(bank, count, seconds, &mut StdRng::seed_from_u64(1))
            .unwrap();
        session
    }

    fn position_of(session: &ExamSession, text: &str) -> usize {
        session
            .items()
            .iter()
            .position(|item| item.question().text() == text)
            .unwrap()
    }

    struct Suffix;

    #[async_trait]
    impl TranslationPort for Suffix {
        async fn translate(&self, text: &str) -> Result<String, TranslationError> {
            Ok(format!("{text}-es"))
        }
    }

    struct Broken;

    #[async_trait]
    impl TranslationPort for Broken {
        async fn translate(&self, _text: &str) -> Result<String, TranslationError> {
            Err(TranslationError::Provider("offline".into()))
        }
    }

    #[test]
    fn start_rejects_bad_input() {
        let mut session = ExamSession::default();
        assert_eq!(
            session.start(&QuestionBank::new(), 5, 60),
            Err(SessionError::EmptyBank)
        );
        let bank = single("0");
        assert_eq!(session.start(&bank, 0, 60), Err(SessionError::InvalidQuestionCount));
        assert_eq!(session.start(&bank, 1, 0), Err(SessionError::InvalidTimeLimit));
        assert_eq!(session.phase(), &SessionPhase::NotStarted);

        session.start(&bank, 5, 60).unwrap();
        assert_eq!(session.total_questions(), 1);
        assert_eq!(session.start(&bank, 1, 60), Err(SessionError::AlreadyInProgress));
    }

    #[test]
    fn operations_require_a_running_exam() {
        let mut session = ExamSession::default();
        assert_eq!(session.next(), Err(SessionError::NotStarted));
        assert_eq!(session.choose("A"), Err(SessionError::NotStarted));
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert!(session.submit().is_err());
    }

    #[test]
    fn answers_survive_navigation() {
        let bank = bank(&[
            QuestionRecord::new("Q1", r#"["A","B"]"#, "0"),
            QuestionRecord::new("Q2", r#"["C","D"]"#, "1"),
        ]);
        let mut session = started(&bank, 2, 60);
        let label = session.display_options()[1].clone();
        session.choose(&label).unwrap();
        assert_eq!(session.next().unwrap(), Navigation::Moved(1));
        assert!(session.selection().is_empty());
        assert_eq!(session.prev().unwrap(), Navigation::Moved(0));
        assert_eq!(session.selection(), [label.clone()]);
        assert!(session.items()[0].state().user_answers().unwrap().contains(&label));
    }

    #[test]
    fn navigation_bounds_are_no_ops() {
        let bank = bank(&[
            QuestionRecord::new("Q1", r#"["A","B"]"#, "0"),
            QuestionRecord::new("Q2", r#"["A","B"]"#, "0"),
        ]);
        let mut session = started(&bank, 2, 60);
        assert_eq!(session.prev().unwrap(), Navigation::AtFirstQuestion);
        assert_eq!(session.go_to(5).unwrap(), Navigation::OutOfRange);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.go_to(1).unwrap(), Navigation::Moved(1));
        assert_eq!(session.next().unwrap(), Navigation::AtLastQuestion);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn single_choice_keeps_one_answer() {
        let mut session = started(&single("2"), 1, 60);
        session.toggle("A").unwrap();
        session.toggle("C").unwrap();
        assert_eq!(session.selection(), ["C"]);
        session.toggle("C").unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(
            session.choose("Z"),
            Err(SessionError::UnknownOption("Z".into()))
        );
        assert!(session.choose_index(9).is_err());
    }

    #[test]
    fn multiple_choice_collects_answers() {
        let mut session = started(&single("0,3"), 1, 60);
        session.toggle_index(3).unwrap();
        session.toggle_index(0).unwrap();
        session.save_current_answer().unwrap();
        assert!(session.items()[0].is_correct());
        assert_eq!(session.items()[0].answer_summary().as_deref(), Some("A, D"));
    }

    #[test]
    fn viewing_answer_costs_one_point_once() {
        let mut session = started(&single("1"), 1, 60);
        session.choose("B").unwrap();
        let revealed = session.view_answer().unwrap();
        assert!(revealed.contains("B"));
        assert_eq!(session.penalties(), 1);
        assert!(session.selection().is_empty());
        session.view_answer().unwrap();
        assert_eq!(session.penalties(), 1);

        let report = session.submit().unwrap();
        assert_eq!(report.correct_count, 0);
        assert_eq!(report.penalties, 1);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn skip_clears_answer_but_keeps_flag() {
        let mut session = started(&single("0"), 1, 60);
        session.choose("A").unwrap();
        assert!(session.flag().unwrap());
        assert_eq!(session.skip().unwrap(), Navigation::AtLastQuestion);
        let item = &session.items()[0];
        assert!(item.state().user_answers().is_none());
        assert!(item.state().flagged());
        assert_eq!(session.unanswered_indices(), vec![0]);
    }

    #[test]
    fn flag_commits_pending_selection() {
        let mut session = started(&single("0"), 1, 60);
        session.choose("A").unwrap();
        session.flag().unwrap();
        assert!(session.items()[0].is_answered());
        assert!(!session.flag().unwrap());
    }

    #[test]
    fn timer_expiry_submits_once() {
        let mut session = started(&single("0"), 1, 2);
        session.choose("A").unwrap();
        assert_eq!(session.tick(), TickOutcome::Running { remaining: 1 });
        assert_eq!(session.tick(), TickOutcome::Expired);
        let report = session.report().unwrap();
        assert!(report.timed_out);
        assert_eq!(report.correct_count, 1);
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.time_remaining(), 0);
    }

    #[test]
    fn paused_timer_does_not_count_down() {
        let mut session = started(&single("0"), 1, 10);
        session.pause_timer().unwrap();
        assert_eq!(session.timer_state(), Some(TimerState::Paused));
        assert_eq!(session.tick(), TickOutcome::Paused);
        assert_eq!(session.time_remaining(), 10);
        session.resume_timer().unwrap();
        assert_eq!(session.tick(), TickOutcome::Running { remaining: 9 });
    }

    #[test]
    fn submit_is_terminal_until_restart() {
        let bank = single("0");
        let mut session = started(&bank, 1, 60);
        session.choose("A").unwrap();
        session.view_answer().unwrap();
        session.submit().unwrap();
        assert_eq!(session.submit().err(), Some(SessionError::AlreadySubmitted));
        assert_eq!(session.next(), Err(SessionError::AlreadySubmitted));

        session.start(&bank, 1, 60).unwrap();
        assert_eq!(session.penalties(), 0);
        assert_eq!(session.score(), 0);
        assert!(!session.items()[0].state().answer_viewed());
        assert!(session.items()[0].state().user_answers().is_none());
    }

    #[test]
    fn status_follows_precedence() {
        let bank = bank(&[
            QuestionRecord::new("Q1", r#"["A","B"]"#, "0"),
            QuestionRecord::new("Q2", r#"["A","B"]"#, "0"),
            QuestionRecord::new("Q3", r#"["A","B"]"#, "0"),
            QuestionRecord::new("Q4", r#"["A","B"]"#, "0"),
        ]);
        let mut session = started(&bank, 4, 60);
        session.go_to(1).unwrap();
        session.choose("A").unwrap();
        session.flag().unwrap();
        session.go_to(2).unwrap();
        session.choose("B").unwrap();
        session.go_to(3).unwrap();
        session.view_answer().unwrap();
        session.go_to(0).unwrap();

        assert_eq!(session.status(0), Some(QuestionStatus::Current));
        assert_eq!(session.status(1), Some(QuestionStatus::Flagged));
        assert_eq!(session.status(2), Some(QuestionStatus::Answered));
        assert_eq!(session.status(3), Some(QuestionStatus::Viewed));
        assert_eq!(session.status(4), None);

        let progress = session.progress();
        assert_eq!(
            progress,
            ExamProgress { position: 1, total: 4, answered: 2, flagged: 1, viewed: 1 }
        );
        let review = session.review_entries();
        assert_eq!(review[2].answer.as_deref(), Some("B"));
        assert!(review[3].answer_viewed);
    }

    #[tokio::test]
    async fn translated_selection_is_stored_canonically() {
        let bank = bank(&[
            QuestionRecord::new("Q1", r#"["A","B"]"#, "1"),
            QuestionRecord::new("Q2", r#"["C","D"]"#, "0"),
        ]);
        let mut session = started(&bank, 2, 60);
        let q1 = position_of(&session, "Q1");
        session.go_to(q1).unwrap();

        let request = session.toggle_translated_view().unwrap().unwrap();
        assert_eq!(session.display_text(), Some("Q1"));
        let response = request.run(&Suffix).await;
        assert!(matches!(session.apply_translation(response), TranslationOutcome::Applied));
        assert_eq!(session.display_text(), Some("Q1-es"));
        assert_eq!(session.display_options(), ["A-es", "B-es"]);

        session.choose("B-es").unwrap();
        session.save_current_answer().unwrap();
        assert!(session.items()[q1].is_correct());

        assert!(session.toggle_translated_view().unwrap().is_none());
        assert_eq!(session.selection(), ["B"]);
        assert!(session.toggle_translated_view().unwrap().is_none());
        assert_eq!(session.selection(), ["B-es"]);
    }

    #[test]
    fn report_spans_start_to_submission() {
        let mut session = started(&single("0"), 1, 600);
        session.clock.advance(chrono::Duration::seconds(90));
        let report = session.submit().unwrap();
        assert_eq!(report.started_at, Some(exam_core::time::fixed_now()));
        let elapsed = report.submitted_at.unwrap() - report.started_at.unwrap();
        assert_eq!(elapsed, chrono::Duration::seconds(90));
        assert!(!report.timed_out);
    }

    #[test]
    fn identical_translations_keep_the_chosen_position() {
        let bank = bank(&[QuestionRecord::new("Agree?", r#"["Yes","yes","No"]"#, "1")]);
        let mut session = started(&bank, 1, 60);
        session.toggle_translated_view().unwrap();
        let response = TranslationResponse {
            generation: session.generation,
            index: 0,
            result: Ok(exam_core::model::TranslatedView::new(
                "De acuerdo?",
                vec!["Si".into(), "Si".into(), "No".into()],
            )),
        };
        assert!(matches!(session.apply_translation(response), TranslationOutcome::Applied));

        session.choose_index(1).unwrap();
        assert_eq!(session.selection(), ["Si"]);
        assert_eq!(session.selected_positions(), [1_usize]);
        session.save_current_answer().unwrap();
        let stored = session.items()[0].state().user_answers().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.contains("yes"));
        assert!(session.items()[0].is_correct());

        session.toggle_translated_view().unwrap();
        assert_eq!(session.selection(), ["yes"]);
        session.toggle_translated_view().unwrap();
        assert_eq!(session.selected_positions(), [1_usize]);
    }

    #[tokio::test]
    async fn failed_translation_falls_back_and_retries() {
        let mut session = started(&single("0"), 1, 60);
        let request = session.toggle_translated_view().unwrap().unwrap();
        let outcome = session.apply_translation(request.run(&Broken).await);
        assert!(matches!(outcome, TranslationOutcome::Fallback(_)));
        assert_eq!(session.display_options(), ["A", "B", "C", "D"]);
        assert!(!session.items()[0].has_translation());

        session.choose("A").unwrap();
        assert!(session.translation_request().is_some());
        assert!(session.toggle_translated_view().unwrap().is_none());
        assert!(session.toggle_translated_view().unwrap().is_some());
        assert_eq!(session.selection(), ["A"]);
    }

    #[tokio::test]
    async fn stale_translation_is_discarded() {
        let bank = single("0");
        let mut session = started(&bank, 1, 60);
        let request = session.toggle_translated_view().unwrap().unwrap();
        session.submit().unwrap();
        let response = request.clone().run(&Suffix).await;
        assert!(matches!(session.apply_translation(response), TranslationOutcome::Discarded));

        session.start(&bank, 1, 60).unwrap();
        let response = request.run(&Suffix).await;
        assert!(matches!(session.apply_translation(response), TranslationOutcome::Discarded));
        assert!(!session.items()[0].has_translation());
    }

    #[tokio::test]
    async fn mismatched_translation_is_rejected() {
        let mut session = started(&single("0"), 1, 60);
        session.toggle_translated_view().unwrap();
        let response = TranslationResponse {
            generation: session.generation,
            index: 0,
            result: Ok(exam_core::model::TranslatedView::new("Q", vec!["a".into()])),
        };
        let outcome = session.apply_translation(response);
        assert!(matches!(
            outcome,
            TranslationOutcome::Fallback(TranslationError::LengthMismatch(_))
        ));
        assert_eq!(session.display_options(), ["A", "B", "C", "D"]);
    }
}
