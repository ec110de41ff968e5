use std::collections::BTreeSet;
use std::sync::Arc;

use crate::model::translation::{TranslatedView, TranslationLengthMismatch};

/// Upper bound on distinct correct answers a question may declare.
pub const MAX_CORRECT_ANSWERS: usize = 6;

/// Order-independent set of option strings, always in canonical vocabulary.
pub type AnswerSet = BTreeSet<String>;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Canonical, validated question.
///
/// Created once by `QuestionRecord::validate` and never mutated afterwards.
/// Session-scoped state lives in `QuestionState`, attached through `ExamItem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_answers: AnswerSet,
    is_multiple_choice: bool,
}

impl Question {
    pub(crate) fn from_validated(
        text: String,
        options: Vec<String>,
        correct_indices: &BTreeSet<usize>,
    ) -> Self {
        let correct_answers: AnswerSet = correct_indices
            .iter()
            .filter_map(|&idx| options.get(idx).cloned())
            .collect();
        let is_multiple_choice = correct_answers.len() > 1;
        Self {
            text,
            options,
            correct_answers,
            is_multiple_choice,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Options in display order. Positions double as answer identity.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answers(&self) -> &AnswerSet {
        &self.correct_answers
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        self.is_multiple_choice
    }

    /// Position of `option` in the canonical options list.
    #[must_use]
    pub fn option_index(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|o| o == option)
    }

    /// Exact set comparison; no partial credit.
    #[must_use]
    pub fn is_correct(&self, answers: Option<&AnswerSet>) -> bool {
        answers.is_some_and(|set| !set.is_empty() && *set == self.correct_answers)
    }

    /// Joins `answers` with `", "` in option display order.
    #[must_use]
    pub fn summarize(&self, answers: &AnswerSet) -> String {
        let mut ordered: Vec<&str> = answers.iter().map(String::as_str).collect();
        ordered.sort_by_key(|answer| self.option_index(answer).unwrap_or(usize::MAX));
        ordered.join(", ")
    }

    /// Correct answers joined in option display order.
    #[must_use]
    pub fn correct_summary(&self) -> String {
        self.summarize(&self.correct_answers)
    }
}

//
// ─── SESSION-SCOPED STATE ──────────────────────────────────────────────────────
//

/// Per-draw mutable state of a question. `Default` is the reset state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionState {
    user_answers: Option<AnswerSet>,
    answer_viewed: bool,
    flagged: bool,
    translation: Option<TranslatedView>,
}

impl QuestionState {
    #[must_use]
    pub fn user_answers(&self) -> Option<&AnswerSet> {
        self.user_answers.as_ref()
    }

    #[must_use]
    pub fn answer_viewed(&self) -> bool {
        self.answer_viewed
    }

    #[must_use]
    pub fn flagged(&self) -> bool {
        self.flagged
    }

    #[must_use]
    pub fn translation(&self) -> Option<&TranslatedView> {
        self.translation.as_ref()
    }
}

//
// ─── EXAM ITEM ─────────────────────────────────────────────────────────────────
//

/// A drawn question: shared immutable core plus exclusive session state.
///
/// `ExamItem::new` is the only constructor and always starts from
/// `QuestionState::default()`, so every draw begins clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamItem {
    question: Arc<Question>,
    state: QuestionState,
}

impl ExamItem {
    #[must_use]
    pub fn new(question: Arc<Question>) -> Self {
        Self {
            question,
            state: QuestionState::default(),
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn shared_question(&self) -> &Arc<Question> {
        &self.question
    }

    #[must_use]
    pub fn state(&self) -> &QuestionState {
        &self.state
    }

    pub fn clear_answers(&mut self) {
        self.state.user_answers = None;
    }

    /// Flips the flag and returns the new value.
    pub fn toggle_flag(&mut self) -> bool {
        self.state.flagged = !self.state.flagged;
        self.state.flagged
    }

    /// Marks the answer as revealed and clears any stored answer.
    ///
    /// Returns `true` only on the first reveal, i.e. when a penalty is owed.
    pub fn reveal_answer(&mut self) -> bool {
        self.state.user_answers = None;
        if self.state.answer_viewed {
            return false;
        }
        self.state.answer_viewed = true;
        true
    }

    /// Installs a translation after checking it is index-aligned with the options.
    ///
    /// # Errors
    ///
    /// Returns `TranslationLengthMismatch` if the option counts differ.
    pub fn set_translation(&mut self, view: TranslatedView) -> Result<(), TranslationLengthMismatch> {
        let expected = self.question.options().len();
        let actual = view.options().len();
        if expected != actual {
            return Err(TranslationLengthMismatch { expected, actual });
        }
        self.state.translation = Some(view);
        Ok(())
    }

    #[must_use]
    pub fn has_translation(&self) -> bool {
        self.state.translation.is_some()
    }

    /// Text shown to the user. Falls back to canonical while no translation is cached.
    #[must_use]
    pub fn display_text(&self, translated: bool) -> &str {
        match (&self.state.translation, translated) {
            (Some(view), true) => view.text(),
            _ => self.question.text(),
        }
    }

    /// Options shown to the user, index-aligned with the canonical options.
    #[must_use]
    pub fn display_options(&self, translated: bool) -> &[String] {
        match (&self.state.translation, translated) {
            (Some(view), true) => view.options(),
            _ => self.question.options(),
        }
    }

    /// Stores the canonical options at `positions`. Positions past the end
    /// are dropped and an empty result clears.
    pub fn record_positions<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let options = self.question.options();
        let set: AnswerSet = positions
            .into_iter()
            .filter_map(|idx| options.get(idx).cloned())
            .collect();
        self.state.user_answers = if set.is_empty() { None } else { Some(set) };
    }

    /// Positions of the stored answer in option order.
    #[must_use]
    pub fn answer_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .state
            .user_answers
            .iter()
            .flatten()
            .filter_map(|answer| self.question.option_index(answer))
            .collect();
        positions.sort_unstable();
        positions
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.question.is_correct(self.state.user_answers.as_ref())
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.state.user_answers.as_ref().is_some_and(|set| !set.is_empty())
    }

    /// No stored answer and the answer was not revealed.
    #[must_use]
    pub fn is_unanswered(&self) -> bool {
        !self.is_answered() && !self.state.answer_viewed
    }

    /// The user's answer joined in display order, if any.
    #[must_use]
    pub fn answer_summary(&self) -> Option<String> {
        self.state
            .user_answers
            .as_ref()
            .filter(|set| !set.is_empty())
            .map(|set| self.question.summarize(set))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
