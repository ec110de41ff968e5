/// Aggregated view of exam progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub flagged: usize,
    pub viewed: usize,
}

/// Navigation marker for a question, in display precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Current,
    Flagged,
    Answered,
    Viewed,
    Unanswered,
}

/// One line of the in-exam review list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    /// 1-based position in the exam.
    pub number: usize,
    pub question: String,
    pub answer: Option<String>,
    pub answer_viewed: bool,
    pub flagged: bool,
}
