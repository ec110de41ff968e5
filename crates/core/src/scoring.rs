use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ExamItem;

/// Answer summary shown for questions with no stored answer.
pub const SKIPPED_OR_VIEWED: &str = "Skipped or Viewed";

/// One question as it appears in the post-exam report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// 1-based position in the exam.
    pub number: usize,
    pub question: String,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub answer_viewed: bool,
    pub flagged: bool,
    pub is_correct: bool,
}

impl ReportEntry {
    fn from_item(position: usize, item: &ExamItem) -> Self {
        Self {
            number: position + 1,
            question: item.question().text().to_owned(),
            your_answer: item.answer_summary(),
            correct_answer: item.question().correct_summary(),
            answer_viewed: item.state().answer_viewed(),
            flagged: item.state().flagged(),
            is_correct: item.is_correct(),
        }
    }

    #[must_use]
    pub fn your_answer_or_skipped(&self) -> &str {
        self.your_answer.as_deref().unwrap_or(SKIPPED_OR_VIEWED)
    }
}

/// Final result of an exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total: usize,
    pub correct_count: usize,
    pub penalties: usize,
    pub score: usize,
    pub percentage: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub timed_out: bool,
    pub flagged: Vec<ReportEntry>,
    /// Wrong, skipped, or viewed.
    pub incorrect: Vec<ReportEntry>,
    pub flagged_and_incorrect: Vec<ReportEntry>,
}

impl Report {
    #[must_use]
    pub fn with_timing(
        mut self,
        started_at: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
        timed_out: bool,
    ) -> Self {
        self.started_at = Some(started_at);
        self.submitted_at = Some(submitted_at);
        self.timed_out = timed_out;
        self
    }
}

/// Scores a finished set of questions. Pure; equal inputs give equal reports.
#[must_use]
pub fn score(items: &[ExamItem], penalties: usize) -> Report {
    let total = items.len();
    let mut correct_count: usize = 0;
    let mut flagged = Vec::new();
    let mut incorrect = Vec::new();
    let mut flagged_and_incorrect = Vec::new();

    for (position, item) in items.iter().enumerate() {
        let entry = ReportEntry::from_item(position, item);
        if entry.is_correct {
            correct_count += 1;
        } else {
            incorrect.push(entry.clone());
            if entry.flagged {
                flagged_and_incorrect.push(entry.clone());
            }
        }
        if entry.flagged {
            flagged.push(entry);
        }
    }

    let score = correct_count.saturating_sub(penalties);
    #[allow(clippy::cast_precision_loss)]
    let percentage = if total > 0 {
        score as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    Report {
        total,
        correct_count,
        penalties,
        score,
        percentage,
        started_at: None,
        submitted_at: None,
        timed_out: false,
        flagged,
        incorrect,
        flagged_and_incorrect,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::QuestionRecord;

    fn item(correct: &str) -> ExamItem {
        let question = QuestionRecord::new("Q", r#"["A","B","C","D"]"#, correct)
            .validate()
            .unwrap();
        ExamItem::new(Arc::new(question))
    }

    #[test]
    fn empty_exam_scores_zero() {
        let report = score(&[], 0);
        assert_eq!(report.total, 0);
        assert!((report.percentage - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn penalties_never_drive_score_negative() {
        let mut right = item("1");
        right.record_positions([1]);
        let report = score(&[right, item("0")], 3);
        assert_eq!(report.correct_count, 1);
        assert_eq!(report.score, 0);
        assert!((report.percentage - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partitions_flagged_and_incorrect() {
        let mut correct_flagged = item("0");
        correct_flagged.record_positions([0]);
        correct_flagged.toggle_flag();

        let mut wrong_flagged = item("0,2");
        wrong_flagged.record_positions([0]);
        wrong_flagged.toggle_flag();

        let mut viewed = item("3");
        viewed.reveal_answer();

        let report = score(&[correct_flagged, wrong_flagged, viewed], 1);

        assert_eq!(report.correct_count, 1);
        assert_eq!(report.score, 0);
        let numbers = |entries: &[ReportEntry]| entries.iter().map(|e| e.number).collect::<Vec<_>>();
        assert_eq!(numbers(&report.flagged), vec![1, 2]);
        assert_eq!(numbers(&report.incorrect), vec![2, 3]);
        assert_eq!(numbers(&report.flagged_and_incorrect), vec![2]);

        let viewed_entry = &report.incorrect[1];
        assert!(viewed_entry.answer_viewed);
        assert_eq!(viewed_entry.your_answer_or_skipped(), SKIPPED_OR_VIEWED);
        assert_eq!(viewed_entry.correct_answer, "D");
        assert_eq!(report.incorrect[0].your_answer.as_deref(), Some("A"));
        assert_eq!(report.incorrect[0].correct_answer, "A, C");
    }

    #[test]
    fn percentage_uses_penalized_score() {
        let mut a = item("0");
        a.record_positions([0]);
        let mut b = item("1");
        b.record_positions([1]);
        let report = score(&[a, b, item("2"), item("3")], 1);
        assert_eq!(report.score, 1);
        assert!((report.percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn scoring_twice_is_identical() {
        let mut a = item("0");
        a.record_positions([0]);
        let items = vec![a, item("1")];
        assert_eq!(score(&items, 0), score(&items, 0));
    }
}
