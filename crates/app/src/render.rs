//! Plain-text views of the exam for the terminal.

use std::fmt::Write as _;

use exam_core::Report;
use services::{ExamSession, QuestionStatus, ReviewEntry};

pub const HELP: &str = "\
Commands:
  n            next question
  p            previous question
  g <k>        go to question k
  a <i[,j..]>  select option number(s)
  s            skip (clear answer and move on)
  f            flag / unflag
  v            view the correct answer (1 point penalty)
  t            toggle translated view
  r            review answers (timer paused)
  time         show remaining time
  submit       submit the exam
  q            quit without submitting";

/// `MM:SS`; minutes are not wrapped at 60.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn status_marker(status: QuestionStatus) -> char {
    match status {
        QuestionStatus::Current => '>',
        QuestionStatus::Flagged => 'F',
        QuestionStatus::Answered => '*',
        QuestionStatus::Viewed => 'V',
        QuestionStatus::Unanswered => '.',
    }
}

/// One character per question, e.g. `[>*.F]`.
#[must_use]
pub fn status_strip(session: &ExamSession) -> String {
    let markers: String = (0..session.total_questions())
        .filter_map(|idx| session.status(idx))
        .map(status_marker)
        .collect();
    format!("[{markers}]")
}

/// The current question with its options and the pending selection.
#[must_use]
pub fn question(session: &ExamSession) -> String {
    let mut out = String::new();
    let Some(item) = session.current_item() else {
        return out;
    };
    let progress = session.progress();
    let state = item.state();

    let _ = write!(
        out,
        "Question {}/{}  {}  Time left {}",
        progress.position,
        progress.total,
        status_strip(session),
        format_clock(session.time_remaining())
    );
    if state.flagged() {
        out.push_str("  [flagged]");
    }
    if state.answer_viewed() {
        out.push_str("  [answer viewed]");
    }
    if session.is_translated_view() {
        out.push_str("  [translated]");
    }
    out.push('\n');
    let _ = writeln!(out, "{}", session.display_text().unwrap_or_default());

    let multiple = item.question().is_multiple_choice();
    for (idx, option) in session.display_options().iter().enumerate() {
        let selected = session.selected_positions().contains(&idx);
        let mark = match (multiple, selected) {
            (true, true) => "[x]",
            (true, false) => "[ ]",
            (false, true) => "(o)",
            (false, false) => "( )",
        };
        let _ = writeln!(out, "  {}) {mark} {option}", idx + 1);
    }
    if multiple {
        out.push_str("Select all that apply.\n");
    }
    out
}

#[must_use]
pub fn review(entries: &[ReviewEntry]) -> String {
    let mut out = String::from("Review (timer paused; any command resumes)\n");
    for entry in entries {
        let answer = entry
            .answer
            .as_deref()
            .unwrap_or(exam_core::scoring::SKIPPED_OR_VIEWED);
        let _ = write!(out, "  {:>3}. {} -> {answer}", entry.number, entry.question);
        if entry.answer_viewed {
            out.push_str(" (viewed)");
        }
        if entry.flagged {
            out.push_str(" (flagged)");
        }
        out.push('\n');
    }
    out
}

#[must_use]
pub fn summary(report: &Report) -> String {
    let mut out = String::new();
    if report.timed_out {
        out.push_str("Time is up. The exam was submitted automatically.\n");
    }
    let _ = writeln!(out, "Correct answers: {}/{}", report.correct_count, report.total);
    let _ = writeln!(out, "Penalties for viewing answers: {}", report.penalties);
    let _ = writeln!(out, "Final score: {}/{}", report.score, report.total);
    let _ = writeln!(out, "Percentage: {:.2}%", report.percentage);
    out
}
