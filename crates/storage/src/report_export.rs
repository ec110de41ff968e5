//! Post-exam report export as Markdown or JSON.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use exam_core::scoring::{Report, ReportEntry};

use crate::error::StorageError;

const VIEWED_NOTE: &str = "Marked incorrect because answer was viewed; 1 point deducted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

/// Renders the feedback document.
#[must_use]
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_document(&mut out, report);
    out
}

fn write_document(out: &mut String, report: &Report) -> std::fmt::Result {
    writeln!(out, "# Mock Exam Feedback\n")?;
    writeln!(out, "**Correct Answers**: {}/{}", report.correct_count, report.total)?;
    writeln!(out, "**Penalties for Viewing Answers**: {}", report.penalties)?;
    writeln!(out, "**Final Score**: {}/{}", report.score, report.total)?;
    writeln!(out, "**Percentage**: {:.2}%", report.percentage)?;
    if report.timed_out {
        writeln!(out, "**Note**: Submitted automatically when the time limit was reached")?;
    }
    writeln!(out)?;

    writeln!(out, "## Flagged Questions\n")?;
    if report.flagged.is_empty() {
        writeln!(out, "No questions were flagged.\n")?;
    }
    for (i, entry) in report.flagged.iter().enumerate() {
        writeln!(out, "### Question {} (Flagged)", i + 1)?;
        write_entry_body(out, entry, false)?;
        let status = if entry.is_correct { "Correct" } else { "Incorrect" };
        writeln!(out, "- **Status**: {status}\n")?;
    }

    writeln!(out, "## Incorrect or Skipped Questions\n")?;
    if report.incorrect.is_empty() {
        writeln!(out, "No incorrect or skipped questions.\n")?;
    }
    for (i, entry) in report.incorrect.iter().enumerate() {
        writeln!(out, "### Question {} (Incorrect or Skipped)", i + 1)?;
        write_entry_body(out, entry, true)?;
        writeln!(out)?;
    }

    writeln!(out, "## Flagged and Incorrect Questions\n")?;
    if report.flagged_and_incorrect.is_empty() {
        writeln!(out, "No questions were both flagged and incorrect.\n")?;
    }
    for (i, entry) in report.flagged_and_incorrect.iter().enumerate() {
        writeln!(out, "### Question {} (Flagged and Incorrect)", i + 1)?;
        write_entry_body(out, entry, false)?;
        writeln!(out)?;
    }

    writeln!(out, "## Notes")?;
    writeln!(
        out,
        "- Questions marked as 'Flagged' were highlighted by you during the exam for review."
    )?;
    writeln!(
        out,
        "- Incorrect questions include those with wrong answers, skipped, or where the answer was viewed."
    )?;
    writeln!(
        out,
        "- The 'Flagged and Incorrect' section lists questions that meet both criteria."
    )
}

fn write_entry_body(out: &mut String, entry: &ReportEntry, note_flag: bool) -> std::fmt::Result {
    writeln!(out, "- **Question**: {}", entry.question)?;
    writeln!(out, "- **Your Answers**: {}", entry.your_answer_or_skipped())?;
    if entry.answer_viewed {
        writeln!(out, "- **Note**: {VIEWED_NOTE}")?;
    }
    if note_flag && entry.flagged {
        writeln!(out, "- **Note**: This question was flagged")?;
    }
    writeln!(out, "- **Correct Answers**: {}", entry.correct_answer)
}

/// # Errors
///
/// Returns `StorageError::Io` if the file cannot be written.
pub fn write_markdown(report: &Report, path: impl AsRef<Path>) -> Result<(), StorageError> {
    fs::write(path, render_markdown(report))?;
    Ok(())
}

/// # Errors
///
/// Returns `StorageError` if serialization or writing fails.
pub fn write_json(report: &Report, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let body = serde_json::to_string_pretty(report)?;
    fs::write(path, body)?;
    Ok(())
}

/// # Errors
///
/// Returns `StorageError` if the report cannot be written.
pub fn write_report(
    report: &Report,
    path: impl AsRef<Path>,
    format: ExportFormat,
) -> Result<(), StorageError> {
    match format {
        ExportFormat::Markdown => write_markdown(report, path),
        ExportFormat::Json => write_json(report, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(number: usize, flagged: bool, viewed: bool, answer: Option<&str>) -> ReportEntry {
        ReportEntry {
            number,
            question: format!("Question {number}?"),
            your_answer: answer.map(str::to_owned),
            correct_answer: "B".into(),
            answer_viewed: viewed,
            flagged,
            is_correct: answer == Some("B"),
        }
    }

    fn report() -> Report {
        let skipped = entry(2, true, false, None);
        let viewed = entry(3, false, true, None);
        Report {
            total: 3,
            correct_count: 1,
            penalties: 1,
            score: 0,
            percentage: 0.0,
            started_at: None,
            submitted_at: None,
            timed_out: true,
            flagged: vec![skipped.clone()],
            incorrect: vec![skipped.clone(), viewed],
            flagged_and_incorrect: vec![skipped],
        }
    }

    #[test]
    fn markdown_has_every_section() {
        let md = render_markdown(&report());
        for header in [
            "# Mock Exam Feedback",
            "## Flagged Questions",
            "## Incorrect or Skipped Questions",
            "## Flagged and Incorrect Questions",
            "## Notes",
        ] {
            assert!(md.contains(header), "missing {header}");
        }
        assert!(md.contains("**Correct Answers**: 1/3"));
        assert!(md.contains("**Percentage**: 0.00%"));
        assert!(md.contains("- **Your Answers**: Skipped or Viewed"));
        assert!(md.contains(VIEWED_NOTE));
        assert!(md.contains("- **Note**: This question was flagged"));
        assert!(md.contains("- **Status**: Incorrect"));
        assert!(md.contains("time limit was reached"));
    }

    #[test]
    fn empty_sections_say_so() {
        let clean = Report {
            total: 1,
            correct_count: 1,
            penalties: 0,
            score: 1,
            percentage: 100.0,
            started_at: None,
            submitted_at: None,
            timed_out: false,
            flagged: Vec::new(),
            incorrect: Vec::new(),
            flagged_and_incorrect: Vec::new(),
        };
        let md = render_markdown(&clean);
        assert!(md.contains("No questions were flagged."));
        assert!(md.contains("No incorrect or skipped questions."));
        assert!(md.contains("No questions were both flagged and incorrect."));
        assert!(md.contains("**Percentage**: 100.00%"));
    }
}
