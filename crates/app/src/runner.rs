//! Interactive exam loop: stdin commands, a one-second tick, and
//! translations fetched in the background.

use std::fmt;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Instant, interval_at};
use tracing::debug;

use exam_core::model::AnswerSet;
use services::{
    ExamSession, Navigation, SessionError, TickOutcome, TranslationOutcome, TranslationPort,
    TranslationRequest, TranslationResponse,
};

use crate::render;

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    /// 1-based question number.
    GoTo(usize),
    Skip,
    Flag,
    ViewAnswer,
    Translate,
    /// 1-based option numbers.
    Answer(Vec<usize>),
    Review,
    Time,
    Submit,
    Quit,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingValue { command: &'static str },
    InvalidNumber(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "enter a command (h for help)"),
            CommandError::Unknown(raw) => write!(f, "unknown command: {raw} (h for help)"),
            CommandError::MissingValue { command } => write!(f, "{command} requires a value"),
            CommandError::InvalidNumber(raw) => write!(f, "not a valid number: {raw}"),
        }
    }
}

impl std::error::Error for CommandError {}

fn parse_number(raw: &str) -> Result<usize, CommandError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| CommandError::InvalidNumber(raw.trim().to_owned()))
}

impl Command {
    /// # Errors
    ///
    /// Returns `CommandError` for unknown commands or bad arguments.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let command = match head.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Prev,
            "g" | "go" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingValue { command: "g" });
                }
                Self::GoTo(parse_number(rest)?)
            }
            "s" | "skip" => Self::Skip,
            "f" | "flag" => Self::Flag,
            "v" | "view" => Self::ViewAnswer,
            "t" | "translate" => Self::Translate,
            "a" | "answer" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingValue { command: "a" });
                }
                let numbers = rest
                    .split([',', ' '])
                    .filter(|token| !token.trim().is_empty())
                    .map(parse_number)
                    .collect::<Result<Vec<_>, _>>()?;
                Self::Answer(numbers)
            }
            "r" | "review" => Self::Review,
            "time" => Self::Time,
            "submit" => Self::Submit,
            "q" | "quit" => Self::Quit,
            "h" | "help" | "?" => Self::Help,
            other => return Err(CommandError::Unknown(other.to_owned())),
        };
        Ok(command)
    }
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

/// How the interactive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Submitted,
    Abandoned,
}

/// What the loop should do after a command.
#[derive(Debug)]
enum Step {
    Continue,
    Translate(TranslationRequest),
    Submitted,
    Quit,
}

type PendingTranslation = Pin<Box<dyn Future<Output = TranslationResponse> + Send>>;

/// Drives one `ExamSession` from a line-based input.
pub struct ExamLoop<W> {
    session: ExamSession,
    out: W,
    review_open: bool,
    confirm_submit: bool,
}

impl<W: Write> ExamLoop<W> {
    /// Wraps a session that has already been started.
    pub fn new(session: ExamSession, out: W) -> Self {
        Self {
            session,
            out,
            review_open: false,
            confirm_submit: false,
        }
    }

    pub fn into_session(self) -> ExamSession {
        self.session
    }

    /// Runs until the exam is submitted (by command or timeout) or abandoned.
    ///
    /// End of input abandons the exam.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub async fn run<R>(&mut self, input: R, port: Arc<dyn TranslationPort>) -> Result<Finish>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut pending: Option<PendingTranslation> = None;

        self.print(&render::question(&self.session))?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        writeln!(self.out, "Input closed; exam abandoned.")?;
                        return Ok(Finish::Abandoned);
                    };
                    match self.handle_line(&line)? {
                        Step::Continue => {}
                        Step::Translate(request) => {
                            let port = Arc::clone(&port);
                            pending = Some(Box::pin(async move { request.run(port.as_ref()).await }));
                        }
                        Step::Submitted => return self.finish(),
                        Step::Quit => return Ok(Finish::Abandoned),
                    }
                }
                _ = ticker.tick(), if self.session.is_in_progress() => {
                    if self.session.tick() == TickOutcome::Expired {
                        return self.finish();
                    }
                }
                response = next_response(&mut pending) => {
                    pending = None;
                    self.handle_translation(response)?;
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> Result<Step> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(err) => {
                writeln!(self.out, "{err}")?;
                return Ok(Step::Continue);
            }
        };
        debug!(?command, "command");

        if self.review_open {
            self.review_open = false;
            self.session.resume_timer()?;
        }
        if command != Command::Submit {
            self.confirm_submit = false;
        }

        match self.apply(command) {
            Ok(step) => Ok(step),
            Err(err) => {
                if let Some(unknown @ SessionError::UnknownOption(_)) =
                    err.downcast_ref::<SessionError>()
                {
                    writeln!(self.out, "{unknown}")?;
                    return Ok(Step::Continue);
                }
                Err(err)
            }
        }
    }

    fn apply(&mut self, command: Command) -> Result<Step> {
        match command {
            Command::Next => {
                let nav = self.session.next()?;
                return self.show_navigation(nav);
            }
            Command::Prev => {
                let nav = self.session.prev()?;
                return self.show_navigation(nav);
            }
            Command::GoTo(number) => {
                let nav = match number.checked_sub(1) {
                    Some(index) => self.session.go_to(index)?,
                    None => Navigation::OutOfRange,
                };
                return self.show_navigation(nav);
            }
            Command::Skip => {
                let nav = self.session.skip()?;
                return self.show_navigation(nav);
            }
            Command::Flag => {
                let flagged = self.session.flag()?;
                self.print(if flagged { "Flagged." } else { "Flag removed." })?;
            }
            Command::ViewAnswer => {
                let correct = self.session.view_answer()?;
                self.show_correct(&correct)?;
            }
            Command::Translate => {
                self.session.toggle_translated_view()?;
                self.show_question()?;
                return self.request_translation();
            }
            Command::Answer(numbers) => {
                self.select(&numbers)?;
                self.show_question()?;
            }
            Command::Review => {
                self.session.save_current_answer()?;
                self.session.pause_timer()?;
                self.review_open = true;
                let text = render::review(&self.session.review_entries());
                self.print(&text)?;
            }
            Command::Time => {
                let text = format!("Time left {}", render::format_clock(self.session.time_remaining()));
                self.print(&text)?;
            }
            Command::Submit => return self.submit(),
            Command::Quit => return Ok(Step::Quit),
            Command::Help => self.print(render::HELP)?,
        }
        Ok(Step::Continue)
    }

    /// Starts a fetch when the translated view shows a question with no cached translation.
    fn request_translation(&mut self) -> Result<Step> {
        match self.session.translation_request() {
            Some(request) => {
                self.print("Translating...")?;
                Ok(Step::Translate(request))
            }
            None => Ok(Step::Continue),
        }
    }

    /// Single-choice questions take the last number; multi-choice toggles each.
    fn select(&mut self, numbers: &[usize]) -> Result<(), SessionError> {
        let multiple = self
            .session
            .current_item()
            .is_some_and(|item| item.question().is_multiple_choice());
        let index = |number: usize| {
            number
                .checked_sub(1)
                .ok_or_else(|| SessionError::UnknownOption(number.to_string()))
        };
        if multiple {
            for &number in numbers {
                self.session.toggle_index(index(number)?)?;
            }
        } else if let Some(&number) = numbers.last() {
            self.session.choose_index(index(number)?)?;
        }
        self.session.save_current_answer()
    }

    fn submit(&mut self) -> Result<Step> {
        self.session.save_current_answer()?;
        let unanswered = self.session.unanswered_indices();
        if !unanswered.is_empty() && !self.confirm_submit {
            self.confirm_submit = true;
            let numbers: Vec<String> = unanswered.iter().map(|idx| (idx + 1).to_string()).collect();
            let text = format!(
                "{} question(s) unanswered: {}. Type submit again to confirm.",
                unanswered.len(),
                numbers.join(", ")
            );
            self.print(&text)?;
            return Ok(Step::Continue);
        }
        self.session.submit()?;
        Ok(Step::Submitted)
    }

    fn handle_translation(&mut self, response: TranslationResponse) -> Result<()> {
        let is_current = response.question_index() == self.session.current_index();
        match self.session.apply_translation(response) {
            TranslationOutcome::Applied if is_current => self.show_question()?,
            TranslationOutcome::Fallback(err) => {
                writeln!(self.out, "Translation unavailable ({err}); showing original text.")?;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Finish> {
        if let Some(report) = self.session.report() {
            let text = render::summary(report);
            self.print(&text)?;
        }
        Ok(Finish::Submitted)
    }

    fn show_navigation(&mut self, nav: Navigation) -> Result<Step> {
        match nav {
            Navigation::Moved(_) => {
                self.show_question()?;
                return self.request_translation();
            }
            Navigation::AtFirstQuestion => self.print("Already at the first question.")?,
            Navigation::AtLastQuestion => {
                self.print("This is the last question. Type submit to finish.")?;
            }
            Navigation::OutOfRange => self.print("No such question.")?,
        }
        Ok(Step::Continue)
    }

    fn show_correct(&mut self, correct: &AnswerSet) -> std::io::Result<()> {
        let text = self
            .session
            .current_item()
            .map(|item| item.question().summarize(correct))
            .unwrap_or_default();
        self.print(&format!("Correct answer: {text} (1 point deducted on first view)"))
    }

    fn show_question(&mut self) -> std::io::Result<()> {
        let text = render::question(&self.session);
        self.print(&text)
    }

    fn print(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.out, "{}", text.trim_end())?;
        self.out.flush()
    }
}

async fn next_response(pending: &mut Option<PendingTranslation>) -> TranslationResponse {
    match pending {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}
