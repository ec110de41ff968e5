mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{ExamProgress, QuestionStatus, ReviewEntry};
pub use service::{
    ExamSession, Navigation, SessionPhase, TickOutcome, TimerState, TranslationOutcome,
};
pub use workflow::ExamService;
