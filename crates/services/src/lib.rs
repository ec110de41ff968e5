#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod sessions;
pub mod translation;

pub use exam_core::Clock;

pub use bank::QuestionBank;
pub use error::{ImportError, SessionError, TranslationError};
pub use sessions::{
    ExamProgress, ExamService, ExamSession, Navigation, QuestionStatus, ReviewEntry,
    SessionPhase, TickOutcome, TimerState, TranslationOutcome,
};
pub use translation::{HttpTranslator, TranslationPort, TranslationRequest, TranslationResponse};
