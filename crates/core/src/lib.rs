#![forbid(unsafe_code)]

pub mod model;
pub mod scoring;
pub mod time;

pub use model::{
    AnswerSet, ExamItem, ExamSettings, ExamSettingsDraft, Question, QuestionRecord,
    QuestionState, RecordField, SettingsError, TranslatedView, TranslationLengthMismatch,
    TranslatorSettings, TranslatorSettingsDraft, ValidationError,
};
pub use scoring::{Report, ReportEntry, score};
pub use time::Clock;
