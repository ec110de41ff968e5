mod options_literal;
mod question;
mod record;
mod settings;
mod translation;

pub use options_literal::{LiteralError, parse_string_list};
pub use question::{AnswerSet, ExamItem, MAX_CORRECT_ANSWERS, Question, QuestionState};
pub use record::{QuestionRecord, RecordField, ValidationError};
pub use settings::{
    DEFAULT_NUM_QUESTIONS, DEFAULT_SOURCE_LANG, DEFAULT_TIME_LIMIT_MINUTES, ExamSettings,
    ExamSettingsDraft, SettingsError, TranslatorSettings, TranslatorSettingsDraft,
};
pub use translation::{TranslatedView, TranslationLengthMismatch};
