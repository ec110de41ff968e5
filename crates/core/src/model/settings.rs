use thiserror::Error;
use url::Url;

pub const DEFAULT_NUM_QUESTIONS: u32 = 20;
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;
pub const DEFAULT_SOURCE_LANG: &str = "en";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("number of questions must be at least 1")]
    InvalidQuestionCount,

    #[error("time limit must be at least 1 minute")]
    InvalidTimeLimit,

    #[error("invalid translator base URL")]
    InvalidBaseUrl,

    #[error("a target language is required when translation is enabled")]
    MissingTargetLanguage,
}

//
// ─── EXAM SETTINGS ─────────────────────────────────────────────────────────────
//

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExamSettings {
    num_questions: u32,
    time_limit_minutes: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExamSettingsDraft {
    pub num_questions: u32,
    pub time_limit_minutes: u32,
}

impl Default for ExamSettingsDraft {
    fn default() -> Self {
        Self {
            num_questions: DEFAULT_NUM_QUESTIONS,
            time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
        }
    }
}

impl ExamSettingsDraft {
    /// # Errors
    ///
    /// Returns `SettingsError` if either value is zero.
    pub fn validate(self) -> Result<ExamSettings, SettingsError> {
        if self.num_questions < 1 {
            return Err(SettingsError::InvalidQuestionCount);
        }
        if self.time_limit_minutes < 1 {
            return Err(SettingsError::InvalidTimeLimit);
        }
        Ok(ExamSettings {
            num_questions: self.num_questions,
            time_limit_minutes: self.time_limit_minutes,
        })
    }
}

impl ExamSettings {
    #[must_use]
    pub fn num_questions(&self) -> u32 {
        self.num_questions
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }
}

//
// ─── TRANSLATOR SETTINGS ───────────────────────────────────────────────────────
//

/// Translator endpoint configuration. Disabled when no base URL is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslatorSettings {
    base_url: Option<Url>,
    api_key: Option<String>,
    source_lang: String,
    target_lang: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TranslatorSettingsDraft {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

impl TranslatorSettingsDraft {
    /// Normalize blank values away and validate the endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidBaseUrl` for an unparsable URL and
    /// `SettingsError::MissingTargetLanguage` when a URL is given without a target.
    pub fn validate(self) -> Result<TranslatorSettings, SettingsError> {
        let base_url = normalize_optional(self.base_url)
            .map(|raw| Url::parse(&raw).map_err(|_| SettingsError::InvalidBaseUrl))
            .transpose()?;
        let target_lang = normalize_optional(self.target_lang);
        if base_url.is_some() && target_lang.is_none() {
            return Err(SettingsError::MissingTargetLanguage);
        }

        Ok(TranslatorSettings {
            base_url,
            api_key: normalize_optional(self.api_key),
            source_lang: normalize_optional(self.source_lang)
                .unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_owned()),
            target_lang,
        })
    }
}

impl TranslatorSettings {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            base_url: None,
            api_key: None,
            source_lang: DEFAULT_SOURCE_LANG.to_owned(),
            target_lang: None,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.base_url.is_some()
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[must_use]
    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    #[must_use]
    pub fn target_lang(&self) -> Option<&str> {
        self.target_lang.as_deref()
    }
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self::disabled()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
