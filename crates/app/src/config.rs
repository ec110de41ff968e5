//! YAML configuration with environment and command-line overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use exam_core::model::{
    DEFAULT_NUM_QUESTIONS, DEFAULT_TIME_LIMIT_MINUTES, ExamSettings, ExamSettingsDraft,
    TranslatorSettings, TranslatorSettingsDraft,
};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

pub const ENV_TRANSLATE_URL: &str = "MOCK_EXAM_TRANSLATE_URL";
pub const ENV_TRANSLATE_KEY: &str = "MOCK_EXAM_TRANSLATE_KEY";
pub const ENV_SOURCE_LANG: &str = "MOCK_EXAM_SOURCE_LANG";
pub const ENV_TARGET_LANG: &str = "MOCK_EXAM_TARGET_LANG";

/// Raw contents of the configuration file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub exam: ExamSection,
    pub translator: TranslatorSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExamSection {
    pub num_questions: Option<u32>,
    pub time_limit_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorSection {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub api_key: Option<String>,
}

/// Validated settings the exam runs with.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub exam: ExamSettings,
    pub translator: TranslatorSettings,
}

impl FileConfig {
    /// Load `path`, or `config.yaml` when none is given.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// # Errors
    ///
    /// Returns an error for malformed YAML or unknown keys.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `MOCK_EXAM_*` overrides read through `lookup`.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let translator = &mut self.translator;
        if let Some(url) = lookup(ENV_TRANSLATE_URL) {
            translator.base_url = Some(url);
        }
        if let Some(key) = lookup(ENV_TRANSLATE_KEY) {
            translator.api_key = Some(key);
        }
        if let Some(lang) = lookup(ENV_SOURCE_LANG) {
            translator.source_lang = Some(lang);
        }
        if let Some(lang) = lookup(ENV_TARGET_LANG) {
            translator.target_lang = Some(lang);
        }
        self
    }

    /// Validate, letting command-line values win over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if any resulting value is invalid.
    pub fn resolve(self, questions: Option<u32>, minutes: Option<u32>) -> Result<AppConfig> {
        let exam = ExamSettingsDraft {
            num_questions: questions
                .or(self.exam.num_questions)
                .unwrap_or(DEFAULT_NUM_QUESTIONS),
            time_limit_minutes: minutes
                .or(self.exam.time_limit_minutes)
                .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES),
        }
        .validate()
        .context("invalid exam settings")?;

        let section = self.translator;
        let translator = if section.enabled == Some(false) {
            TranslatorSettings::disabled()
        } else {
            TranslatorSettingsDraft {
                base_url: section.base_url,
                api_key: section.api_key,
                source_lang: section.source_lang,
                target_lang: section.target_lang,
            }
            .validate()
            .context("invalid translator settings")?
        };

        Ok(AppConfig { exam, translator })
    }
}
