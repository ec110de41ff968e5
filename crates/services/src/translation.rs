use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use exam_core::model::{TranslatedView, TranslatorSettings};

use crate::error::TranslationError;

/// Text translation capability consumed by exam sessions.
#[async_trait]
pub trait TranslationPort: Send + Sync {
    /// Translate a single string.
    ///
    /// # Errors
    ///
    /// Returns `TranslationError` on any provider failure.
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

//
// ─── REQUEST / RESPONSE ────────────────────────────────────────────────────────
//

/// Owned snapshot of what needs translating for one question.
///
/// Holds no borrow of the session, so it can be awaited while the session
/// keeps receiving timer ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub(crate) generation: u64,
    pub(crate) index: usize,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
}

impl TranslationRequest {
    #[must_use]
    pub fn question_index(&self) -> usize {
        self.index
    }

    /// Translates the question text and every option, in order.
    pub async fn run(self, port: &dyn TranslationPort) -> TranslationResponse {
        let result = self.translate_all(port).await;
        TranslationResponse {
            generation: self.generation,
            index: self.index,
            result,
        }
    }

    async fn translate_all(
        &self,
        port: &dyn TranslationPort,
    ) -> Result<TranslatedView, TranslationError> {
        let text = port.translate(&self.text).await?;
        let mut options = Vec::with_capacity(self.options.len());
        for option in &self.options {
            options.push(port.translate(option).await?);
        }
        Ok(TranslatedView::new(text, options))
    }
}

/// Outcome of a `TranslationRequest`, applied with `ExamSession::apply_translation`.
#[derive(Debug)]
pub struct TranslationResponse {
    pub(crate) generation: u64,
    pub(crate) index: usize,
    pub(crate) result: Result<TranslatedView, TranslationError>,
}

impl TranslationResponse {
    #[must_use]
    pub fn question_index(&self) -> usize {
        self.index
    }
}

//
// ─── HTTP TRANSLATOR ───────────────────────────────────────────────────────────
//

/// Client for a LibreTranslate-compatible `/translate` endpoint.
#[derive(Clone)]
pub struct HttpTranslator {
    client: Client,
    settings: TranslatorSettings,
}

impl HttpTranslator {
    #[must_use]
    pub fn new(settings: TranslatorSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.settings.enabled()
    }
}

#[async_trait]
impl TranslationPort for HttpTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyText);
        }
        let base_url = self
            .settings
            .base_url()
            .ok_or(TranslationError::Disabled)?;
        let target = self
            .settings
            .target_lang()
            .ok_or(TranslationError::Disabled)?;

        let url = format!("{}/translate", base_url.as_str().trim_end_matches('/'));
        let payload = TranslateRequest {
            q: text,
            source: self.settings.source_lang(),
            target,
            format: "text",
            api_key: self.settings.api_key(),
        };

        let response = self.client.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(TranslationError::HttpStatus(response.status()));
        }

        let body: TranslateResponse = response.json().await?;
        let translated = body.translated_text.trim();
        if translated.is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(translated.to_string())
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}
