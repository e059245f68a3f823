//! Translation capability: batch text translation via an HTTP provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::services::CapabilityError;

/// Batch text translation into a target language. Implementations must return
/// translations in the same order and count as the input; the whole batch
/// fails on provider error, rate-limit, or timeout.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, CapabilityError>;
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Vec<String>,
}

/// Client for a LibreTranslate-compatible `/translate` endpoint.
pub struct HttpTranslator {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, CapabilityError> {
        let request = TranslateRequest {
            q: texts,
            source: "auto",
            target: target_language,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                CapabilityError::Failed(format!("translation provider unreachable: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Failed(format!(
                "translation provider returned {status}"
            )));
        }

        let body: TranslateResponse = response.json().await.map_err(|e| {
            CapabilityError::Failed(format!("unparseable translation response: {e}"))
        })?;

        if body.translated_text.len() != texts.len() {
            return Err(CapabilityError::Failed(format!(
                "translation provider returned {} texts for a batch of {}",
                body.translated_text.len(),
                texts.len()
            )));
        }

        Ok(body.translated_text)
    }
}
