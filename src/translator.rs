//! External translation boundary.
//!
//! `Translate` is the seam the fanout depends on; `OpenAiTranslator` is the
//! production implementation backed by the Chat Completions API, with
//! retries for transient failures.

use crate::config::Config;
use crate::i18n::Locale;
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field translation failed.
#[derive(Debug, Error)]
#[error("translation to {locale} failed: {source}")]
pub struct TranslateError {
    pub locale: Locale,
    #[source]
    pub source: anyhow::Error,
}

/// Translates one piece of text into a target locale.
///
/// Implementations are expected to preserve markup and placeholders and may
/// fail per call; the fanout isolates failures per field.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str, target: Locale) -> Result<String, TranslateError>;
}

/// Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Build the translation prompt for a CMS field value.
///
/// Field values may carry markdown, HTML fragments, or template
/// placeholders; the model is told to leave those intact.
fn build_translation_prompt(text: &str, target: Locale) -> String {
    format!(
        "Translate the following text to {} (preserve any markdown formatting, \
         HTML tags, or special characters):\n\n{}",
        target.name(),
        text
    )
}

/// OpenAI-backed translator.
pub struct OpenAiTranslator {
    client: reqwest::Client,
    config: Config,
}

impl OpenAiTranslator {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    async fn request_translation(&self, text: &str, target: Locale) -> anyhow::Result<String> {
        // Reasoning models need higher token limits and don't support temperature
        let is_reasoning = is_reasoning_model(&self.config.openai_model);
        let max_completion_tokens = if is_reasoning {
            16000
        } else {
            self.config.translation_max_tokens
        };

        let request = TranslationRequest {
            model: self.config.openai_model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: build_translation_prompt(text, target),
            }],
            max_completion_tokens,
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        };

        with_retry_if(
            &RetryConfig::translation_call(),
            &format!("Translation to {}", target.name()),
            || async {
                let response = self
                    .client
                    .post(&self.config.openai_api_url)
                    .header(
                        "Authorization",
                        format!("Bearer {}", self.config.openai_api_key),
                    )
                    .header("Content-Type", "application/json")
                    .json(&request)
                    .send()
                    .await
                    .context("Failed to send translation request to OpenAI API")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    anyhow::bail!("OpenAI API error during translation ({}): {}", status, body);
                }

                let chat_response: ChatResponse = response
                    .json()
                    .await
                    .context("Failed to parse OpenAI translation response")?;

                let translated = chat_response
                    .choices
                    .first()
                    .map(|c| c.message.content.trim().to_string())
                    .context("OpenAI translation response contained no choices")?;

                Ok(translated)
            },
            is_retryable_error,
        )
        .await
    }
}

#[async_trait]
impl Translate for OpenAiTranslator {
    async fn translate(&self, text: &str, target: Locale) -> Result<String, TranslateError> {
        // The canonical locale is never a translation target
        if target.is_canonical() {
            return Ok(text.to_string());
        }

        self.request_translation(text, target)
            .await
            .map_err(|source| TranslateError {
                locale: target,
                source,
            })
    }
}

/// Determine if an error is retryable (5xx errors, 429 rate limit, network errors)
/// Other 4xx client errors should not be retried
fn is_retryable_error(error: &anyhow::Error) -> bool {
    let error_str = error.to_string();

    // Error format: "OpenAI API error during translation (400 Bad Request): ..."
    if error_str.contains("OpenAI API error") {
        if let Some(start) = error_str.find('(') {
            if let Some(end) = error_str[start..].find(')') {
                let status_str = &error_str[start + 1..start + end];
                let status_num = status_str.split_whitespace().next().unwrap_or("");
                if let Ok(status) = status_num.parse::<u16>() {
                    // Retry 429 (rate limit) and 5xx errors only
                    return status == 429 || status >= 500;
                }
            }
        }
    }

    // Network errors, timeouts, and other transient failures
    true
}
