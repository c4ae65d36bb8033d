//! Gemini API key provider (Generative Language API).

use anyhow::{Context, Result};
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::config::Config;
use crate::locale::Language;
use crate::prompts::diagnosis_prompt;
use crate::providers::DiagnosisModel;
use crate::providers::shared::{
    ProviderError, ProviderResult, USER_AGENT, classify_reqwest_error, resolve_api_key,
    resolve_base_url,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_output_tokens: Option<u32>,
}

impl GeminiConfig {
    /// Creates a new config from environment.
    ///
    /// Authentication resolution order:
    /// 1. `config_api_key` parameter (from config file)
    /// 2. `GEMINI_API_KEY` environment variable
    ///
    /// Environment variables:
    /// - `GEMINI_API_KEY` (fallback if not in config)
    /// - `GEMINI_BASE_URL` (optional)
    ///
    /// # Errors
    /// Returns an error if no API key is available or the base URL is invalid.
    pub fn from_env(
        model: String,
        max_output_tokens: Option<u32>,
        config_base_url: Option<&str>,
        config_api_key: Option<&str>,
    ) -> Result<Self> {
        let api_key = resolve_api_key(config_api_key, "GEMINI_API_KEY", "gemini")?;
        let base_url = resolve_base_url(
            config_base_url,
            "GEMINI_BASE_URL",
            DEFAULT_BASE_URL,
            "Gemini",
        )?;

        Ok(Self {
            api_key,
            base_url,
            model,
            max_output_tokens,
        })
    }

    /// Builds the Gemini config from the loaded FloraGuard config.
    ///
    /// # Errors
    /// Returns an error if no API key is available or the base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let gemini = &config.providers.gemini;
        Self::from_env(
            config.model.clone(),
            config.max_output_tokens,
            gemini.effective_base_url(),
            gemini.effective_api_key(),
        )
    }
}

/// Gemini client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Sends one prompt + image turn to `generateContent` and returns the
    /// concatenated text of the first candidate.
    ///
    /// # Errors
    /// Returns a [`ProviderError`] (wrapped in `anyhow`) for transport
    /// failures, non-2xx responses, and responses without text.
    pub async fn generate_text(&self, prompt: &str, image: &[u8], mime_type: &str) -> Result<String> {
        let request = build_diagnosis_request(prompt, image, mime_type, self.config.max_output_tokens);
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        tracing::debug!(
            model = %self.config.model,
            mime_type,
            image_bytes = image.len(),
            "sending diagnosis request"
        );

        let response = self
            .http
            .post(url)
            .headers(build_headers(&self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ProviderError::http_status(status.as_u16(), &body).into());
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::parse(format!("Invalid Gemini response JSON: {e}"), &body))?;
        let text = parse_text_response(&value)?;
        tracing::debug!(response_len = text.len(), "received diagnosis response");
        Ok(text)
    }
}

impl DiagnosisModel for GeminiClient {
    async fn diagnose(&self, image: &[u8], mime_type: &str, language: Language) -> Result<String> {
        let prompt = diagnosis_prompt(language)?;
        self.generate_text(&prompt, image, mime_type)
            .await
            .with_context(|| format!("Gemini request to model '{}' failed", self.config.model))
    }
}

fn build_diagnosis_request(
    prompt: &str,
    image: &[u8],
    mime_type: &str,
    max_output_tokens: Option<u32>,
) -> Value {
    let mut request = json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": prompt },
                {
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": base64::engine::general_purpose::STANDARD.encode(image),
                    }
                }
            ]
        }]
    });

    if let Some(max) = max_output_tokens {
        request["generationConfig"] = json!({ "maxOutputTokens": max });
    }
    request
}

fn parse_text_response(value: &Value) -> ProviderResult<String> {
    let body = || value.to_string();

    if let Some(reason) = value
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(ProviderError::api_error(
            "blocked",
            &format!("Gemini refused the request ({reason})"),
        ));
    }

    let candidate = value
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| ProviderError::parse("Gemini response has no candidates", &body()))?;

    let text: String = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        let finish = candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        return Err(ProviderError::parse(
            format!("Gemini response has no text (finish reason: {finish})"),
            &body(),
        ));
    }

    Ok(text)
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-goog-api-key",
        HeaderValue::from_str(api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("accept", HeaderValue::from_static("application/json"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}
