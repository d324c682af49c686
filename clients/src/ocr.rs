//! OCR backend clients (§6 "OCR service (fast path)" / "OCR service (LLM
//! path)"). Which one runs is a static, process-lifetime choice read once
//! from `Config` at startup (§9, open question 3) — `HttpOcrBackend::new`
//! picks the concrete implementation and the pipeline only ever sees the
//! `OcrBackend` trait object.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use ingest_core::config::{OcrConfig, OcrMode, RetryConfig};
use ingest_core::error::Result;
use ingest_core::retry::retry;
use ingest_extract::{OcrBackend, OcrUnit};

use crate::error::require_success;
use crate::http::HttpConfig;

pub struct HttpOcrBackend {
    inner: Backend,
}

enum Backend {
    Fast(FastOcrClient),
    Llm(LlmOcrClient),
}

impl HttpOcrBackend {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let inner = match config.mode {
            OcrMode::Fast => {
                let endpoint = config
                    .fast_endpoint
                    .clone()
                    .ok_or_else(|| ingest_core::error::IngestError::Config("ocr.fast_endpoint is required when mode = \"fast\"".into()))?;
                Backend::Fast(FastOcrClient::new(endpoint, config.request_timeout_secs, config.retry)?)
            }
            OcrMode::Llm => {
                let endpoint = config
                    .llm_endpoint
                    .clone()
                    .ok_or_else(|| ingest_core::error::IngestError::Config("ocr.llm_endpoint is required when mode = \"llm\"".into()))?;
                let model = config
                    .llm_model
                    .clone()
                    .ok_or_else(|| ingest_core::error::IngestError::Config("ocr.llm_model is required when mode = \"llm\"".into()))?;
                Backend::Llm(LlmOcrClient::new(endpoint, model, config.request_timeout_secs, config.retry)?)
            }
        };
        Ok(Self { inner })
    }
}

#[async_trait]
impl OcrBackend for HttpOcrBackend {
    async fn extract_text(&self, unit: &OcrUnit) -> ingest_extract::Result<String> {
        match &self.inner {
            Backend::Fast(client) => client.extract_text(unit).await,
            Backend::Llm(client) => client.extract_text(unit).await,
        }
    }
}

/// `POST /ocr` multipart/form-data, field `file`. `{status, content, total_pages}` on 200.
struct FastOcrClient {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryConfig,
}

impl FastOcrClient {
    fn new(endpoint: String, timeout_secs: u64, retry: RetryConfig) -> Result<Self> {
        let client = HttpConfig::with_timeout_secs(timeout_secs).build_client().map_err(|e| e.into_ingest_error(&endpoint))?;
        Ok(Self { client, endpoint, retry })
    }
}

#[derive(Debug, Deserialize)]
struct FastOcrResponse {
    #[allow(dead_code)]
    status: String,
    content: String,
    #[allow(dead_code)]
    total_pages: Option<u32>,
}

#[async_trait]
impl OcrBackend for FastOcrClient {
    /// Retried by this concrete client, not the extractor (§4.A: 3
    /// attempts, exponential backoff, then hard-fail the document).
    async fn extract_text(&self, unit: &OcrUnit) -> ingest_extract::Result<String> {
        let parsed: FastOcrResponse =
            retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &self.endpoint, || async {
                let part = reqwest::multipart::Part::bytes(unit.bytes.clone())
                    .file_name(format!("page-{}", unit.page_index))
                    .mime_str(&unit.mime_type)
                    .map_err(|e| ingest_core::error::IngestError::permanent(&self.endpoint, e.to_string()))?;
                let form = reqwest::multipart::Form::new().part("file", part);

                let response = self
                    .client
                    .post(&self.endpoint)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| crate::error::ClientError::request(&self.endpoint, e).into_ingest_error(&self.endpoint))?;
                let response = require_success(&self.endpoint, response)
                    .await
                    .map_err(|e| e.into_ingest_error(&self.endpoint))?;

                response.json().await.map_err(|e| {
                    crate::error::ClientError::decode(&self.endpoint, e.to_string()).into_ingest_error(&self.endpoint)
                })
            })
            .await
            .map_err(|e| ingest_extract::ExtractError::Ocr(e.to_string()))?;
        Ok(parsed.content)
    }
}

/// OpenAI-compatible `POST /v1/chat/completions` with an image data-URI.
struct LlmOcrClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    retry: RetryConfig,
}

impl LlmOcrClient {
    fn new(endpoint: String, model: String, timeout_secs: u64, retry: RetryConfig) -> Result<Self> {
        let client = HttpConfig::with_timeout_secs(timeout_secs).build_client().map_err(|e| e.into_ingest_error(&endpoint))?;
        Ok(Self { client, endpoint, model, retry })
    }
}

const OCR_PROMPT: &str = "Transcribe all visible text in this image exactly, preserving reading order. Respond with the transcription only.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl OcrBackend for LlmOcrClient {
    /// Retried by this concrete client, not the extractor (§4.A: 3
    /// attempts, exponential backoff, then hard-fail the document).
    async fn extract_text(&self, unit: &OcrUnit) -> ingest_extract::Result<String> {
        let data_uri = format!(
            "data:{};base64,{}",
            unit.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&unit.bytes)
        );
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: OCR_PROMPT.to_string() },
                    ContentPart::ImageUrl { image_url: ImageUrl { url: data_uri } },
                ],
            }],
        };

        let parsed: ChatResponse =
            retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &self.endpoint, || async {
                let response = self.client.post(&self.endpoint).json(&request).send().await.map_err(|e| {
                    crate::error::ClientError::request(&self.endpoint, e).into_ingest_error(&self.endpoint)
                })?;
                let response = require_success(&self.endpoint, response)
                    .await
                    .map_err(|e| e.into_ingest_error(&self.endpoint))?;
                response.json().await.map_err(|e| {
                    crate::error::ClientError::decode(&self.endpoint, e.to_string()).into_ingest_error(&self.endpoint)
                })
            })
            .await
            .map_err(|e| ingest_extract::ExtractError::Ocr(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ingest_extract::ExtractError::Ocr("no choices in chat completion response".to_string()))
    }
}
