//! Embedding-service HTTP client (§6 "Embedding service": `POST /embed`
//! with `{model, text, normalize}`, response `{embedding: [float, ...]}`).
//! The trait batches (§4.B); this client issues one request per text and
//! joins them, since the wire contract is single-text per call.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ingest_core::config::{EmbeddingConfig, RetryConfig};
use ingest_core::error::Result;
use ingest_core::retry::retry;
use ingest_core::traits::EmbeddingBackend;

use crate::error::require_success;
use crate::http::HttpConfig;

pub struct HttpEmbeddingBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    normalize: bool,
    retry: RetryConfig,
    dimension: OnceLock<usize>,
}

impl HttpEmbeddingBackend {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = HttpConfig::with_timeout_secs(config.request_timeout_secs)
            .build_client()
            .map_err(|e| e.into_ingest_error(&config.endpoint))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            normalize: config.normalize,
            retry: config.retry,
            dimension: OnceLock::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    text: &'a str,
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            let request = EmbedRequest { model: &self.model, text, normalize: self.normalize };
            let parsed: EmbedResponse =
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
                .await?;

            let _ = self.dimension.get_or_init(|| parsed.embedding.len());
            vectors.push(parsed.embedding);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }
}
