//! Search-index HTTP client (§6 "Search index"): index create with an
//! explicit mapping (`storage_key` keyword, `content_hash` keyword,
//! `content` text, `vector` dense_vector), document PUT by id, document
//! DELETE by term query on `storage_key`, term search on `content_hash`.
//! Speaks the Elasticsearch/OpenSearch-style REST surface the mapping
//! language in §6 describes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use ingest_core::config::{IndexConfig, RetryConfig};
use ingest_core::error::Result;
use ingest_core::retry::retry;
use ingest_core::traits::SearchIndex;
use ingest_model::{EmbeddedChunk, IndexedRecord};

use crate::error::require_success;
use crate::http::HttpConfig;

pub struct HttpSearchIndex {
    client: reqwest::Client,
    endpoint: String,
    name: String,
    vector_dimension: usize,
    retry: RetryConfig,
}

impl HttpSearchIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = HttpConfig::with_timeout_secs(config.upsert_timeout_secs)
            .build_client()
            .map_err(|e| e.into_ingest_error(&config.endpoint))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            name: config.name.clone(),
            vector_dimension: config.vector_dimension,
            retry: config.retry,
        })
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.name)
    }

    fn doc_url(&self, record_id: &str) -> String {
        format!("{}/{}/_doc/{}", self.endpoint, self.name, record_id)
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn ensure_index(&self) -> Result<()> {
        let url = self.index_url();
        let mapping = json!({
            "mappings": {
                "properties": {
                    "storage_key": {"type": "keyword"},
                    "content_hash": {"type": "keyword"},
                    "content": {"type": "text"},
                    "vector": {"type": "dense_vector", "dims": self.vector_dimension, "similarity": "cosine"},
                }
            }
        });
        retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
            let response = self
                .client
                .put(&url)
                .json(&mapping)
                .send()
                .await
                .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;

            // An index that already exists is not an error for this idempotent call.
            if response.status() == reqwest::StatusCode::CONFLICT {
                return Ok(());
            }
            require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
            Ok(())
        })
        .await
    }

    async fn lookup_by_fingerprint(&self, fingerprint: &str) -> Result<Option<String>> {
        let url = format!("{}/_search", self.index_url());
        let query = json!({
            "size": 1,
            "query": {"term": {"content_hash": fingerprint}},
        });
        let parsed: serde_json::Value =
            retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
                let response = self
                    .client
                    .post(&url)
                    .json(&query)
                    .send()
                    .await
                    .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;
                let response = require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
                response
                    .json()
                    .await
                    .map_err(|e| crate::error::ClientError::decode(&url, e.to_string()).into_ingest_error(&url))
            })
            .await?;

        let storage_key = parsed
            .pointer("/hits/hits/0/_source/storage_key")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Ok(storage_key)
    }

    async fn upsert_document(&self, storage_key: &str, chunks: &[EmbeddedChunk], fingerprint: &str) -> Result<()> {
        self.delete_by_storage_key(storage_key).await?;

        let indexed_at = Utc::now();
        let chunk_count = chunks.len();
        for chunk in chunks {
            let record = IndexedRecord::new(
                storage_key,
                chunk.text.clone(),
                &ingest_model::ContentFingerprint::from_hex(fingerprint.to_string()),
                chunk.vector.clone(),
                chunk.chunk_index,
                chunk_count,
                indexed_at,
            );
            let url = self.doc_url(&record.record_id);
            retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
                let response = self
                    .client
                    .put(&url)
                    .json(&record)
                    .send()
                    .await
                    .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;
                require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
                Ok(())
            })
            .await?;
        }
        Ok(())
    }

    async fn delete_by_storage_key(&self, storage_key: &str) -> Result<u64> {
        let url = format!("{}/_delete_by_query", self.index_url());
        let query = json!({"query": {"term": {"storage_key": storage_key}}});
        let parsed: serde_json::Value =
            retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
                let response = self
                    .client
                    .post(&url)
                    .json(&query)
                    .send()
                    .await
                    .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;
                let response = require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
                response
                    .json()
                    .await
                    .map_err(|e| crate::error::ClientError::decode(&url, e.to_string()).into_ingest_error(&url))
            })
            .await?;
        Ok(parsed.get("deleted").and_then(|v| v.as_u64()).unwrap_or(0))
    }

    async fn list_storage_keys(&self, continuation_token: Option<&str>) -> Result<(Vec<String>, Option<String>)> {
        let from: u64 = continuation_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        const PAGE_SIZE: u64 = 500;

        let url = format!("{}/_search", self.index_url());
        let query = json!({
            "from": from,
            "size": PAGE_SIZE,
            "collapse": {"field": "storage_key"},
            "query": {"match_all": {}},
        });
        let parsed: serde_json::Value =
            retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
                let response = self
                    .client
                    .post(&url)
                    .json(&query)
                    .send()
                    .await
                    .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;
                let response = require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
                response
                    .json()
                    .await
                    .map_err(|e| crate::error::ClientError::decode(&url, e.to_string()).into_ingest_error(&url))
            })
            .await?;

        let hits = parsed.pointer("/hits/hits").and_then(|v| v.as_array()).cloned().unwrap_or_default();
        let keys: Vec<String> = hits
            .iter()
            .filter_map(|hit| hit.pointer("/_source/storage_key").and_then(|v| v.as_str()).map(str::to_string))
            .collect();

        let next = if keys.len() as u64 == PAGE_SIZE { Some((from + PAGE_SIZE).to_string()) } else { None };
        Ok((keys, next))
    }
}
