//! Object-store HTTP client (§6 "Object store": LIST under a prefix,
//! paginated; GET by key; metadata via HEAD). Authentication is explicitly
//! out of scope (§1 Non-goals), so requests carry no signing — just the
//! bucket/region baked into the configured endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use ingest_core::config::{ObjectStoreConfig, RetryConfig};
use ingest_core::error::Result;
use ingest_core::retry::retry;
use ingest_core::traits::{ObjectMetadata, ObjectPage, ObjectStore};
use ingest_model::StorageObject;

use crate::error::require_success;
use crate::http::HttpConfig;

pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    retry: RetryConfig,
}

impl HttpObjectStore {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self> {
        let client = HttpConfig::with_timeout_secs(config.get_timeout_secs)
            .build_client()
            .map_err(|e| e.into_ingest_error(&config.endpoint))?;
        Ok(Self { client, endpoint: config.endpoint.clone(), bucket: config.bucket.clone(), retry: config.retry })
    }

    fn list_url(&self, prefix: &str, continuation_token: Option<&str>) -> String {
        let mut url = format!("{}/{}?prefix={}", self.endpoint, self.bucket, urlencode(prefix));
        if let Some(token) = continuation_token {
            url.push_str("&continuation-token=");
            url.push_str(&urlencode(token));
        }
        url
    }

    fn object_url(&self, storage_key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, storage_key.trim_start_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    objects: Vec<ListedObject>,
    continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    key: String,
    size: u64,
    last_modified: DateTime<Utc>,
    content_type: String,
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn list(&self, prefix: &str, continuation_token: Option<&str>) -> Result<ObjectPage> {
        let url = self.list_url(prefix, continuation_token);
        retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;
            let response = require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
            let parsed: ListResponse = response
                .json()
                .await
                .map_err(|e| crate::error::ClientError::decode(&url, e.to_string()).into_ingest_error(&url))?;

            Ok(ObjectPage {
                objects: parsed
                    .objects
                    .into_iter()
                    .map(|o| ObjectMetadata {
                        storage_key: o.key,
                        size: o.size,
                        last_modified: o.last_modified,
                        content_type: o.content_type,
                    })
                    .collect(),
                continuation_token: parsed.continuation_token,
            })
        })
        .await
    }

    async fn head(&self, storage_key: &str) -> Result<Option<StorageObject>> {
        let url = self.object_url(storage_key);
        retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
            let response = self
                .client
                .head(&url)
                .send()
                .await
                .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let response = require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;

            let size = response
                .headers()
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/octet-stream")
                .to_string();
            let last_modified = response
                .headers()
                .get(reqwest::header::LAST_MODIFIED)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);

            Ok(Some(StorageObject::new(storage_key, size, last_modified, content_type)))
        })
        .await
    }

    async fn get(&self, storage_key: &str) -> Result<Option<Vec<u8>>> {
        let url = self.object_url(storage_key);
        retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let response = require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;
            Ok(Some(bytes.to_vec()))
        })
        .await
    }
}

fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_reserved_characters() {
        assert_eq!(urlencode("docs/a b.txt"), "docs/a%20b.txt");
        assert_eq!(urlencode("a&b=c"), "a%26b%3Dc");
        assert_eq!(urlencode("plain-key_1.0"), "plain-key_1.0");
    }
}
