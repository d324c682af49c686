//! Event-queue HTTP client (§6 "Event queue"): long-poll receive, delete
//! by receipt handle, decode `s3:ObjectCreated:*` / `s3:ObjectRemoved:*`
//! notification records into `WorkEvent`s.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use ingest_core::config::{QueueConfig, RetryConfig};
use ingest_core::error::Result;
use ingest_core::retry::retry;
use ingest_core::traits::{EventQueue, QueueMessage};
use ingest_model::{EventOrigin, WorkEvent};

use crate::error::require_success;
use crate::http::HttpConfig;

pub struct HttpEventQueue {
    client: reqwest::Client,
    endpoint: String,
    long_poll_timeout_secs: u64,
    retry: RetryConfig,
}

impl HttpEventQueue {
    pub fn new(config: &QueueConfig) -> Result<Self> {
        // The long-poll wait itself exceeds the request timeout unless we
        // pad for it; add a fixed grace period on top.
        let client = HttpConfig::with_timeout_secs(config.long_poll_timeout_secs + 10)
            .build_client()
            .map_err(|e| e.into_ingest_error(&config.url))?;
        Ok(Self {
            client,
            endpoint: config.url.clone(),
            long_poll_timeout_secs: config.long_poll_timeout_secs,
            retry: config.retry,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReceiveResponse {
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    receipt_handle: String,
    body: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    #[serde(rename = "eventName")]
    event_name: String,
    s3: S3Ref,
}

#[derive(Debug, Deserialize)]
struct S3Ref {
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

fn decode_record(record: &NotificationRecord) -> Option<WorkEvent> {
    if record.event_name.starts_with("s3:ObjectCreated") {
        Some(WorkEvent::create(record.s3.object.key.clone(), EventOrigin::Queue))
    } else if record.event_name.starts_with("s3:ObjectRemoved") {
        Some(WorkEvent::delete(record.s3.object.key.clone(), EventOrigin::Queue))
    } else {
        None
    }
}

#[async_trait]
impl EventQueue for HttpEventQueue {
    async fn receive(&self, max_messages: u32) -> Result<Vec<QueueMessage>> {
        let url = format!(
            "{}?max_messages={}&wait_seconds={}",
            self.endpoint,
            max_messages.min(10),
            self.long_poll_timeout_secs
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;
        let response = require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
        let parsed: ReceiveResponse = response
            .json()
            .await
            .map_err(|e| crate::error::ClientError::decode(&url, e.to_string()).into_ingest_error(&url))?;

        Ok(parsed
            .messages
            .into_iter()
            .map(|m| QueueMessage {
                receipt_handle: m.receipt_handle,
                events: m.body.iter().filter_map(decode_record).collect(),
            })
            .collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        let url = format!("{}/{}", self.endpoint, receipt_handle);
        retry(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms), &url, || async {
            let response = self
                .client
                .delete(&url)
                .send()
                .await
                .map_err(|e| crate::error::ClientError::request(&url, e).into_ingest_error(&url))?;
            require_success(&url, response).await.map_err(|e| e.into_ingest_error(&url))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_and_removed_events_decode_to_the_right_kind() {
        let created = NotificationRecord {
            event_name: "s3:ObjectCreated:Put".to_string(),
            s3: S3Ref { object: S3Object { key: "docs/a.txt".to_string() } },
        };
        let removed = NotificationRecord {
            event_name: "s3:ObjectRemoved:Delete".to_string(),
            s3: S3Ref { object: S3Object { key: "docs/b.txt".to_string() } },
        };
        let unknown = NotificationRecord {
            event_name: "s3:ObjectRestore:Completed".to_string(),
            s3: S3Ref { object: S3Object { key: "docs/c.txt".to_string() } },
        };

        assert!(matches!(decode_record(&created), Some(WorkEvent { kind: ingest_model::WorkKind::Create, .. })));
        assert!(matches!(decode_record(&removed), Some(WorkEvent { kind: ingest_model::WorkKind::Delete, .. })));
        assert!(decode_record(&unknown).is_none());
    }
}
