//! Synap-backed store
//!
//! Speaks the StreamableHTTP command protocol:
//!
//! ```json
//! {
//!   "command": "hash.get",
//!   "request_id": "uuid",
//!   "payload": { "key": "<group>", "field": "<field>" }
//! }
//! ```
//!
//! Synap hashes carry no per-field expiry, so each value is stored as an
//! envelope with an absolute deadline in unix milliseconds:
//!
//! ```json
//! { "exp": 1700000010000, "data": "<base64 payload>" }
//! ```
//!
//! A read past the deadline is absent and the field is dropped. Deleting a
//! group lists its fields with `hash.keys` and removes them with `hash.del`.

use super::CacheStore;
use crate::config::SynapStoreConfig;
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use url::Url;

/// Cache store backed by a Synap server's hashes
#[derive(Clone)]
pub struct SynapStore {
    http_client: Client,
    command_url: Url,
}

impl SynapStore {
    /// Create a new store client. The connection pool is shared by clones.
    pub fn new(config: SynapStoreConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let command_url = base_url.join("api/v1/command")?;

        let mut builder = Client::builder().timeout(config.timeout);

        if let Some(ref token) = config.auth_token {
            let value = format!("Bearer {}", token)
                .parse::<reqwest::header::HeaderValue>()
                .map_err(|_| CacheError::Config("auth token is not a valid header".to_string()))?;
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            command_url,
        })
    }

    pub fn command_url(&self) -> &Url {
        &self.command_url
    }

    async fn send_command(&self, command: &str, payload: Value) -> Result<Value> {
        let request_id = uuid::Uuid::new_v4().to_string();

        let body = json!({
            "command": command,
            "request_id": request_id,
            "payload": payload,
        });

        let response = self
            .http_client
            .post(self.command_url.clone())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CacheError::StoreUnavailable(format!(
                "{} returned {}: {}",
                command, status, error_text
            )));
        }

        let result: Value = response.json().await?;

        if !result["success"].as_bool().unwrap_or(false) {
            let error_msg = result["error"].as_str().unwrap_or("Unknown error");
            return Err(CacheError::StoreUnavailable(format!(
                "{} failed: {}",
                command, error_msg
            )));
        }

        debug!("{} ok request_id={}", command, request_id);
        Ok(result["payload"].clone())
    }
}

/// Stored form of a cached value
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// Deadline in unix milliseconds
    exp: u64,
    /// Base64 payload
    data: String,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn deadline_millis(ttl: Duration) -> u64 {
    now_millis().saturating_add(ttl.as_millis().min(u64::MAX as u128) as u64)
}

impl SynapStore {
    async fn drop_fields(&self, group: &str, fields: Vec<String>) -> Result<()> {
        let payload = json!({
            "key": group,
            "fields": fields,
        });
        self.send_command("hash.del", payload).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for SynapStore {
    async fn get(&self, group: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let payload = json!({
            "key": group,
            "field": field,
        });

        let response = self.send_command("hash.get", payload).await?;

        let found = response
            .get("found")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let value = match response.get("value") {
            Some(value) if found && !value.is_null() => value.clone(),
            _ => return Ok(None),
        };

        let envelope: Envelope = serde_json::from_value(value)
            .map_err(|e| CacheError::StaleDeserialization(format!("invalid envelope: {}", e)))?;

        if now_millis() >= envelope.exp {
            debug!("expired group={} field={}", group, field);
            if let Err(e) = self.drop_fields(group, vec![field.to_string()]).await {
                warn!(group = %group, error = %e, "failed to drop expired field");
            }
            return Ok(None);
        }

        STANDARD
            .decode(&envelope.data)
            .map(Some)
            .map_err(|e| CacheError::StaleDeserialization(format!("invalid base64 value: {}", e)))
    }

    async fn set(&self, group: &str, field: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let envelope = Envelope {
            exp: deadline_millis(ttl),
            data: STANDARD.encode(value),
        };
        let payload = json!({
            "key": group,
            "field": field,
            "value": envelope,
        });

        self.send_command("hash.set", payload).await?;
        Ok(())
    }

    async fn delete(&self, group: &str) -> Result<()> {
        let response = self
            .send_command("hash.keys", json!({"key": group}))
            .await?;

        let fields: Vec<String> = response
            .get("keys")
            .and_then(|v| v.as_array())
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| k.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        if fields.is_empty() {
            return Ok(());
        }
        self.drop_fields(group, fields).await
    }
}
