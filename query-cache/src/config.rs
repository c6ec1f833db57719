//! Cache and store configuration
//!
//! Both configs are plain builders and can also be loaded from YAML:
//!
//! ```yaml
//! cache:
//!   default_ttl_secs: 10
//!   namespace: blog
//!   overwrite_stale: true
//! store:
//!   base_url: http://localhost:15500
//!   timeout_ms: 5000
//! ```

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default time-to-live for a populated entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Default request timeout for the network store
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Interceptor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied on population when the query does not carry its own
    #[serde(rename = "default_ttl_secs", with = "duration_secs")]
    pub default_ttl: Duration,
    /// Optional prefix for every group key written to the store
    pub namespace: Option<String>,
    /// Overwrite a cached payload that failed to decode with the fresh result
    pub overwrite_stale: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            namespace: None,
            overwrite_stale: true,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with the default TTL and no namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL used when a query does not override it
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Prefix every group key with `<namespace>:`
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Toggle overwriting of undecodable payloads
    pub fn with_overwrite_stale(mut self, overwrite: bool) -> Self {
        self.overwrite_stale = overwrite;
        self
    }

    /// Reject configurations that would populate entries which never live
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::Config("default_ttl must be non-zero".to_string()));
        }
        if matches!(self.namespace.as_deref(), Some("")) {
            return Err(CacheError::Config("namespace must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Network store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapStoreConfig {
    /// Base URL of the Synap server
    pub base_url: String,
    /// Request timeout
    #[serde(
        rename = "timeout_ms",
        with = "duration_millis",
        default = "default_store_timeout"
    )]
    pub timeout: Duration,
    /// Optional authentication token
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_store_timeout() -> Duration {
    DEFAULT_STORE_TIMEOUT
}

impl SynapStoreConfig {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_STORE_TIMEOUT,
            auth_token: None,
        }
    }

    /// Set the timeout for requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Combined settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheConfig,
    pub store: SynapStoreConfig,
}

impl Settings {
    /// Parse settings from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Self =
            serde_yaml::from_str(yaml).map_err(|e| CacheError::Config(e.to_string()))?;
        settings.cache.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CacheError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
