//! Artifact storage capability.
//!
//! The workflow hands capture bytes to an [`ArtifactStore`] and gets back a
//! durable URL. The production [`HttpObjectStore`] PUTs to an S3-compatible
//! endpoint; [`MemoryStore`] records uploads in memory for tests. Keys are
//! namespaced by a configured prefix plus a timestamp-derived filename with
//! every URL-unsafe separator replaced.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Mutex;

/// Content type for uploaded captures
pub const IMAGE_CONTENT_TYPE: &str = "image/png";

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while persisting an artifact
#[derive(Debug)]
pub enum StoreError {
    /// Transport-level failure reaching the backend
    Http(String),

    /// The backend answered with a non-success status
    Status {
        /// HTTP status code
        code: u16,
        /// Object URL the upload targeted
        url: String,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Http(msg) => write!(f, "storage request failed: {}", msg),
            StoreError::Status { code, url } => {
                write!(f, "storage rejected upload to {} with status {}", url, code)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Put-artifact capability of the object-storage backend
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` under `key` with the given content type, returning the
    /// externally resolvable URL
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<String>;
}

/// Object store speaking S3-compatible HTTP PUT
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpObjectStore {
    /// Store targeting the bucket's virtual-hosted S3 URL
    pub fn new(region: &str, bucket: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        }
    }

    /// Store targeting a custom S3-compatible endpoint (path-style)
    pub fn with_endpoint(endpoint: &str, bucket: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        }
    }

    /// Full object URL for `key`
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ArtifactStore for HttpObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<String> {
        let url = self.object_url(key);
        log::debug!("uploading {} bytes to {}", bytes.len(), url);

        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                code: response.status().as_u16(),
                url,
            });
        }

        Ok(url)
    }
}

/// A single object recorded by [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object key
    pub key: String,
    /// Content type the object was stored with
    pub content_type: String,
    /// Object payload
    pub bytes: Vec<u8>,
}

/// In-memory store for tests, mirroring the production URL shape
pub struct MemoryStore {
    base_url: String,
    fail_with: Option<String>,
    puts: Mutex<Vec<StoredObject>>,
}

impl MemoryStore {
    /// Store mirroring the virtual-hosted URL for `bucket` in `region`
    pub fn new(region: &str, bucket: &str) -> Self {
        Self {
            base_url: format!("https://{}.s3.{}.amazonaws.com", bucket, region),
            fail_with: None,
            puts: Mutex::new(Vec::new()),
        }
    }

    /// Store whose every put fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            base_url: String::new(),
            fail_with: Some(message.into()),
            puts: Mutex::new(Vec::new()),
        }
    }

    /// Objects stored so far
    pub fn puts(&self) -> Vec<StoredObject> {
        self.puts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of successful puts
    pub fn put_count(&self) -> usize {
        self.puts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<String> {
        if let Some(msg) = &self.fail_with {
            return Err(StoreError::Http(msg.clone()));
        }
        if let Ok(mut puts) = self.puts.lock() {
            puts.push(StoredObject {
                key: key.to_string(),
                content_type: content_type.to_string(),
                bytes,
            });
        }
        Ok(format!("{}/{}", self.base_url, key))
    }
}

// ============================================================================
// Key naming
// ============================================================================

/// Build the object key for a capture taken at `now`:
/// `{prefix}/component_{timestamp}.png`, timestamp separators sanitized.
pub fn artifact_key(prefix: &str, now: DateTime<Utc>) -> String {
    let timestamp = sanitize_timestamp(&now.to_rfc3339_opts(SecondsFormat::Millis, true));
    format!("{}/component_{}.png", prefix.trim_matches('/'), timestamp)
}

/// Replace every character outside `[A-Za-z0-9-]` with `-` so the name is
/// filesystem- and URL-safe (no raw colons or periods from the timestamp)
fn sanitize_timestamp(timestamp: &str) -> String {
    timestamp
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' => c,
            _ => '-',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_timestamp() {
        assert_eq!(
            sanitize_timestamp("2026-08-06T12:34:56.789Z"),
            "2026-08-06T12-34-56-789Z"
        );
        assert_eq!(sanitize_timestamp("already-safe"), "already-safe");
    }

    #[test]
    fn test_artifact_key() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 34, 56).unwrap();
        let key = artifact_key("component-captures", now);
        assert_eq!(key, "component-captures/component_2026-08-06T12-34-56-000Z.png");
    }

    #[test]
    fn test_artifact_key_trims_prefix_slashes() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 0, 0, 0).unwrap();
        let key = artifact_key("/captures/", now);
        assert!(key.starts_with("captures/component_"));
    }

    #[test]
    fn test_artifact_key_name_is_url_safe() {
        let key = artifact_key("captures", Utc::now());
        let name = key.rsplit('/').next().unwrap();
        let stem = name.strip_suffix(".png").unwrap();
        assert!(
            stem.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "unsafe character in artifact name: {}",
            name
        );
    }

    #[tokio::test]
    async fn test_memory_store_records_puts() {
        let store = MemoryStore::new("us-east-1", "test-bucket");
        let url = store
            .put("captures/component_x.png", vec![1, 2, 3], IMAGE_CONTENT_TYPE)
            .await
            .unwrap();

        assert_eq!(
            url,
            "https://test-bucket.s3.us-east-1.amazonaws.com/captures/component_x.png"
        );
        let puts = store.puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].content_type, IMAGE_CONTENT_TYPE);
        assert_eq!(puts[0].bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_memory_store_failing() {
        let store = MemoryStore::failing("bucket offline");
        let err = store
            .put("k", vec![], IMAGE_CONTENT_TYPE)
            .await
            .err()
            .expect("failing store should error");
        assert!(err.to_string().contains("bucket offline"));
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_http_store_put() {
        let server = httpmock::MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::PUT)
                    .path("/test-bucket/captures/component_x.png")
                    .header("content-type", IMAGE_CONTENT_TYPE);
                then.status(200);
            })
            .await;

        let store = HttpObjectStore::with_endpoint(&server.base_url(), "test-bucket");
        let url = store
            .put("captures/component_x.png", vec![0xAA; 16], IMAGE_CONTENT_TYPE)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(url.ends_with("/test-bucket/captures/component_x.png"));
    }

    #[tokio::test]
    async fn test_http_store_rejection() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::PUT);
                then.status(403);
            })
            .await;

        let store = HttpObjectStore::with_endpoint(&server.base_url(), "test-bucket");
        let err = store
            .put("captures/denied.png", vec![1], IMAGE_CONTENT_TYPE)
            .await
            .err()
            .expect("403 should surface as an error");
        assert!(matches!(err, StoreError::Status { code: 403, .. }));
    }
}
