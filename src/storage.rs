use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::sync::{Arc, Mutex};

// 1. StorageService Contract
/// StorageService
///
/// The object storage layer that article images are written to. Production talks to
/// Cloudflare R2 (MinIO locally) through `S3StorageClient`; tests use `MockStorageService`.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup
    /// to provision the bucket in MinIO. Never called in production.
    async fn ensure_bucket_exists(&self);

    /// Writes `body` under `key` and returns the public URL the object is served from.
    ///
    /// # Arguments
    /// * `key`: The final object key in the bucket.
    /// * `body`: The file contents, already read into memory.
    /// * `content_type`: The MIME type stored with the object (e.g., "image/png").
    async fn upload_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String>;
}

/// Joins the public base URL and an object key without doubling the slash.
pub fn public_object_url(public_url: &str, key: &str) -> String {
    format!("{}/{}", public_url.trim_end_matches('/'), key)
}

// 2. The Real Implementation (R2/MinIO)
/// S3StorageClient
///
/// The implementation using the AWS SDK for S3. R2 and MinIO both speak the S3 API,
/// so only the endpoint and credentials differ between environments.
///
/// `force_path_style(true)` is required for MinIO.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_url: String,
}

impl S3StorageClient {
    /// new
    ///
    /// Constructs the S3 client using credentials and configuration from AppConfig.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            bucket_name: bucket.to_string(),
            public_url: public_url.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// ensure_bucket_exists
    ///
    /// CreateBucket on an existing bucket fails harmlessly, so this is safe to call at startup.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    /// upload_object
    ///
    /// A single server-side PutObject; the image never touches the local disk.
    async fn upload_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String> {
        let key = object_key(key)?;

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(code = "[STORAGE] UploadImage - 1", error = %e);
                e.to_string()
            })?;

        Ok(public_object_url(&self.public_url, &key))
    }
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// The key actually written by every `StorageService`: sanitized, and never empty.
fn object_key(key: &str) -> Result<String, String> {
    let sanitized = sanitize_key(key);
    if sanitized.is_empty() {
        return Err(format!("invalid object key: {:?}", key));
    }
    Ok(sanitized)
}

// 3. The Mock Implementation (For Tests)
/// StoredObject
///
/// What `MockStorageService` remembers about each upload.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

/// MockStorageService
///
/// In-memory `StorageService` used by the test suites. Records every upload so
/// tests can assert on keys and content types without a network connection.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    uploads: Arc<Mutex<Vec<StoredObject>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<StoredObject> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn upload_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        let sanitized_key = object_key(key)?;
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(StoredObject {
                key: sanitized_key.clone(),
                content_type: content_type.to_string(),
                size: body.len(),
            });
        }

        Ok(public_object_url("http://localhost:9000/mock-bucket", &sanitized_key))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key_strips_traversal() {
        assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_key("./a//b/../c.png"), "a/b/c.png");
    }

    #[test]
    fn test_object_key_rejects_keys_that_sanitize_to_nothing() {
        assert_eq!(object_key("../1-2.png"), Ok("1-2.png".to_string()));
        assert!(object_key("../..").is_err());
        assert!(object_key("").is_err());
    }

    #[test]
    fn test_public_url_join() {
        assert_eq!(
            public_object_url("https://cdn.example.com/", "1-2.png"),
            "https://cdn.example.com/1-2.png"
        );
        assert_eq!(
            public_object_url("https://cdn.example.com", "1-2.png"),
            "https://cdn.example.com/1-2.png"
        );
    }

    #[tokio::test]
    async fn test_mock_records_uploads() {
        let storage = MockStorageService::new();
        let url = storage
            .upload_object("7-123.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:9000/mock-bucket/7-123.png");
        assert_eq!(
            storage.uploads(),
            vec![StoredObject {
                key: "7-123.png".into(),
                content_type: "image/png".into(),
                size: 3,
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let storage = MockStorageService::new_failing();
        assert!(storage.upload_object("k", vec![], "image/png").await.is_err());
        assert!(storage.uploads().is_empty());
    }
}
