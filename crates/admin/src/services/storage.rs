//! Object storage client for product images.
//!
//! Talks to a Supabase-style storage REST API:
//!
//! - upload: `POST {url}/object/{bucket}/{path}` with `x-upsert: true`
//! - delete: `DELETE {url}/object/{bucket}/{path}`
//! - public URL: `{url}/object/public/{bucket}/{path}`
//!
//! Authentication is a bearer service key sent on every request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::StorageConfig;

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Extensions accepted for product images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Folder inside the bucket that holds product images.
const PRODUCT_FOLDER: &str = "products";

/// Errors that can occur when talking to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Invalid service key or other client setup problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File type not accepted.
    #[error("Unsupported image type; use jpg, jpeg, png, webp or gif")]
    UnsupportedType,

    /// File over [`MAX_IMAGE_BYTES`].
    #[error("Image is larger than 5 MB")]
    TooLarge,

    /// Zero-byte upload.
    #[error("Image file is empty")]
    Empty,
}

/// Object storage client.
#[derive(Clone)]
pub struct ObjectStorage {
    inner: Arc<ObjectStorageInner>,
}

struct ObjectStorageInner {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl ObjectStorage {
    /// Create a storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the service key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", config.service_key.expose_secret());
        let mut auth = HeaderValue::from_str(&bearer)
            .map_err(|e| StorageError::Config(format!("Invalid service key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(ObjectStorageInner {
                client,
                base_url: config.url.trim_end_matches('/').to_owned(),
                bucket: config.bucket.clone(),
            }),
        })
    }

    /// Upload `bytes` to `path` (replacing any object there) and return its
    /// public URL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Http` or `StorageError::Api` if the upload fails.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = format!("{}/object/{}/{path}", self.inner.base_url, self.inner.bucket);

        let response = self
            .inner
            .client
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        check_status(response).await?;

        tracing::info!(path, "Uploaded object");
        Ok(self.public_url(path))
    }

    /// Delete the object at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Http` or `StorageError::Api` if the delete fails.
    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let url = format!("{}/object/{}/{path}", self.inner.base_url, self.inner.bucket);
        let response = self.inner.client.delete(&url).send().await?;
        check_status(response).await?;

        tracing::info!(path, "Deleted object");
        Ok(())
    }

    /// Public URL of the object at `path`.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/object/public/{}/{path}",
            self.inner.base_url, self.inner.bucket
        )
    }

    /// The object path behind one of our public URLs, or `None` for any
    /// other URL.
    #[must_use]
    pub fn path_of(&self, public_url: &str) -> Option<String> {
        let prefix = self.public_url("");
        public_url
            .strip_prefix(&prefix)
            .filter(|path| !path.is_empty() && !path.contains(".."))
            .map(str::to_owned)
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let message = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), %message, "Storage request failed");
    Err(StorageError::Api {
        status: status.as_u16(),
        message,
    })
}

/// A checked image ready to upload.
#[derive(Debug)]
pub struct ImageUpload {
    pub extension: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check an uploaded file's type and size.
    ///
    /// The extension comes from the file name, falling back to the declared
    /// content type.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedType`, `StorageError::TooLarge` or
    /// `StorageError::Empty`.
    pub fn new(
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, StorageError> {
        let extension = file_name
            .and_then(extension_from_name)
            .or_else(|| content_type.and_then(extension_from_mime))
            .ok_or(StorageError::UnsupportedType)?;

        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::TooLarge);
        }

        Ok(Self {
            extension,
            content_type: mime_for(extension),
            bytes,
        })
    }
}

/// Object path for a new product image: `products/{unix_millis}-{4 hex}.{ext}`.
#[must_use]
pub fn product_image_path(extension: &str) -> String {
    let suffix: u16 = rand::rng().random();
    format!(
        "{PRODUCT_FOLDER}/{}-{suffix:04x}.{extension}",
        Utc::now().timestamp_millis()
    )
}

fn extension_from_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().copied().find(|allowed| *allowed == ext)
}

fn extension_from_mime(mime: &str) -> Option<&'static str> {
    match mime.split(';').next()?.trim() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn mime_for(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn storage() -> ObjectStorage {
        ObjectStorage::new(&StorageConfig {
            url: "https://abc.supabase.co/storage/v1/".to_owned(),
            service_key: SecretString::from("service-role-key"),
            bucket: "product-images".to_owned(),
        })
        .unwrap()
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            storage().public_url("products/1-00ff.png"),
            "https://abc.supabase.co/storage/v1/object/public/product-images/products/1-00ff.png"
        );
    }

    #[test]
    fn test_path_of_own_url() {
        let s = storage();
        let url = s.public_url("products/17-abcd.webp");
        assert_eq!(s.path_of(&url).unwrap(), "products/17-abcd.webp");
        assert!(s.path_of("https://cdn.elsewhere.test/products/1.png").is_none());
        assert!(s.path_of(&s.public_url("")).is_none());
    }

    #[test]
    fn test_extension_from_file_name() {
        let upload = ImageUpload::new(Some("Lota.JPEG"), None, vec![1, 2, 3]).unwrap();
        assert_eq!(upload.extension, "jpeg");
        assert_eq!(upload.content_type, "image/jpeg");
    }

    #[test]
    fn test_extension_from_content_type() {
        let upload = ImageUpload::new(Some("blob"), Some("image/webp"), vec![0]).unwrap();
        assert_eq!(upload.extension, "webp");
    }

    #[test]
    fn test_rejects_other_types() {
        assert!(matches!(
            ImageUpload::new(Some("notes.pdf"), Some("application/pdf"), vec![0]),
            Err(StorageError::UnsupportedType)
        ));
    }

    #[test]
    fn test_size_limits() {
        assert!(matches!(
            ImageUpload::new(Some("a.png"), None, Vec::new()),
            Err(StorageError::Empty)
        ));
        assert!(matches!(
            ImageUpload::new(Some("a.png"), None, vec![0; MAX_IMAGE_BYTES + 1]),
            Err(StorageError::TooLarge)
        ));
        assert!(ImageUpload::new(Some("a.png"), None, vec![0; MAX_IMAGE_BYTES]).is_ok());
    }

    #[test]
    fn test_product_image_path_shape() {
        let path = product_image_path("png");
        let name = path.strip_prefix("products/").unwrap();
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "png");
        let (millis, suffix) = stem.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 4);
    }
}
