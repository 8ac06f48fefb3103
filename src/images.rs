use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("invalid image data")]
    InvalidData,
    #[error("invalid image key: {0}")]
    InvalidKey(String),
    #[error("image storage failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ImageError> for AppError {
    fn from(value: ImageError) -> Self {
        match value {
            ImageError::InvalidData => AppError::bad_request("invalid image data"),
            other => AppError::internal(other.to_string()),
        }
    }
}

/// Object storage for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL.
    async fn put(&self, bytes: Vec<u8>, key: &str, content_type: &str) -> Result<String, ImageError>;

    /// Removes the object behind `url`. `false` when the URL is not ours or
    /// nothing was stored there.
    async fn delete(&self, url: &str) -> Result<bool, ImageError>;
}

/// Filesystem-backed store; files are served back under `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ImageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(ImageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, bytes: Vec<u8>, key: &str, content_type: &str) -> Result<String, ImageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        let url = format!("{}/{}", self.public_base_url, key);
        tracing::info!(%url, %content_type, "image stored");
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<bool, ImageError> {
        let Some(key) = url
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            tracing::warn!(%url, "image url does not belong to this store");
            return Ok(false);
        };

        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Decodes a base64 payload, accepting an optional `data:...;base64,` prefix.
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, ImageError> {
    let payload = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };
    let bytes = BASE64.decode(payload.trim()).map_err(|_| ImageError::InvalidData)?;
    if bytes.is_empty() {
        return Err(ImageError::InvalidData);
    }
    Ok(bytes)
}

/// `{folder}/{YYYYmmddHHMMSS}_{8 hex}.{ext}`
pub fn image_key(folder: &str, extension: &str, bytes: &[u8], now: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.update(Uuid::new_v4().as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{folder}/{}_{}.{extension}", now.format("%Y%m%d%H%M%S"), &digest[..8])
}

pub fn content_type_for(extension: &str) -> String {
    match extension {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

/// Decodes and stores a base64 image in `folder`, returning its URL.
pub async fn upload_base64(store: &dyn ImageStore, data: &str, folder: &str) -> Result<String, AppError> {
    let bytes = decode_base64_image(data)?;
    let key = image_key(folder, "jpg", &bytes, Utc::now());
    let url = store.put(bytes, &key, &content_type_for("jpg")).await?;
    Ok(url)
}

/// Best-effort removal; failures are logged and swallowed.
pub async fn discard(store: &dyn ImageStore, url: &str) {
    match store.delete(url).await {
        Ok(true) => tracing::debug!(%url, "image deleted"),
        Ok(false) => tracing::warn!(%url, "image to delete was not found"),
        Err(err) => tracing::warn!(%url, error = %err, "failed to delete image"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_data_url_prefix_is_stripped() {
        let plain = decode_base64_image("aGVsbG8=").unwrap();
        let prefixed = decode_base64_image("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(plain, b"hello");
        assert_eq!(prefixed, b"hello");
    }

    #[test]
    fn test_bad_base64_is_invalid_data() {
        assert!(matches!(decode_base64_image("%%%"), Err(ImageError::InvalidData)));
        assert!(matches!(decode_base64_image(""), Err(ImageError::InvalidData)));
    }

    #[test]
    fn test_key_layout() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 5).unwrap();
        let key = image_key("articles", "jpg", b"bytes", now);

        let (folder, file) = key.split_once('/').unwrap();
        assert_eq!(folder, "articles");
        assert!(file.starts_with("20250601093005_"));
        assert!(file.ends_with(".jpg"));
        assert_eq!(file.len(), "20250601093005_".len() + 8 + ".jpg".len());
    }

    #[tokio::test]
    async fn test_local_store_put_and_delete() {
        let dir = tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), "http://localhost:8000/images/");

        let url = store.put(b"img".to_vec(), "articles/a.jpg", "image/jpeg").await.unwrap();
        assert_eq!(url, "http://localhost:8000/images/articles/a.jpg");
        assert!(dir.path().join("articles/a.jpg").exists());

        assert!(store.delete(&url).await.unwrap());
        assert!(!store.delete(&url).await.unwrap());
        assert!(!store.delete("https://elsewhere.example/a.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let dir = tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), "http://localhost/images");

        assert!(matches!(
            store.put(b"x".to_vec(), "../escape.jpg", "image/jpeg").await,
            Err(ImageError::InvalidKey(_))
        ));
    }
}
