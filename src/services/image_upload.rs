//! Dish image upload
//!
//! Validates the upload, compresses it and stores it in the image bucket
//! under `<prefix>/<millis>_<random>.<ext>`. Remote problems are logged and
//! reported as `None`/`false` like the rest of the remote store adapter;
//! only validation and decode failures are errors.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::image_compressor::{CompressOptions, ImageCompressor, ImagePayload, parse_data_url};
use crate::config::CompressionConfig;
use crate::config::defaults::DEFAULT_STORAGE_PATH_PREFIX;
use crate::errors::{AppError, AppResult};
use crate::repositories::ObjectStore;
use crate::utils::{UrlUtils, random_suffix};

pub struct ImageUploadService {
    store: Option<Arc<dyn ObjectStore>>,
    options: CompressOptions,
    max_upload_bytes: u64,
    path_prefix: String,
}

impl ImageUploadService {
    pub fn new(store: Option<Arc<dyn ObjectStore>>, config: &CompressionConfig) -> Self {
        Self {
            store,
            options: CompressOptions::from(config),
            max_upload_bytes: config.max_upload_bytes,
            path_prefix: DEFAULT_STORAGE_PATH_PREFIX.to_string(),
        }
    }

    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = prefix.trim_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Upload an image file and return its public URL.
    ///
    /// # Errors
    ///
    /// * `AppError::Validation` - not an `image/*` type, or over the size limit
    /// * `AppError::Decode` - the file could not be decoded for compression
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<Option<String>> {
        if !content_type.starts_with("image/") {
            return Err(AppError::validation(format!(
                "'{file_name}' is not an image ({content_type})"
            )));
        }
        self.check_size(bytes.len() as u64)?;

        let compressed =
            ImageCompressor::compress_async(ImagePayload::Bytes(bytes), self.options).await?;
        let mime = compressed
            .mime_type
            .clone()
            .unwrap_or_else(|| content_type.to_string());
        let extension = extension_for_mime(&mime)
            .map(str::to_string)
            .or_else(|| file_extension(file_name))
            .unwrap_or_else(|| "jpg".to_string());

        self.store_object(compressed.payload.to_bytes()?, &mime, &extension)
            .await
    }

    /// Upload a `data:<mime>;base64,` image and return its public URL
    pub async fn upload_data_url(&self, data_url: &str) -> AppResult<Option<String>> {
        let (mime, _) = parse_data_url(data_url)?;
        if !mime.starts_with("image/") {
            return Err(AppError::validation(format!("data URL is not an image ({mime})")));
        }
        let payload = ImagePayload::DataUrl(data_url.to_string());
        self.check_size(payload.to_bytes()?.len() as u64)?;

        let compressed = ImageCompressor::compress_async(payload, self.options).await?;
        let mime = compressed.mime_type.clone().unwrap_or_else(|| mime.to_string());
        let extension = extension_for_mime(&mime).unwrap_or("jpg").to_string();

        self.store_object(compressed.payload.to_bytes()?, &mime, &extension)
            .await
    }

    fn check_size(&self, size: u64) -> AppResult<()> {
        if size > self.max_upload_bytes {
            return Err(AppError::validation(format!(
                "image is {:.1}MB, the limit is {:.1}MB",
                size as f64 / (1024.0 * 1024.0),
                self.max_upload_bytes as f64 / (1024.0 * 1024.0)
            )));
        }
        Ok(())
    }

    async fn store_object(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        extension: &str,
    ) -> AppResult<Option<String>> {
        let Some(store) = &self.store else {
            warn!("Remote store not configured, cannot upload image");
            return Ok(None);
        };

        let path = object_path(&self.path_prefix, extension);
        match store.upload(&path, bytes, mime).await {
            Ok(()) => {
                let url = store.public_url(&path);
                info!("Uploaded dish image to {}", url);
                Ok(Some(url))
            }
            Err(e) => {
                error!("Failed to upload image: {}", e);
                Ok(None)
            }
        }
    }

    /// Delete a previously uploaded image by its public URL. URLs outside
    /// the bucket are left alone and reported as `false`.
    pub async fn delete(&self, public_url: &str) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let Some(path) = UrlUtils::storage_object_path(public_url, store.bucket()) else {
            warn!("Not a storage URL for bucket {}: {}", store.bucket(), public_url);
            return false;
        };
        match store.remove(&[path]).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to delete image: {}", e);
                false
            }
        }
    }
}

/// `<prefix>/<unix millis>_<6 base-36 chars>.<ext>`
pub fn object_path(prefix: &str, extension: &str) -> String {
    format!(
        "{}/{}_{}.{}",
        prefix,
        Utc::now().timestamp_millis(),
        random_suffix(6),
        extension
    )
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_object_path_shape() {
        let path = object_path("dishes", "jpg");
        let pattern = Regex::new(r"^dishes/\d+_[0-9a-z]{6}\.jpg$").unwrap();
        assert!(pattern.is_match(&path), "unexpected path {path}");
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(extension_for_mime("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_mime("image/bmp"), None);
        assert_eq!(file_extension("photo.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("photo"), None);
    }

    #[tokio::test]
    async fn test_rejects_non_images_and_oversized_files() {
        let service = ImageUploadService::new(None, &CompressionConfig::default());

        let err = service
            .upload("menu.pdf", "application/pdf", vec![0; 10])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = service
            .upload("huge.jpg", "image/jpeg", vec![0; 5 * 1024 * 1024 + 1])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[tokio::test]
    async fn test_unconfigured_upload_returns_none() {
        let service = ImageUploadService::new(None, &CompressionConfig::default());
        let url = service
            .upload("tiny.png", "image/png", vec![0x89, b'P', b'N', b'G'])
            .await
            .unwrap();
        assert!(url.is_none());
        assert!(!service.delete("https://x.supabase.co/storage/v1/object/public/dish-images/a.jpg").await);
    }
}
