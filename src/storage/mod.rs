//! Durable local key/value state
//!
//! Each key is one JSON document under the data directory. This is where the
//! cart, the order history and (without a remote store) the catalog survive
//! restarts.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{AppError, AppResult};

/// Persisted keys
pub mod keys {
    pub const CART: &str = "cart-storage";
    pub const ORDERS: &str = "order-storage";
    pub const MENU: &str = "menu-storage";
    pub const IMAGE_CACHE_VERSION: &str = "menu_images_version";
    /// Legacy base64 image cache, dropped on version change
    pub const LEGACY_IMAGE_CACHE: &str = "menu_images_cache";
}

/// Current image cache format version
pub const IMAGE_CACHE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::validation(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Read a value; a missing key is `Ok(None)`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a value, replacing any previous one
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write-then-rename so readers never see a partial document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Persisted {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// Remove a key; removing a missing key is not an error
    pub async fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the legacy image cache when the stored format version differs
    /// from the current one. Returns `true` when an upgrade happened.
    pub async fn init_image_cache_version(&self) -> AppResult<bool> {
        let stored: Option<String> = self.get(keys::IMAGE_CACHE_VERSION).await?;
        if stored.as_deref() == Some(IMAGE_CACHE_VERSION) {
            return Ok(false);
        }

        self.remove(keys::LEGACY_IMAGE_CACHE).await?;
        self.set(keys::IMAGE_CACHE_VERSION, IMAGE_CACHE_VERSION)
            .await?;
        info!(
            "Image cache format upgraded from {} to {}",
            stored.as_deref().unwrap_or("none"),
            IMAGE_CACHE_VERSION
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_roundtrip_and_missing_keys() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested"));

        let missing: Option<Vec<String>> = storage.get(keys::CART).await.unwrap();
        assert!(missing.is_none());

        storage.set(keys::CART, &vec!["a", "b"]).await.unwrap();
        let loaded: Option<Vec<String>> = storage.get(keys::CART).await.unwrap();
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));

        tokio_test::assert_ok!(storage.remove(keys::CART).await);
        // Removing a missing key is not an error
        tokio_test::assert_ok!(storage.remove(keys::CART).await);
        let gone: Option<Vec<String>> = storage.get(keys::CART).await.unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let err = storage.set("../escape", &1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("menu-storage.json"), b"{not json").unwrap();
        let storage = LocalStorage::new(dir.path());
        let result: AppResult<Option<HashMap<String, String>>> = storage.get(keys::MENU).await;
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_image_cache_version_upgrade_drops_legacy_cache() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage
            .set(keys::LEGACY_IMAGE_CACHE, &HashMap::from([("a.jpg", "data:...")]))
            .await
            .unwrap();
        storage.set(keys::IMAGE_CACHE_VERSION, "0.9.0").await.unwrap();

        assert!(storage.init_image_cache_version().await.unwrap());
        let legacy: Option<HashMap<String, String>> =
            storage.get(keys::LEGACY_IMAGE_CACHE).await.unwrap();
        assert!(legacy.is_none());
        let version: Option<String> = storage.get(keys::IMAGE_CACHE_VERSION).await.unwrap();
        assert_eq!(version.as_deref(), Some(IMAGE_CACHE_VERSION));

        assert!(!storage.init_image_cache_version().await.unwrap());
    }
}
