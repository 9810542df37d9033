use rust_embed::RustEmbed;

use crate::errors::{AppError, AppResult};
use crate::models::Category;

/// Embedded seed data
#[derive(RustEmbed)]
#[folder = "data/"]
#[prefix = "data/"]
pub struct DataAssets;

const DEFAULT_MENU_PATH: &str = "data/default_menu.json";

impl DataAssets {
    /// Get a data file by path
    pub fn get_asset(path: &str) -> Option<rust_embed::EmbeddedFile> {
        Self::get(path)
    }

    /// The bundled default catalog, used when the remote store is
    /// unavailable and to seed an empty one
    pub fn default_catalog() -> AppResult<Vec<Category>> {
        let file = Self::get_asset(DEFAULT_MENU_PATH)
            .ok_or_else(|| AppError::internal(format!("{DEFAULT_MENU_PATH} is not embedded")))?;
        Ok(serde_json::from_slice(&file.data)?)
    }
}
