//! Remote store trait definitions
//!
//! The remote store is treated as a black box with row-level operations.
//! [`TableStore`] covers the two catalog tables and [`ObjectStore`] the image
//! bucket; both are implemented over HTTP by
//! [`SupabaseClient`](super::supabase::SupabaseClient) and by in-memory fakes
//! in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RemoteResult;
use crate::models::{Category, Dish, DishPatch};

/// Row in the `categories` table. Dishes are not stored on the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub sort_order: i64,
}

/// Row in the `dishes` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub category_id: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub sort_order: i64,
}

/// Column subset written by a dish update. Absent fields are not sent;
/// `tags: Some(None)` writes `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DishRowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Option<Vec<String>>>,
}

/// Column subset written by a category update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryRowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl CategoryRow {
    pub fn from_category(category: &Category, sort_order: i64) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            icon: category.icon.clone(),
            sort_order,
        }
    }

    /// Build the domain category, attaching the dishes that reference it
    pub fn into_category(self, dishes: &[Dish]) -> Category {
        let dishes = dishes
            .iter()
            .filter(|d| d.category == self.id)
            .cloned()
            .collect();
        Category {
            id: self.id,
            name: self.name,
            icon: self.icon,
            dishes,
        }
    }
}

impl DishRow {
    pub fn from_dish(dish: &Dish, sort_order: i64) -> Self {
        Self {
            id: dish.id.clone(),
            name: dish.name.clone(),
            description: dish.description.clone(),
            image: dish.image.clone(),
            category_id: dish.category.clone(),
            tags: dish.tags.clone().filter(|t| !t.is_empty()),
            sort_order,
        }
    }
}

impl From<DishRow> for Dish {
    fn from(row: DishRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image: row.image,
            category: row.category_id,
            tags: row.tags,
        }
    }
}

impl From<&DishPatch> for DishRowPatch {
    fn from(patch: &DishPatch) -> Self {
        Self {
            name: patch.name.clone(),
            description: patch.description.clone(),
            image: patch.image.clone(),
            category_id: patch.category.clone(),
            tags: patch
                .tags
                .clone()
                .map(|tags| tags.filter(|t| !t.is_empty())),
        }
    }
}

/// Row-level access to the `categories` and `dishes` tables
///
/// Reads are ordered by `sort_order` ascending. Every method reports remote
/// failures as [`RemoteError`](crate::errors::RemoteError); converting them
/// into success flags is the caller's concern.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// All category rows, ordered by `sort_order`
    async fn select_categories(&self) -> RemoteResult<Vec<CategoryRow>>;

    /// All dish rows, ordered by `sort_order`
    async fn select_dishes(&self) -> RemoteResult<Vec<DishRow>>;

    async fn count_categories(&self) -> RemoteResult<u64>;

    /// Number of dishes whose `category_id` is `category_id`
    async fn count_dishes_in_category(&self, category_id: &str) -> RemoteResult<u64>;

    async fn insert_category(&self, row: &CategoryRow) -> RemoteResult<()>;

    async fn insert_dish(&self, row: &DishRow) -> RemoteResult<()>;

    /// Update the given columns of one dish
    async fn update_dish(&self, dish_id: &str, patch: &DishRowPatch) -> RemoteResult<()>;

    async fn update_category(&self, category_id: &str, patch: &CategoryRowPatch)
    -> RemoteResult<()>;

    async fn delete_dish(&self, dish_id: &str) -> RemoteResult<()>;

    /// Delete every dish row referencing `category_id`
    async fn delete_dishes_in_category(&self, category_id: &str) -> RemoteResult<()>;

    async fn delete_category(&self, category_id: &str) -> RemoteResult<()>;

    /// Insert or replace by id
    async fn upsert_categories(&self, rows: &[CategoryRow]) -> RemoteResult<()>;

    /// Insert or replace by id
    async fn upsert_dishes(&self, rows: &[DishRow]) -> RemoteResult<()>;
}

/// Object storage for uploaded dish images
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `bytes` to `path` without overwriting an existing object
    ///
    /// # Arguments
    ///
    /// * `path` - Object path inside the bucket, e.g. `dishes/123_abc.jpg`
    /// * `bytes` - Object body
    /// * `content_type` - Mime type stored with the object
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> RemoteResult<()>;

    /// Publicly resolvable URL for an object path
    fn public_url(&self, path: &str) -> String;

    /// Remove objects by path
    async fn remove(&self, paths: &[String]) -> RemoteResult<()>;

    /// Bucket the store writes into
    fn bucket(&self) -> &str;
}
