//! Catalog persistence against the remote tables
//!
//! Translates between the nested domain model and the two flat tables.
//! Mutations never propagate remote failures: they are logged and reported
//! as `false`, leaving the decision to the caller.

use std::sync::Arc;
use tracing::{error, info, warn};

use super::traits::{CategoryRow, CategoryRowPatch, DishRow, DishRowPatch, TableStore};
use crate::assets::DataAssets;
use crate::errors::RemoteResult;
use crate::models::{Category, CategoryPatch, Dish, DishPatch};

#[derive(Clone)]
pub struct MenuRepository {
    store: Option<Arc<dyn TableStore>>,
}

impl MenuRepository {
    pub fn new(store: Option<Arc<dyn TableStore>>) -> Self {
        Self { store }
    }

    /// Repository with no remote store; every mutation reports `false`
    pub fn unconfigured() -> Self {
        Self { store: None }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Bundled catalog, empty only if the embedded data is unreadable
    pub fn default_catalog() -> Vec<Category> {
        DataAssets::default_catalog().unwrap_or_else(|e| {
            error!("Failed to load bundled catalog: {}", e);
            Vec::new()
        })
    }

    /// Fetch and join the catalog. Falls back to the bundled catalog when
    /// unconfigured or on any remote failure, and seeds it on first run.
    pub async fn fetch_all(&self) -> Vec<Category> {
        let Some(store) = &self.store else {
            warn!("Remote store not configured, using bundled catalog");
            return Self::default_catalog();
        };

        let rows = match store.select_categories().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to fetch categories: {}", e);
                return Self::default_catalog();
            }
        };
        let dish_rows = match store.select_dishes().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to fetch dishes: {}", e);
                return Self::default_catalog();
            }
        };

        if rows.is_empty() {
            info!("Remote catalog is empty, seeding bundled catalog");
            let defaults = Self::default_catalog();
            self.seed_defaults(&defaults).await;
            return defaults;
        }

        let dishes: Vec<Dish> = dish_rows.into_iter().map(Dish::from).collect();
        let categories: Vec<Category> = rows
            .into_iter()
            .map(|row| row.into_category(&dishes))
            .collect();
        info!(
            "Fetched {} categories and {} dishes from remote store",
            categories.len(),
            dishes.len()
        );
        categories
    }

    /// Upsert categories with their index as sort order and dishes with
    /// their in-category index
    pub async fn seed_defaults(&self, categories: &[Category]) -> bool {
        let Some(store) = &self.store else {
            return false;
        };

        let category_rows: Vec<CategoryRow> = categories
            .iter()
            .enumerate()
            .map(|(index, category)| CategoryRow::from_category(category, index as i64))
            .collect();
        let dish_rows: Vec<DishRow> = categories
            .iter()
            .flat_map(|category| {
                category
                    .dishes
                    .iter()
                    .enumerate()
                    .map(|(index, dish)| DishRow::from_dish(dish, index as i64))
            })
            .collect();

        let result = async {
            store.upsert_categories(&category_rows).await?;
            store.upsert_dishes(&dish_rows).await
        }
        .await;

        if report("seed catalog", result) {
            info!(
                "Seeded {} categories and {} dishes",
                category_rows.len(),
                dish_rows.len()
            );
            true
        } else {
            false
        }
    }

    /// Insert a dish at the end of its category
    pub async fn add_dish(&self, dish: &Dish) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let sort_order = match store.count_dishes_in_category(&dish.category).await {
            Ok(count) => count as i64,
            Err(e) => {
                warn!("Failed to count dishes in {}, using sort order 0: {}", dish.category, e);
                0
            }
        };
        report(
            "add dish",
            store.insert_dish(&DishRow::from_dish(dish, sort_order)).await,
        )
    }

    /// Write only the patched columns
    pub async fn update_dish(&self, dish_id: &str, patch: &DishPatch) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        report(
            "update dish",
            store.update_dish(dish_id, &DishRowPatch::from(patch)).await,
        )
    }

    pub async fn delete_dish(&self, dish_id: &str) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        report("delete dish", store.delete_dish(dish_id).await)
    }

    /// Insert a category at the end of the display order
    pub async fn add_category(&self, category: &Category) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let sort_order = match store.count_categories().await {
            Ok(count) => count as i64,
            Err(e) => {
                warn!("Failed to count categories, using sort order 0: {}", e);
                0
            }
        };
        report(
            "add category",
            store
                .insert_category(&CategoryRow::from_category(category, sort_order))
                .await,
        )
    }

    /// Name and icon only
    pub async fn update_category(&self, category_id: &str, patch: &CategoryPatch) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let row_patch = CategoryRowPatch {
            name: patch.name.clone(),
            icon: patch.icon.clone(),
        };
        report(
            "update category",
            store.update_category(category_id, &row_patch).await,
        )
    }

    /// Delete the category's dishes, then the category.
    ///
    /// The two steps are separate requests. A failure between them leaves
    /// orphaned dish rows behind; a failure of the first step is logged and
    /// the category delete is still attempted.
    pub async fn delete_category(&self, category_id: &str) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        if let Err(e) = store.delete_dishes_in_category(category_id).await {
            warn!("Failed to delete dishes of category {}: {}", category_id, e);
        }
        report("delete category", store.delete_category(category_id).await)
    }
}

impl std::fmt::Debug for MenuRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuRepository")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn report(operation: &str, result: RemoteResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("Remote {} failed: {}", operation, e);
            false
        }
    }
}
