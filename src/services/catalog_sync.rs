//! Optimistic catalog state
//!
//! Every mutation is validated, applied to the in-memory catalog (visible to
//! readers straight away) and then mirrored to the remote store. A failed
//! remote write is logged and reported as [`SyncOutcome::SyncFailed`]; the
//! local change is kept. Without a remote store the catalog is persisted to
//! local storage instead.
//!
//! Mutations are not serialized against each other. When two overlap, the
//! one that settles last writes the final `is_syncing` value.

use serde::Serialize;
use std::future::Future;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::defaults::DEFAULT_DISH_IMAGE;
use crate::errors::{AppError, AppResult};
use crate::models::{CatalogState, Category, CategoryPatch, Dish, DishPatch};
use crate::repositories::MenuRepository;
use crate::storage::{LocalStorage, keys};

/// How a mutation was mirrored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Applied locally and written to the remote store
    Synced,
    /// Applied locally; the remote write failed and was logged
    SyncFailed,
    /// No remote store; persisted to local storage
    LocalOnly,
}

pub struct CatalogSyncController {
    state: RwLock<CatalogState>,
    repository: MenuRepository,
    storage: Option<LocalStorage>,
}

impl CatalogSyncController {
    /// Start from the bundled catalog until [`initialize`](Self::initialize)
    /// runs
    pub fn new(repository: MenuRepository, storage: Option<LocalStorage>) -> Self {
        Self::with_categories(repository, storage, MenuRepository::default_catalog())
    }

    pub fn with_categories(
        repository: MenuRepository,
        storage: Option<LocalStorage>,
        categories: Vec<Category>,
    ) -> Self {
        Self {
            state: RwLock::new(CatalogState::with_categories(categories)),
            repository,
            storage,
        }
    }

    pub fn repository(&self) -> &MenuRepository {
        &self.repository
    }

    /// Load the catalog once. Later calls, and calls made while a load is in
    /// flight, return `false` without doing anything.
    pub async fn initialize(&self) -> bool {
        {
            let mut state = self.state.write().await;
            if state.is_initialized || state.is_loading {
                return false;
            }
            state.is_loading = true;
        }

        let categories = self.load_categories().await;

        let mut state = self.state.write().await;
        state.categories = categories;
        state.is_initialized = true;
        state.is_loading = false;
        info!(
            "Catalog initialized with {} categories",
            state.categories.len()
        );
        true
    }

    async fn load_categories(&self) -> Vec<Category> {
        if self.repository.is_configured() {
            return self.repository.fetch_all().await;
        }

        let Some(storage) = &self.storage else {
            return MenuRepository::default_catalog();
        };
        match storage.get::<Vec<Category>>(keys::MENU).await {
            Ok(Some(categories)) if !categories.is_empty() => {
                debug!("Loaded catalog from local storage");
                categories
            }
            Ok(_) => MenuRepository::default_catalog(),
            Err(e) => {
                warn!("Failed to read stored catalog, using bundled catalog: {}", e);
                MenuRepository::default_catalog()
            }
        }
    }

    /// Re-fetch from the remote store. Does nothing when unconfigured.
    pub async fn refresh(&self) -> bool {
        if !self.repository.is_configured() {
            return false;
        }
        self.state.write().await.is_loading = true;
        let categories = self.repository.fetch_all().await;
        let mut state = self.state.write().await;
        state.categories = categories;
        state.is_loading = false;
        true
    }

    /// Replace the catalog with the bundled one and re-seed the remote store
    pub async fn reset_to_default(&self) -> SyncOutcome {
        let defaults = MenuRepository::default_catalog();
        self.state.write().await.categories = defaults.clone();
        info!("Catalog reset to bundled defaults");
        self.mirror("reset catalog", self.repository.seed_defaults(&defaults))
            .await
    }

    pub async fn add_dish(&self, mut dish: Dish) -> AppResult<SyncOutcome> {
        if dish.id.trim().is_empty() {
            return Err(AppError::validation("dish id is required"));
        }
        if dish.name.trim().is_empty() {
            return Err(AppError::validation("dish name is required"));
        }
        if dish.image.trim().is_empty() {
            dish.image = DEFAULT_DISH_IMAGE.to_string();
        }
        dish.tags = dish.tags.take().filter(|t| !t.is_empty());

        {
            let mut state = self.state.write().await;
            if state.find_dish(&dish.id).is_some() {
                return Err(AppError::validation(format!(
                    "dish '{}' already exists",
                    dish.id
                )));
            }
            let category = state.category_mut(&dish.category).ok_or_else(|| {
                AppError::validation(format!("category '{}' does not exist", dish.category))
            })?;
            category.dishes.push(dish.clone());
        }
        info!("Added dish {} to {}", dish.id, dish.category);

        Ok(self.mirror("add dish", self.repository.add_dish(&dish)).await)
    }

    /// Patch a dish, re-parenting it when the category changes
    pub async fn update_dish(&self, dish_id: &str, mut patch: DishPatch) -> AppResult<SyncOutcome> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("dish name is required"));
        }
        if patch.image.as_deref().is_some_and(|i| i.trim().is_empty()) {
            patch.image = Some(DEFAULT_DISH_IMAGE.to_string());
        }

        {
            let mut state = self.state.write().await;
            let (ci, di) = state
                .find_dish(dish_id)
                .ok_or_else(|| AppError::not_found("dish", dish_id))?;
            let target = match &patch.category {
                Some(category_id) if *category_id != state.categories[ci].id => {
                    let index = state
                        .categories
                        .iter()
                        .position(|c| c.id == *category_id)
                        .ok_or_else(|| {
                            AppError::validation(format!(
                                "category '{category_id}' does not exist"
                            ))
                        })?;
                    Some(index)
                }
                _ => None,
            };

            match target {
                Some(new_ci) => {
                    let mut dish = state.categories[ci].dishes.remove(di);
                    dish.apply(&patch);
                    state.categories[new_ci].dishes.push(dish);
                    info!(
                        "Moved dish {} to category {}",
                        dish_id, state.categories[new_ci].id
                    );
                }
                None => state.categories[ci].dishes[di].apply(&patch),
            }
        }

        Ok(self
            .mirror("update dish", self.repository.update_dish(dish_id, &patch))
            .await)
    }

    pub async fn delete_dish(&self, dish_id: &str) -> AppResult<SyncOutcome> {
        {
            let mut state = self.state.write().await;
            let (ci, di) = state
                .find_dish(dish_id)
                .ok_or_else(|| AppError::not_found("dish", dish_id))?;
            state.categories[ci].dishes.remove(di);
        }
        info!("Deleted dish {}", dish_id);

        Ok(self
            .mirror("delete dish", self.repository.delete_dish(dish_id))
            .await)
    }

    /// Append an empty category to the display order
    pub async fn add_category(&self, category: Category) -> AppResult<SyncOutcome> {
        if category.id.trim().is_empty() {
            return Err(AppError::validation("category id is required"));
        }
        if category.name.trim().is_empty() {
            return Err(AppError::validation("category name is required"));
        }
        if !category.dishes.is_empty() {
            return Err(AppError::validation("new categories must be empty"));
        }

        {
            let mut state = self.state.write().await;
            if state.category(&category.id).is_some() {
                return Err(AppError::validation(format!(
                    "category '{}' already exists",
                    category.id
                )));
            }
            state.categories.push(category.clone());
        }
        info!("Added category {}", category.id);

        Ok(self
            .mirror("add category", self.repository.add_category(&category))
            .await)
    }

    pub async fn update_category(
        &self,
        category_id: &str,
        patch: CategoryPatch,
    ) -> AppResult<SyncOutcome> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("category name is required"));
        }

        {
            let mut state = self.state.write().await;
            let category = state
                .category_mut(category_id)
                .ok_or_else(|| AppError::not_found("category", category_id))?;
            category.apply(&patch);
        }

        Ok(self
            .mirror(
                "update category",
                self.repository.update_category(category_id, &patch),
            )
            .await)
    }

    /// Remove an empty category. The last remaining category cannot be
    /// removed.
    pub async fn delete_category(&self, category_id: &str) -> AppResult<SyncOutcome> {
        {
            let mut state = self.state.write().await;
            let index = state
                .categories
                .iter()
                .position(|c| c.id == category_id)
                .ok_or_else(|| AppError::not_found("category", category_id))?;
            if state.categories.len() <= 1 {
                return Err(AppError::validation(
                    "at least one category must remain",
                ));
            }
            let dish_count = state.categories[index].dishes.len();
            if dish_count > 0 {
                return Err(AppError::validation(format!(
                    "category '{category_id}' still has {dish_count} dishes"
                )));
            }
            state.categories.remove(index);
        }
        info!("Deleted category {}", category_id);

        Ok(self
            .mirror(
                "delete category",
                self.repository.delete_category(category_id),
            )
            .await)
    }

    /// Mirror a local change. `remote` is only polled when a remote store is
    /// configured.
    async fn mirror<F>(&self, operation: &str, remote: F) -> SyncOutcome
    where
        F: Future<Output = bool>,
    {
        if !self.repository.is_configured() {
            self.persist_local().await;
            return SyncOutcome::LocalOnly;
        }

        self.state.write().await.is_syncing = true;
        let synced = remote.await;
        self.state.write().await.is_syncing = false;

        if synced {
            SyncOutcome::Synced
        } else {
            error!("Failed to sync {} to remote store; local change kept", operation);
            SyncOutcome::SyncFailed
        }
    }

    async fn persist_local(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let categories = self.state.read().await.categories.clone();
        if let Err(e) = storage.set(keys::MENU, &categories).await {
            warn!("Failed to persist catalog locally: {}", e);
        }
    }

    pub async fn snapshot(&self) -> CatalogState {
        self.state.read().await.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.read().await.categories.clone()
    }

    pub async fn all_dishes(&self) -> Vec<Dish> {
        self.state.read().await.all_dishes()
    }

    pub async fn dishes_by_category(&self, category_id: &str) -> Vec<Dish> {
        self.state
            .read()
            .await
            .category(category_id)
            .map(|c| c.dishes.clone())
            .unwrap_or_default()
    }

    pub async fn dish_by_id(&self, dish_id: &str) -> Option<Dish> {
        self.state.read().await.dish(dish_id).cloned()
    }

    pub async fn category_by_id(&self, category_id: &str) -> Option<Category> {
        self.state.read().await.category(category_id).cloned()
    }

    pub async fn is_syncing(&self) -> bool {
        self.state.read().await.is_syncing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dish(id: &str, category: &str) -> Dish {
        Dish {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            image: format!("/images/{id}.jpg"),
            category: category.into(),
            tags: None,
        }
    }

    fn category(id: &str, dishes: Vec<Dish>) -> Category {
        Category {
            id: id.into(),
            name: id.to_uppercase(),
            icon: "🍽".into(),
            dishes,
        }
    }

    fn controller(storage: Option<LocalStorage>) -> CatalogSyncController {
        CatalogSyncController::with_categories(
            MenuRepository::unconfigured(),
            storage,
            vec![category("a", vec![dish("a1", "a")]), category("b", vec![])],
        )
    }

    #[tokio::test]
    async fn test_local_only_mutations_persist_catalog() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let sync = controller(Some(storage.clone()));

        let outcome = sync.add_dish(dish("b1", "b")).await.unwrap();
        assert_eq!(outcome, SyncOutcome::LocalOnly);

        let stored: Vec<Category> = storage.get(keys::MENU).await.unwrap().unwrap();
        assert_eq!(stored[1].dishes[0].id, "b1");

        let restored = CatalogSyncController::new(MenuRepository::unconfigured(), Some(storage));
        assert!(restored.initialize().await);
        assert!(restored.dish_by_id("b1").await.is_some());
        assert!(!restored.initialize().await);
    }

    #[tokio::test]
    async fn test_add_dish_validation_leaves_state_untouched() {
        let sync = controller(None);
        let before = sync.snapshot().await;

        let mut unnamed = dish("x", "a");
        unnamed.name = "   ".into();
        assert!(matches!(
            sync.add_dish(unnamed).await,
            Err(AppError::Validation { .. })
        ));
        assert!(sync.add_dish(dish("x", "missing")).await.is_err());
        assert!(sync.add_dish(dish("a1", "b")).await.is_err());

        assert_eq!(sync.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_add_dish_defaults_image_and_drops_empty_tags() {
        let sync = controller(None);
        let mut plain = dish("p", "b");
        plain.image = String::new();
        plain.tags = Some(vec![]);
        sync.add_dish(plain).await.unwrap();

        let stored = sync.dish_by_id("p").await.unwrap();
        assert_eq!(stored.image, DEFAULT_DISH_IMAGE);
        assert_eq!(stored.tags, None);
    }

    #[tokio::test]
    async fn test_update_dish_is_idempotent() {
        let sync = controller(None);
        let patch = DishPatch {
            name: Some("X".into()),
            ..DishPatch::default()
        };

        sync.update_dish("a1", patch.clone()).await.unwrap();
        let once = sync.snapshot().await;
        sync.update_dish("a1", patch).await.unwrap();
        assert_eq!(sync.snapshot().await, once);
        assert_eq!(sync.dish_by_id("a1").await.unwrap().name, "X");
    }

    #[tokio::test]
    async fn test_update_dish_moves_between_categories() {
        let sync = controller(None);
        let patch = DishPatch {
            category: Some("b".into()),
            ..DishPatch::default()
        };
        sync.update_dish("a1", patch.clone()).await.unwrap();

        assert!(sync.dishes_by_category("a").await.is_empty());
        let moved = sync.dishes_by_category("b").await;
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].category, "b");

        // Same patch again: already in "b", nothing moves
        sync.update_dish("a1", patch).await.unwrap();
        assert_eq!(sync.dishes_by_category("b").await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_dish_rejects_unknown_target_category() {
        let sync = controller(None);
        let patch = DishPatch {
            category: Some("nope".into()),
            ..DishPatch::default()
        };
        assert!(sync.update_dish("a1", patch).await.is_err());
        assert_eq!(sync.dishes_by_category("a").await.len(), 1);

        assert!(matches!(
            sync.update_dish("ghost", DishPatch::default()).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_category_deletion_guards() {
        let sync = controller(None);

        let err = sync.delete_category("a").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        sync.delete_category("b").await.unwrap();
        assert!(sync.category_by_id("b").await.is_none());

        sync.delete_dish("a1").await.unwrap();
        let err = sync.delete_category("a").await.unwrap_err();
        assert!(err.to_string().contains("at least one category"));
        assert_eq!(sync.categories().await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_and_update_category() {
        let sync = controller(None);
        sync.add_category(category("c", vec![])).await.unwrap();
        assert!(sync.add_category(category("c", vec![])).await.is_err());
        assert!(
            sync.add_category(category("d", vec![dish("d1", "d")]))
                .await
                .is_err()
        );

        sync.update_category(
            "c",
            CategoryPatch {
                icon: Some("🍜".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let updated = sync.category_by_id("c").await.unwrap();
        assert_eq!(updated.icon, "🍜");
        assert_eq!(updated.name, "C");
        assert_eq!(sync.categories().await.last().unwrap().id, "c");
    }

    #[tokio::test]
    async fn test_reset_to_default_without_remote() {
        let sync = controller(None);
        assert_eq!(sync.reset_to_default().await, SyncOutcome::LocalOnly);
        assert_eq!(sync.categories().await, MenuRepository::default_catalog());
        assert!(!sync.refresh().await);
    }
}
