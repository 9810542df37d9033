//! In-memory fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

use order_menu::errors::{AppResult, LoadError, RemoteError, RemoteResult};
use order_menu::models::{Category, Dish};
use order_menu::repositories::{
    CategoryRow, CategoryRowPatch, DishRow, DishRowPatch, ObjectStore, TableStore,
};
use order_menu::services::{ImageFetcher, NotificationOutcome, OrderNotifier};

pub fn dish(id: &str, category: &str) -> Dish {
    Dish {
        id: id.into(),
        name: id.into(),
        description: String::new(),
        image: format!("/images/{id}.jpg"),
        category: category.into(),
        tags: None,
    }
}

pub fn category(id: &str, dishes: Vec<Dish>) -> Category {
    Category {
        id: id.into(),
        name: id.to_uppercase(),
        icon: String::new(),
        dishes,
    }
}

/// Pauses a fake mid-call while closed. An open gate lets every call
/// straight through.
#[derive(Default)]
pub struct Gate {
    closed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Let the paused call (and every later one) through
    pub fn open(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    /// Wait until a call is parked at the gate
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub async fn pass(&self) {
        if self.closed.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

/// Table store backed by two vectors; every call is recorded by name
#[derive(Default)]
pub struct MemoryTables {
    pub categories: Mutex<Vec<CategoryRow>>,
    pub dishes: Mutex<Vec<DishRow>>,
    pub calls: Mutex<Vec<String>>,
    pub inserted_dishes: Mutex<Vec<DishRow>>,
    /// Make every write fail
    pub fail_writes: AtomicBool,
    /// Holds `select_categories` and `insert_dish` while closed
    pub gate: Gate,
}

impl MemoryTables {
    pub fn with_catalog(categories: &[Category]) -> Self {
        let tables = Self::default();
        {
            let mut category_rows = tables.categories.lock().unwrap();
            let mut dish_rows = tables.dishes.lock().unwrap();
            for (index, category) in categories.iter().enumerate() {
                category_rows.push(CategoryRow::from_category(category, index as i64));
                for (position, dish) in category.dishes.iter().enumerate() {
                    dish_rows.push(DishRow::from_dish(dish, position as i64));
                }
            }
        }
        tables
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_named(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn check_write(&self, operation: &str) -> RemoteResult<()> {
        self.record(operation);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::status(operation, 500, "simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryTables {
    async fn select_categories(&self) -> RemoteResult<Vec<CategoryRow>> {
        self.record("select_categories");
        self.gate.pass().await;
        let mut rows = self.categories.lock().unwrap().clone();
        rows.sort_by_key(|r| r.sort_order);
        Ok(rows)
    }

    async fn select_dishes(&self) -> RemoteResult<Vec<DishRow>> {
        self.record("select_dishes");
        let mut rows = self.dishes.lock().unwrap().clone();
        rows.sort_by_key(|r| r.sort_order);
        Ok(rows)
    }

    async fn count_categories(&self) -> RemoteResult<u64> {
        self.record("count_categories");
        Ok(self.categories.lock().unwrap().len() as u64)
    }

    async fn count_dishes_in_category(&self, category_id: &str) -> RemoteResult<u64> {
        self.record("count_dishes_in_category");
        Ok(self
            .dishes
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.category_id == category_id)
            .count() as u64)
    }

    async fn insert_category(&self, row: &CategoryRow) -> RemoteResult<()> {
        self.check_write("insert_category")?;
        self.categories.lock().unwrap().push(row.clone());
        Ok(())
    }

    async fn insert_dish(&self, row: &DishRow) -> RemoteResult<()> {
        self.gate.pass().await;
        self.check_write("insert_dish")?;
        self.inserted_dishes.lock().unwrap().push(row.clone());
        self.dishes.lock().unwrap().push(row.clone());
        Ok(())
    }

    async fn update_dish(&self, dish_id: &str, patch: &DishRowPatch) -> RemoteResult<()> {
        self.check_write("update_dish")?;
        let mut dishes = self.dishes.lock().unwrap();
        if let Some(row) = dishes.iter_mut().find(|d| d.id == dish_id) {
            if let Some(name) = &patch.name {
                row.name = name.clone();
            }
            if let Some(description) = &patch.description {
                row.description = description.clone();
            }
            if let Some(image) = &patch.image {
                row.image = image.clone();
            }
            if let Some(category_id) = &patch.category_id {
                row.category_id = category_id.clone();
            }
            if let Some(tags) = &patch.tags {
                row.tags = tags.clone();
            }
        }
        Ok(())
    }

    async fn update_category(
        &self,
        category_id: &str,
        patch: &CategoryRowPatch,
    ) -> RemoteResult<()> {
        self.check_write("update_category")?;
        let mut categories = self.categories.lock().unwrap();
        if let Some(row) = categories.iter_mut().find(|c| c.id == category_id) {
            if let Some(name) = &patch.name {
                row.name = name.clone();
            }
            if let Some(icon) = &patch.icon {
                row.icon = icon.clone();
            }
        }
        Ok(())
    }

    async fn delete_dish(&self, dish_id: &str) -> RemoteResult<()> {
        self.check_write("delete_dish")?;
        self.dishes.lock().unwrap().retain(|d| d.id != dish_id);
        Ok(())
    }

    async fn delete_dishes_in_category(&self, category_id: &str) -> RemoteResult<()> {
        self.check_write("delete_dishes_in_category")?;
        self.dishes
            .lock()
            .unwrap()
            .retain(|d| d.category_id != category_id);
        Ok(())
    }

    async fn delete_category(&self, category_id: &str) -> RemoteResult<()> {
        self.check_write("delete_category")?;
        self.categories.lock().unwrap().retain(|c| c.id != category_id);
        Ok(())
    }

    async fn upsert_categories(&self, rows: &[CategoryRow]) -> RemoteResult<()> {
        self.check_write("upsert_categories")?;
        let mut categories = self.categories.lock().unwrap();
        for row in rows {
            categories.retain(|c| c.id != row.id);
            categories.push(row.clone());
        }
        Ok(())
    }

    async fn upsert_dishes(&self, rows: &[DishRow]) -> RemoteResult<()> {
        self.check_write("upsert_dishes")?;
        let mut dishes = self.dishes.lock().unwrap();
        for row in rows {
            dishes.retain(|d| d.id != row.id);
            dishes.push(row.clone());
        }
        Ok(())
    }
}

/// Object store keeping uploaded bodies in a map
#[derive(Default)]
pub struct MemoryObjects {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    pub removed: Mutex<Vec<String>>,
}

impl MemoryObjects {
    pub fn public_url_for(&self, path: &str) -> String {
        self.public_url(path)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> RemoteResult<()> {
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(path) {
            return Err(RemoteError::status("upload", 409, "object exists"));
        }
        objects.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "https://test.supabase.co/storage/v1/object/public/{}/{}",
            self.bucket(),
            path
        )
    }

    async fn remove(&self, paths: &[String]) -> RemoteResult<()> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(path);
        }
        self.removed.lock().unwrap().extend(paths.iter().cloned());
        Ok(())
    }

    fn bucket(&self) -> &str {
        "dish-images"
    }
}

/// Fetcher that counts underlying loads and records start/finish events
pub struct CountingFetcher {
    pub loads: AtomicUsize,
    pub events: Mutex<Vec<String>>,
    pub delay: Duration,
    /// URLs containing this marker fail
    pub fail_marker: Option<String>,
}

impl CountingFetcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
            delay,
            fail_marker: None,
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for CountingFetcher {
    async fn load(&self, url: &str) -> Result<(), LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("start {url}"));
        tokio::time::sleep(self.delay).await;
        self.events.lock().unwrap().push(format!("end {url}"));

        match &self.fail_marker {
            Some(marker) if url.contains(marker.as_str()) => Err(LoadError::new(url, "not found")),
            _ => Ok(()),
        }
    }
}

/// Notifier that records every message it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(String, String)>>,
    /// Holds delivery while closed
    pub gate: Gate,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) -> AppResult<NotificationOutcome> {
        self.gate.pass().await;
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(NotificationOutcome::Sent)
    }
}
