//! Shopping cart
//!
//! Items keep insertion order for display and are keyed by dish id. The
//! cart is written to local storage after every change.

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::models::{CartItem, Dish};
use crate::storage::{LocalStorage, keys};

/// Largest quantity a single cart line can hold
pub const MAX_ITEM_QUANTITY: u32 = 999;

pub struct CartService {
    items: Mutex<Vec<CartItem>>,
    storage: Option<LocalStorage>,
}

impl CartService {
    /// Empty cart that is never persisted
    pub fn in_memory() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            storage: None,
        }
    }

    /// Restore the cart from storage. Unreadable state starts an empty cart.
    pub async fn open(storage: LocalStorage) -> Self {
        let items = match storage.get::<Vec<CartItem>>(keys::CART).await {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to restore cart, starting empty: {}", e);
                Vec::new()
            }
        };
        debug!("Restored cart with {} items", items.len());
        Self {
            items: Mutex::new(items),
            storage: Some(storage),
        }
    }

    /// Add one unit of `dish`. A line already at [`MAX_ITEM_QUANTITY`]
    /// stays there.
    pub async fn add_item(&self, dish: Dish) -> Vec<CartItem> {
        let mut items = self.items.lock().await;
        match items.iter_mut().find(|i| i.dish.id == dish.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1).min(MAX_ITEM_QUANTITY),
            None => items.push(CartItem::new(dish)),
        }
        self.persist(&items).await;
        items.clone()
    }

    /// Remove one unit; the last unit removes the item
    pub async fn remove_item(&self, dish_id: &str) -> Vec<CartItem> {
        let mut items = self.items.lock().await;
        if let Some(index) = items.iter().position(|i| i.dish.id == dish_id) {
            if items[index].quantity > 1 {
                items[index].quantity -= 1;
            } else {
                items.remove(index);
            }
            self.persist(&items).await;
        }
        items.clone()
    }

    /// Set an item's quantity; zero or less removes it. Dishes not in the
    /// cart are ignored.
    ///
    /// # Errors
    ///
    /// * `AppError::Validation` - quantity above [`MAX_ITEM_QUANTITY`]
    pub async fn update_quantity(&self, dish_id: &str, quantity: i64) -> AppResult<Vec<CartItem>> {
        if quantity > i64::from(MAX_ITEM_QUANTITY) {
            return Err(AppError::validation(format!(
                "quantity {quantity} exceeds the limit of {MAX_ITEM_QUANTITY}"
            )));
        }
        let mut items = self.items.lock().await;
        if quantity <= 0 {
            items.retain(|i| i.dish.id != dish_id);
        } else if let Some(item) = items.iter_mut().find(|i| i.dish.id == dish_id) {
            item.quantity = quantity as u32;
        }
        self.persist(&items).await;
        Ok(items.clone())
    }

    pub async fn clear(&self) {
        self.take().await;
    }

    /// Empty the cart and return what it held, in one step
    pub async fn take(&self) -> Vec<CartItem> {
        let mut items = self.items.lock().await;
        let taken = std::mem::take(&mut *items);
        if !taken.is_empty() {
            self.persist(&items).await;
        }
        taken
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.items.lock().await.clone()
    }

    pub async fn total_count(&self) -> u64 {
        total_quantity(&self.items.lock().await)
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    async fn persist(&self, items: &[CartItem]) {
        if let Some(storage) = &self.storage
            && let Err(e) = storage.set(keys::CART, items).await
        {
            warn!("Failed to persist cart: {}", e);
        }
    }
}

/// Sum of line quantities, widened so many full lines cannot overflow
pub fn total_quantity(items: &[CartItem]) -> u64 {
    items.iter().map(|i| u64::from(i.quantity)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dish(id: &str) -> Dish {
        Dish {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            image: String::new(),
            category: "c".into(),
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_remove_units() {
        let cart = CartService::in_memory();
        cart.add_item(dish("a")).await;
        cart.add_item(dish("b")).await;
        let items = cart.add_item(dish("a")).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].dish.id, "a");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(cart.total_count().await, 3);

        cart.remove_item("a").await;
        let items = cart.remove_item("a").await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].dish.id, "b");

        let items = cart.remove_item("missing").await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_update_quantity() {
        let cart = CartService::in_memory();
        cart.add_item(dish("a")).await;

        let items = cart.update_quantity("a", 5).await.unwrap();
        assert_eq!(items[0].quantity, 5);

        let items = cart.update_quantity("ghost", 3).await.unwrap();
        assert_eq!(items.len(), 1);

        let items = cart.update_quantity("a", 0).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_quantity_is_capped() {
        let cart = CartService::in_memory();
        cart.add_item(dish("a")).await;

        let result = cart.update_quantity("a", 10_000_000_000).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert_eq!(cart.total_count().await, 1);

        cart.update_quantity("a", i64::from(MAX_ITEM_QUANTITY))
            .await
            .unwrap();
        let items = cart.add_item(dish("a")).await;
        assert_eq!(items[0].quantity, MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_total_quantity_does_not_overflow() {
        let items = vec![
            CartItem {
                dish: dish("a"),
                quantity: u32::MAX,
            },
            CartItem {
                dish: dish("b"),
                quantity: u32::MAX,
            },
        ];
        assert_eq!(total_quantity(&items), 2 * u64::from(u32::MAX));
    }

    #[tokio::test]
    async fn test_take_drains_cart() {
        let cart = CartService::in_memory();
        cart.add_item(dish("a")).await;
        cart.add_item(dish("b")).await;

        let taken = cart.take().await;
        assert_eq!(taken.len(), 2);
        assert!(cart.is_empty().await);
        assert!(cart.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_cart_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let cart = CartService::open(LocalStorage::new(dir.path())).await;
        cart.add_item(dish("a")).await;
        cart.add_item(dish("a")).await;

        let reopened = CartService::open(LocalStorage::new(dir.path())).await;
        assert_eq!(reopened.total_count().await, 2);

        reopened.clear().await;
        let again = CartService::open(LocalStorage::new(dir.path())).await;
        assert!(again.is_empty().await);
    }
}
