//! Order submission and history

use chrono::Local;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::cart::CartService;
use super::notification::{NotificationOutcome, OrderNotifier};
use crate::config::defaults::DEFAULT_NOTIFICATION_TITLE;
use crate::errors::{AppError, AppResult};
use crate::models::Order;
use crate::storage::{LocalStorage, keys};

pub struct OrderService {
    cart: Arc<CartService>,
    notifier: Arc<dyn OrderNotifier>,
    storage: Option<LocalStorage>,
    /// Most recent first
    history: Mutex<Vec<Order>>,
    title: String,
}

impl OrderService {
    pub fn new(cart: Arc<CartService>, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self {
            cart,
            notifier,
            storage: None,
            history: Mutex::new(Vec::new()),
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }

    /// Restore the order history from storage
    pub async fn open(
        cart: Arc<CartService>,
        notifier: Arc<dyn OrderNotifier>,
        storage: LocalStorage,
    ) -> Self {
        let history = match storage.get::<Vec<Order>>(keys::ORDERS).await {
            Ok(orders) => orders.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to restore order history: {}", e);
                Vec::new()
            }
        };
        Self {
            history: Mutex::new(history),
            storage: Some(storage),
            ..Self::new(cart, notifier)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Submit the current cart.
    ///
    /// The cart is drained before the notification is sent, so items added
    /// while it is in flight stay in the cart for the next order. The order
    /// is recorded even when the notification fails; notification failures
    /// are only logged.
    pub async fn submit(&self, user_name: &str, note: &str) -> AppResult<Order> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(AppError::validation("user name is required"));
        }
        let items = self.cart.take().await;
        if items.is_empty() {
            return Err(AppError::validation("cart is empty"));
        }

        let order = Order::new(items, note.to_string(), user_name.to_string());
        {
            let mut history = self.history.lock().await;
            history.insert(0, order.clone());
            if let Some(storage) = &self.storage
                && let Err(e) = storage.set(keys::ORDERS, history.as_slice()).await
            {
                warn!("Failed to persist order history: {}", e);
            }
        }
        info!(
            "Order {} submitted by {} ({} items)",
            order.id,
            order.user_name,
            order.total_quantity()
        );

        let summary = render_summary(&order);
        match self.notifier.notify(&self.title, &summary).await {
            Ok(NotificationOutcome::Sent) | Ok(NotificationOutcome::Skipped) => {}
            Err(e) => error!("Failed to send notification for order {}: {}", order.id, e),
        }

        Ok(order)
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.history.lock().await.clone()
    }
}

/// Markdown summary sent to the operator
pub fn render_summary(order: &Order) -> String {
    let dishes = order
        .items
        .iter()
        .map(|item| format!("- {} × {}", item.dish.name, item.quantity))
        .collect::<Vec<_>>()
        .join("\n");
    let note = if order.note.trim().is_empty() {
        "none"
    } else {
        order.note.as_str()
    };

    format!(
        "## Submitted by\n{}\n\n## Dishes\n{}\n\n## Note\n{}\n\n## Order ID\n{}\n\n## Placed at\n{}",
        order.user_name,
        dishes,
        note,
        order.id,
        order
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartItem, Dish};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FailingNotifier {
        calls: StdMutex<usize>,
    }

    #[async_trait]
    impl OrderNotifier for FailingNotifier {
        async fn notify(&self, _title: &str, _body: &str) -> AppResult<NotificationOutcome> {
            *self.calls.lock().unwrap() += 1;
            Err(AppError::internal("endpoint down"))
        }
    }

    fn dish(name: &str) -> Dish {
        Dish {
            id: name.into(),
            name: name.into(),
            description: String::new(),
            image: String::new(),
            category: "c".into(),
            tags: None,
        }
    }

    #[test]
    fn test_summary_lists_items_and_defaults_note() {
        let order = Order::new(
            vec![CartItem {
                dish: dish("Mapo Tofu"),
                quantity: 2,
            }],
            String::new(),
            "Alice".into(),
        );
        let summary = render_summary(&order);
        assert!(summary.contains("## Submitted by\nAlice"));
        assert!(summary.contains("- Mapo Tofu × 2"));
        assert!(summary.contains("## Note\nnone"));
        assert!(summary.contains(&order.id));
    }

    #[tokio::test]
    async fn test_validation_happens_before_anything_is_recorded() {
        let cart = Arc::new(CartService::in_memory());
        let notifier = Arc::new(FailingNotifier::default());
        let orders = OrderService::new(cart.clone(), notifier.clone());

        assert!(orders.submit("Alice", "").await.is_err());
        cart.add_item(dish("a")).await;
        assert!(orders.submit("   ", "").await.is_err());

        assert!(orders.orders().await.is_empty());
        assert_eq!(*notifier.calls.lock().unwrap(), 0);
        assert_eq!(cart.total_count().await, 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_notification_failure_does_not_fail_order() {
        let cart = Arc::new(CartService::in_memory());
        let notifier = Arc::new(FailingNotifier::default());
        let orders = OrderService::new(cart.clone(), notifier.clone());
        cart.add_item(dish("a")).await;

        let first = orders.submit("Alice", "no rush").await.unwrap();
        assert!(cart.is_empty().await);
        assert!(logs_contain("Failed to send notification"));

        cart.add_item(dish("b")).await;
        let second = orders.submit("Bob", "").await.unwrap();

        let history = orders.orders().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
    }
}
