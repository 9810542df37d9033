use serde::{Deserialize, Serialize};

use super::Dish;

/// A dish in the cart; quantity is always at least one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub dish: Dish,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(dish: Dish) -> Self {
        Self { dish, quantity: 1 }
    }
}
