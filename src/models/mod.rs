//! Domain model shared by the catalog, cart and order flows

pub mod cart;
pub mod catalog;
pub mod order;

pub use cart::CartItem;
pub use catalog::{CatalogState, Category, CategoryPatch, Dish, DishPatch};
pub use order::Order;
