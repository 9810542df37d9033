//! Web handlers module
//!
//! HTTP request handlers organized by domain. Each module delegates to the
//! matching service on [`AppState`](crate::web::AppState).

pub mod cart;
pub mod health;
pub mod images;
pub mod menu;
pub mod orders;

pub use crate::web::responses::*;
