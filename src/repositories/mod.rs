//! Remote store adapter
//!
//! [`MenuRepository`] is what the rest of the crate talks to. It sits on top
//! of the row-level [`TableStore`] trait so the hosted backend can be swapped
//! for an in-memory implementation in tests.
//!
//! # Usage
//!
//! ```rust
//! use order_menu::repositories::MenuRepository;
//!
//! # async fn example() {
//! let repo = MenuRepository::unconfigured();
//! let categories = repo.fetch_all().await;
//! assert!(!categories.is_empty());
//! # }
//! ```

pub mod menu;
pub mod supabase;
pub mod traits;

pub use menu::MenuRepository;
pub use supabase::SupabaseClient;
pub use traits::*;
