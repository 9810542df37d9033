//! Centralized error handling for the order menu service
//!
//! Error types are split by the layer that raises them so each boundary can
//! decide what to do with a failure:
//!
//! - **Load errors**: image fetch/decode failures, recoverable (placeholder)
//! - **Decode errors**: compressor input that is not an image, aborts an upload
//! - **Remote errors**: remote store failures, converted to `false` at the
//!   repository boundary and never thrown further up
//! - **Validation errors**: user-facing, the mutation is not attempted
//!
//! # Usage
//!
//! ```rust
//! use order_menu::errors::{AppError, AppResult};
//!
//! fn require_name(name: &str) -> AppResult<&str> {
//!     if name.trim().is_empty() {
//!         return Err(AppError::validation("name is required"));
//!     }
//!     Ok(name)
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for remote store Results
pub type RemoteResult<T> = Result<T, RemoteError>;
