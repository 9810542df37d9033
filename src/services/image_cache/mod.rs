//! Image cache and preloading
//!
//! One [`ImageCache`] is built at start-up and cloned into every consumer.
//! It remembers which resolved URLs have loaded, collapses concurrent loads
//! of the same URL into a single fetch, and memoizes decoder format support.

pub mod fetcher;
pub mod format;
pub mod preloader;
pub mod service;

pub use fetcher::{HttpImageFetcher, ImageFetcher};
pub use format::FormatSupport;
pub use preloader::{BatchReport, ImagePreloader};
pub use service::ImageCache;
