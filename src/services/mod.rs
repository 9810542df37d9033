//! Application services
//!
//! Imagery (`image_cache`, `lazy_image`, `image_compressor`) is independent of
//! the catalog and order flows, which sit on top of the repository layer and
//! local storage.

pub mod cart;
pub mod catalog_sync;
pub mod image_cache;
pub mod image_compressor;
pub mod image_upload;
pub mod lazy_image;
pub mod notification;
pub mod orders;

pub use cart::{CartService, MAX_ITEM_QUANTITY};
pub use catalog_sync::{CatalogSyncController, SyncOutcome};
pub use image_cache::{
    BatchReport, FormatSupport, HttpImageFetcher, ImageCache, ImageFetcher, ImagePreloader,
};
pub use image_compressor::{CompressOptions, CompressedImage, ImageCompressor, ImagePayload};
pub use image_upload::ImageUploadService;
pub use lazy_image::{ImageLoadState, ImageView, LazyImage, LazyImageOptions};
pub use notification::{NotificationOutcome, OrderNotifier, WebhookNotifier};
pub use orders::OrderService;
