/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5173;

// Asset defaults
pub const DEFAULT_ASSET_BASE_PATH: &str = "/";

// Remote store defaults
pub const DEFAULT_STORAGE_BUCKET: &str = "dish-images";
pub const DEFAULT_STORAGE_PATH_PREFIX: &str = "dishes";
pub const DEFAULT_STORAGE_CACHE_CONTROL: &str = "3600";
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";

// Environment variables selecting the remote store
pub const ENV_REMOTE_URL: &str = "SUPABASE_URL";
pub const ENV_REMOTE_KEY: &str = "SUPABASE_ANON_KEY";

// Image loading defaults
pub const DEFAULT_PRELOAD_BATCH_SIZE: usize = 6;
pub const DEFAULT_PRELOAD_BATCH_DELAY: &str = "100ms";
pub const DEFAULT_ROOT_MARGIN_PX: f64 = 200.0;

// Compression defaults
pub const DEFAULT_MAX_WIDTH: u32 = 800;
pub const DEFAULT_MAX_HEIGHT: u32 = 600;
pub const DEFAULT_QUALITY: f32 = 0.8;
pub const DEFAULT_MAX_SIZE_KB: u64 = 100;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024; // 5MB

// Local storage defaults
pub const DEFAULT_DATA_DIR: &str = "./data";

// Notification defaults
pub const DEFAULT_NOTIFICATION_TITLE: &str = "📋 New order received!";

// Dish defaults
pub const DEFAULT_DISH_IMAGE: &str =
    "https://images.pexels.com/photos/1640777/pexels-photo-1640777.jpeg?w=400&h=300&fit=crop";
