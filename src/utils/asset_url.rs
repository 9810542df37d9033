//! Asset resolution
//!
//! Maps a logical image reference (relative path or absolute URL) to the URL
//! that is actually fetched, accounting for the deployment base path.

use serde::{Deserialize, Serialize};

/// Resolves image references against a configured base prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResolver {
    base: String,
}

impl AssetResolver {
    /// Create a resolver; the base is normalized to end with exactly one `/`
    pub fn new(base: &str) -> Self {
        let trimmed = base.trim_end_matches('/');
        Self {
            base: format!("{trimmed}/"),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolve a path to a fetchable URL
    ///
    /// # Examples
    ///
    /// ```rust
    /// use order_menu::utils::asset_url::AssetResolver;
    ///
    /// let resolver = AssetResolver::new("/order-menu");
    /// assert_eq!(resolver.resolve("/images/pork.jpg"), "/order-menu/images/pork.jpg");
    /// assert_eq!(resolver.resolve("images/pork.jpg"), "/order-menu/images/pork.jpg");
    /// assert_eq!(
    ///     resolver.resolve("https://cdn.example.com/pork.jpg"),
    ///     "https://cdn.example.com/pork.jpg"
    /// );
    /// ```
    pub fn resolve(&self, path: &str) -> String {
        if is_absolute_url(path) {
            return path.to_string();
        }
        let clean = path.strip_prefix('/').unwrap_or(path);
        format!("{}{}", self.base, clean)
    }
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new("/")
    }
}

pub fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}
