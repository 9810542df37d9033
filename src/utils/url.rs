//! URL utilities for image sources and remote storage paths

use regex::Regex;
use url::Url;

/// Raster extensions that have a compressed-format sibling
const SIBLING_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Swap the file extension of a path or URL, keeping any query string
    /// and fragment. Returns `None` when the last path segment has no
    /// swappable raster extension.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use order_menu::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::swap_extension("/menu/images/pork.jpg", "webp"),
    ///     Some("/menu/images/pork.webp".to_string())
    /// );
    /// assert_eq!(UrlUtils::swap_extension("https://cdn.example.com/photo?w=400", "webp"), None);
    /// ```
    pub fn swap_extension(path: &str, new_extension: &str) -> Option<String> {
        let split_at = path.find(['?', '#']).unwrap_or(path.len());
        let (location, suffix) = path.split_at(split_at);

        let segment_start = location.rfind('/').map(|i| i + 1).unwrap_or(0);
        let segment = &location[segment_start..];
        let dot = segment.rfind('.')?;
        let extension = &segment[dot + 1..];
        if !SIBLING_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
            return None;
        }

        let stem_end = segment_start + dot;
        Some(format!("{}.{}{}", &location[..stem_end], new_extension, suffix))
    }

    /// Extract the object path from a public storage URL of the form
    /// `<base>/storage/v1/object/public/<bucket>/<path>`.
    pub fn storage_object_path(public_url: &str, bucket: &str) -> Option<String> {
        let parsed = Url::parse(public_url).ok()?;
        let pattern = Regex::new(&format!(
            r"/storage/v1/object/public/{}/(.+)",
            regex::escape(bucket)
        ))
        .ok()?;
        let captures = pattern.captures(parsed.path())?;
        let raw = captures.get(1)?.as_str();
        urlencoding::decode(raw).ok().map(|p| p.into_owned())
    }

    /// Build the public URL for an object in a storage bucket
    pub fn storage_public_url(base_url: &str, bucket: &str, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            base_url.trim_end_matches('/'),
            bucket,
            object_path.trim_start_matches('/')
        )
    }
}
