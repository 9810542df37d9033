//! Compressed image format detection

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// 1x1 lossless WebP used to probe decoder support
const WEBP_PROBE: &str = "UklGRhoAAABXRUJQVlA4TA0AAAAvAAAAEAcQERGIiP4HAA==";

/// Decoder capabilities detected once per cache instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSupport {
    pub webp: bool,
}

impl FormatSupport {
    /// Probe by decoding the embedded sample
    pub fn detect() -> Self {
        Self {
            webp: probe_webp(),
        }
    }

    pub const fn none() -> Self {
        Self { webp: false }
    }
}

fn probe_webp() -> bool {
    STANDARD
        .decode(WEBP_PROBE)
        .ok()
        .and_then(|bytes| image::load_from_memory_with_format(&bytes, ImageFormat::WebP).ok())
        .is_some_and(|img| img.width() == 1 && img.height() == 1)
}
