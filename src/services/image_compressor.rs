//! Resize and re-encode images before upload
//!
//! Inputs over the byte budget are decoded, scaled to fit the configured
//! bounds and re-encoded as JPEG, lowering quality in 10-point steps until
//! the output fits or quality reaches the floor. Inputs already within
//! budget pass through untouched.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CompressionConfig;
use crate::config::defaults::{
    DEFAULT_MAX_HEIGHT, DEFAULT_MAX_SIZE_KB, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY,
};
use crate::errors::DecodeError;

/// Lowest quality the reduction loop will reach, in percent
pub const QUALITY_FLOOR_PERCENT: u8 = 30;
const QUALITY_STEP_PERCENT: u8 = 10;
const OUTPUT_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Initial encoder quality in `(0, 1]`
    pub quality: f32,
    pub max_size_bytes: u64,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            max_size_bytes: DEFAULT_MAX_SIZE_KB * 1024,
        }
    }
}

impl From<&CompressionConfig> for CompressOptions {
    fn from(config: &CompressionConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            quality: config.quality,
            max_size_bytes: config.max_size_bytes(),
        }
    }
}

impl CompressOptions {
    fn quality_percent(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Image input, either raw file bytes or a `data:<mime>;base64,` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    Bytes(Vec<u8>),
    DataUrl(String),
}

impl ImagePayload {
    /// Raw bytes and declared mime type (data URLs only)
    fn decode(&self) -> Result<(Vec<u8>, Option<String>), DecodeError> {
        match self {
            Self::Bytes(bytes) => Ok((bytes.clone(), None)),
            Self::DataUrl(url) => {
                let (mime, data) = parse_data_url(url)?;
                Ok((STANDARD.decode(data)?, Some(mime.to_string())))
            }
        }
    }

    pub fn is_data_url(&self) -> bool {
        matches!(self, Self::DataUrl(_))
    }

    /// The payload as raw bytes, decoding data URLs
    pub fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        self.decode().map(|(bytes, _)| bytes)
    }
}

/// Split `data:<mime>;base64,<data>` into its mime type and base64 section
pub fn parse_data_url(url: &str) -> Result<(&str, &str), DecodeError> {
    let invalid = |message: &str| DecodeError::InvalidDataUrl {
        message: message.to_string(),
    };

    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| invalid("missing data: scheme"))?;
    let (mime, data) = rest
        .split_once(";base64,")
        .ok_or_else(|| invalid("expected ;base64, payload"))?;
    if mime.is_empty() || data.is_empty() {
        return Err(invalid("empty mime type or payload"));
    }
    Ok((mime, data))
}

/// Compression result with the figures reported to callers
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub payload: ImagePayload,
    /// Mime type of the payload, when known
    pub mime_type: Option<String>,
    /// Final encoder quality in percent; `None` when passed through
    pub quality: Option<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressedImage {
    pub fn was_reencoded(&self) -> bool {
        self.quality.is_some()
    }
}

/// Scale `(width, height)` to fit within the bounds, preserving aspect
/// ratio. Never upscales.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (mut w, mut h) = (width as f64, height as f64);
    if w > max_width as f64 {
        h = h * max_width as f64 / w;
        w = max_width as f64;
    }
    if h > max_height as f64 {
        w = w * max_height as f64 / h;
        h = max_height as f64;
    }
    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}

pub struct ImageCompressor;

impl ImageCompressor {
    /// Compress synchronously. CPU bound; prefer
    /// [`compress_async`](Self::compress_async) from async code.
    pub fn compress(
        payload: ImagePayload,
        options: &CompressOptions,
    ) -> Result<CompressedImage, DecodeError> {
        let (bytes, declared_mime) = payload.decode()?;
        let original_size = bytes.len() as u64;

        if original_size <= options.max_size_bytes {
            debug!(
                "Image already within budget ({} <= {} bytes), skipping compression",
                original_size, options.max_size_bytes
            );
            let mime_type = declared_mime.or_else(|| {
                image::guess_format(&bytes)
                    .ok()
                    .map(|f| f.to_mime_type().to_string())
            });
            return Ok(CompressedImage {
                payload,
                mime_type,
                quality: None,
                width: None,
                height: None,
                original_size,
                compressed_size: original_size,
            });
        }

        let decoded = image::load_from_memory(&bytes)?;
        let (width, height) = fit_dimensions(
            decoded.width(),
            decoded.height(),
            options.max_width,
            options.max_height,
        );
        let scaled = if (width, height) == decoded.dimensions() {
            decoded
        } else {
            decoded.resize_exact(width, height, FilterType::Triangle)
        };

        let mut quality = options.quality_percent();
        let mut encoded = encode_jpeg(&scaled, quality)?;
        while encoded.len() as u64 > options.max_size_bytes && quality > QUALITY_FLOOR_PERCENT {
            quality = quality
                .saturating_sub(QUALITY_STEP_PERCENT)
                .max(QUALITY_FLOOR_PERCENT);
            encoded = encode_jpeg(&scaled, quality)?;
        }

        let compressed_size = encoded.len() as u64;
        info!(
            "Image compressed: {:.1}KB -> {:.1}KB (quality: {}%, {}x{})",
            original_size as f64 / 1024.0,
            compressed_size as f64 / 1024.0,
            quality,
            width,
            height
        );

        let payload = if payload.is_data_url() {
            ImagePayload::DataUrl(format!(
                "data:{};base64,{}",
                OUTPUT_MIME,
                STANDARD.encode(&encoded)
            ))
        } else {
            ImagePayload::Bytes(encoded)
        };

        Ok(CompressedImage {
            payload,
            mime_type: Some(OUTPUT_MIME.to_string()),
            quality: Some(quality),
            width: Some(width),
            height: Some(height),
            original_size,
            compressed_size,
        })
    }

    /// Compress on the blocking thread pool
    pub async fn compress_async(
        payload: ImagePayload,
        options: CompressOptions,
    ) -> Result<CompressedImage, DecodeError> {
        tokio::task::spawn_blocking(move || Self::compress(payload, &options))
            .await
            .map_err(|e| DecodeError::Task {
                message: e.to_string(),
            })?
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, DecodeError> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(&rgb)?;
    Ok(buffer)
}
