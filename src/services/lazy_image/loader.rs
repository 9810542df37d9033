use serde::Serialize;
use tracing::{debug, warn};

use super::visibility::{Rect, VisibilityGate};
use crate::config::ImageConfig;
use crate::config::defaults::DEFAULT_ROOT_MARGIN_PX;
use crate::services::image_cache::{FormatSupport, ImageCache};
use crate::utils::{AssetResolver, UrlUtils};

/// Per-instance lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageLoadState {
    OffscreenPending,
    InView,
    Loaded,
    Errored,
}

/// What a front end should render for the image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageView {
    Skeleton,
    Image { src: String },
    Placeholder,
}

/// Position in the source sequence. Advances one way only, so an instance
/// makes at most one fallback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAttempt {
    Preferred,
    Fallback,
    Exhausted,
}

impl SourceAttempt {
    pub fn advance(self, has_fallback: bool) -> Self {
        match self {
            Self::Preferred if has_fallback => Self::Fallback,
            _ => Self::Exhausted,
        }
    }
}

/// Preferred source plus the optional original-format fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    pub preferred: String,
    pub fallback: Option<String>,
}

impl SourcePlan {
    /// WebP sibling first when the decoder supports it and the path has a
    /// raster extension; otherwise the resolved URL alone.
    pub fn negotiate(resolved: &str, support: FormatSupport) -> Self {
        let sibling = support
            .webp
            .then(|| UrlUtils::swap_extension(resolved, "webp"))
            .flatten();

        match sibling {
            Some(webp) => Self {
                preferred: webp,
                fallback: Some(resolved.to_string()),
            },
            None => Self {
                preferred: resolved.to_string(),
                fallback: None,
            },
        }
    }

    pub fn source(&self, attempt: SourceAttempt) -> Option<&str> {
        match attempt {
            SourceAttempt::Preferred => Some(&self.preferred),
            SourceAttempt::Fallback => self.fallback.as_deref(),
            SourceAttempt::Exhausted => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LazyImageOptions {
    /// Skip the visibility gate for above-the-fold content
    pub priority: bool,
    pub root_margin: f64,
}

impl Default for LazyImageOptions {
    fn default() -> Self {
        Self {
            priority: false,
            root_margin: DEFAULT_ROOT_MARGIN_PX,
        }
    }
}

impl From<&ImageConfig> for LazyImageOptions {
    fn from(config: &ImageConfig) -> Self {
        Self {
            priority: false,
            root_margin: config.root_margin_px,
        }
    }
}

/// Visibility-triggered loader for one rendered image
#[derive(Debug)]
pub struct LazyImage {
    resolved: String,
    cache: ImageCache,
    gate: VisibilityGate,
    state: ImageLoadState,
    attempt: SourceAttempt,
    loaded_src: Option<String>,
}

impl LazyImage {
    pub fn new(
        src: &str,
        resolver: &AssetResolver,
        cache: ImageCache,
        options: LazyImageOptions,
    ) -> Self {
        let resolved = resolver.resolve(src);
        let mut gate = VisibilityGate::new(options.root_margin);

        let (state, loaded_src) = if cache.is_cached(&resolved) {
            gate.disconnect();
            (ImageLoadState::Loaded, Some(resolved.clone()))
        } else if options.priority {
            gate.disconnect();
            (ImageLoadState::InView, None)
        } else {
            (ImageLoadState::OffscreenPending, None)
        };

        Self {
            resolved,
            cache,
            gate,
            state,
            attempt: SourceAttempt::Preferred,
            loaded_src,
        }
    }

    pub fn state(&self) -> ImageLoadState {
        self.state
    }

    pub fn resolved_url(&self) -> &str {
        &self.resolved
    }

    /// Feed a layout observation. Returns `true` when this call moved the
    /// image into view.
    pub fn observe(&mut self, element: &Rect, viewport: &Rect) -> bool {
        if self.state != ImageLoadState::OffscreenPending {
            return false;
        }
        if self.gate.observe(element, viewport) {
            self.state = ImageLoadState::InView;
            return true;
        }
        false
    }

    /// Load the image if it is in view. Tries the negotiated sources in order
    /// and settles in `Loaded` or `Errored`; any other state is returned
    /// unchanged.
    pub async fn load(&mut self) -> ImageLoadState {
        if self.state != ImageLoadState::InView {
            return self.state;
        }

        let support = match self.cache.cached_format_support() {
            Some(support) => support,
            None => self.cache.format_support().await,
        };
        let plan = SourcePlan::negotiate(&self.resolved, support);
        let has_fallback = plan.fallback.is_some();

        while let Some(url) = plan.source(self.attempt) {
            match self.cache.preload(url).await {
                Ok(()) => {
                    if url != self.resolved {
                        self.cache.mark_loaded(&self.resolved);
                    }
                    debug!("Lazy image loaded from {}", url);
                    self.loaded_src = Some(url.to_string());
                    self.state = ImageLoadState::Loaded;
                    return self.state;
                }
                Err(e) => {
                    self.attempt = self.attempt.advance(has_fallback);
                    if self.attempt == SourceAttempt::Fallback {
                        warn!("Preferred image source failed, falling back: {}", e);
                    } else {
                        warn!("Image failed to load: {}", e);
                    }
                }
            }
        }

        self.state = ImageLoadState::Errored;
        self.state
    }

    pub fn view(&self) -> ImageView {
        match (self.state, &self.loaded_src) {
            (ImageLoadState::Loaded, Some(src)) => ImageView::Image { src: src.clone() },
            (ImageLoadState::Errored, _) => ImageView::Placeholder,
            _ => ImageView::Skeleton,
        }
    }
}
