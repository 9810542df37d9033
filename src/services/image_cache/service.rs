//! In-memory image cache with in-flight de-duplication

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use super::fetcher::ImageFetcher;
use super::format::FormatSupport;
use crate::config::defaults::DEFAULT_PRELOAD_BATCH_SIZE;
use crate::errors::LoadError;

type SharedLoad = Shared<BoxFuture<'static, Result<(), LoadError>>>;

/// Record of which image URLs have loaded successfully.
///
/// Cloning is cheap and every clone shares the same state, so one instance
/// built at start-up lives until the last clone is dropped. Entries are never
/// evicted.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    fetcher: Arc<dyn ImageFetcher>,
    /// Known-loaded URLs
    loaded: RwLock<HashSet<String>>,
    /// URL -> load currently in flight
    pending: Mutex<HashMap<String, SharedLoad>>,
    format_support: OnceCell<FormatSupport>,
    batch_size: usize,
}

impl ImageCache {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_batch_size(fetcher, DEFAULT_PRELOAD_BATCH_SIZE)
    }

    pub fn with_batch_size(fetcher: Arc<dyn ImageFetcher>, batch_size: usize) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                loaded: RwLock::new(HashSet::new()),
                pending: Mutex::new(HashMap::new()),
                format_support: OnceCell::new(),
                batch_size: batch_size.max(1),
            }),
        }
    }

    /// Load an image once. Concurrent callers for the same URL attach to the
    /// load already in flight and observe its outcome. Failures are not
    /// memoized, so a later call retries.
    pub async fn preload(&self, url: &str) -> Result<(), LoadError> {
        let load = {
            let mut pending = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if self.is_cached(url) {
                trace!("Image cache hit: {}", url);
                return Ok(());
            }

            match pending.get(url) {
                Some(existing) => {
                    debug!("Attaching to in-flight image load: {}", url);
                    existing.clone()
                }
                None => {
                    let load = Self::run_load(self.inner.clone(), url.to_string())
                        .boxed()
                        .shared();
                    pending.insert(url.to_string(), load.clone());
                    load
                }
            }
        };

        load.await
    }

    async fn run_load(inner: Arc<CacheInner>, url: String) -> Result<(), LoadError> {
        let result = inner.fetcher.load(&url).await;

        {
            // Lock order matches `preload`: pending first, then loaded
            let mut pending = inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if result.is_ok() {
                inner
                    .loaded
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(url.clone());
            }
            pending.remove(&url);
        }

        result
    }

    /// Synchronous membership query
    pub fn is_cached(&self, url: &str) -> bool {
        self.inner
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    /// Register a URL as loaded without fetching it
    pub fn mark_loaded(&self, url: &str) {
        self.inner
            .loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string());
    }

    pub fn len(&self) -> usize {
        self.inner
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of loads currently in flight
    pub fn in_flight(&self) -> usize {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn batch_size(&self) -> usize {
        self.inner.batch_size
    }

    /// Decoder support, probed on first use and memoized for the lifetime of
    /// this cache
    pub async fn format_support(&self) -> FormatSupport {
        *self
            .inner
            .format_support
            .get_or_init(|| async {
                let support = tokio::task::spawn_blocking(FormatSupport::detect)
                    .await
                    .unwrap_or(FormatSupport::none());
                debug!("Detected image format support: {:?}", support);
                support
            })
            .await
    }

    /// Memoized decoder support, if already probed
    pub fn cached_format_support(&self) -> Option<FormatSupport> {
        self.inner.format_support.get().copied()
    }

    /// Seed the memoized decoder support, bypassing the probe
    pub fn set_format_support(&self, support: FormatSupport) -> bool {
        self.inner.format_support.set(support).is_ok()
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("loaded", &self.len())
            .field("in_flight", &self.in_flight())
            .field("batch_size", &self.inner.batch_size)
            .finish()
    }
}
