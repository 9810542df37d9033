//! Batched image preloading and catalog warm-up

use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::service::ImageCache;
use crate::models::Category;
use crate::utils::AssetResolver;

/// Outcome counts for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub loaded: usize,
    pub failed: usize,
}

impl BatchReport {
    fn absorb(&mut self, other: BatchReport) {
        self.loaded += other.loaded;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.loaded + self.failed
    }
}

impl ImageCache {
    /// Preload `urls` using this cache's batch size
    pub async fn preload_all(&self, urls: &[String]) -> BatchReport {
        self.preload_batch(urls, self.batch_size()).await
    }

    /// Preload in sequential batches. Loads within a batch run concurrently
    /// and all settle before the next batch starts. Failures are logged and
    /// counted, never propagated.
    pub async fn preload_batch(&self, urls: &[String], batch_size: usize) -> BatchReport {
        self.preload_throttled(urls, batch_size, Duration::ZERO).await
    }

    /// Same as [`preload_batch`](Self::preload_batch) with a pause between
    /// batches
    pub async fn preload_throttled(
        &self,
        urls: &[String],
        batch_size: usize,
        delay: Duration,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let batch_size = batch_size.max(1);

        for (index, batch) in urls.chunks(batch_size).enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let results = join_all(batch.iter().map(|url| self.preload(url))).await;
            for result in results {
                match result {
                    Ok(()) => report.loaded += 1,
                    Err(e) => {
                        warn!("Failed to preload image {}: {}", e.url, e.message);
                        report.failed += 1;
                    }
                }
            }
            debug!(
                "Preload batch {} settled ({} images)",
                index + 1,
                batch.len()
            );
        }

        report
    }
}

/// Warms the image cache for a catalog
#[derive(Debug, Clone)]
pub struct ImagePreloader {
    cache: ImageCache,
    resolver: AssetResolver,
    batch_delay: Duration,
}

impl ImagePreloader {
    pub fn new(cache: ImageCache, resolver: AssetResolver, batch_delay: Duration) -> Self {
        Self {
            cache,
            resolver,
            batch_delay,
        }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Preload the visible category's images and wait for them, then preload
    /// everything else in a background task.
    ///
    /// Returns the report for the visible category along with the handle of
    /// the background task.
    pub async fn warm_catalog(
        &self,
        categories: &[Category],
        visible_category: Option<&str>,
    ) -> (BatchReport, JoinHandle<BatchReport>) {
        let mut visible = Vec::new();
        let mut rest = Vec::new();

        for category in categories {
            let is_visible = visible_category == Some(category.id.as_str());
            for dish in &category.dishes {
                let url = self.resolver.resolve(&dish.image);
                let bucket = if is_visible { &mut visible } else { &mut rest };
                if !bucket.contains(&url) {
                    bucket.push(url);
                }
            }
        }
        rest.retain(|url| !visible.contains(url));

        let first = self.cache.preload_all(&visible).await;
        if !visible.is_empty() {
            info!(
                "Preloaded {} of {} images for visible category",
                first.loaded,
                first.total()
            );
        }

        let cache = self.cache.clone();
        let delay = self.batch_delay;
        let handle = tokio::spawn(async move {
            let mut report = BatchReport::default();
            if rest.is_empty() {
                return report;
            }
            report.absorb(
                cache
                    .preload_throttled(&rest, cache.batch_size(), delay)
                    .await,
            );
            info!(
                "Background image preload finished: {} loaded, {} failed",
                report.loaded, report.failed
            );
            report
        });

        (first, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoadError;
    use crate::models::Dish;
    use crate::services::image_cache::ImageFetcher;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingFetcher {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageFetcher for RecordingFetcher {
        async fn load(&self, url: &str) -> Result<(), LoadError> {
            self.seen.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                Err(LoadError::new(url, "decode failed"))
            } else {
                Ok(())
            }
        }
    }

    fn dish(id: &str, image: &str) -> Dish {
        Dish {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            image: image.into(),
            category: "c".into(),
            tags: None,
        }
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_batch_failures_are_counted_and_logged() {
        let cache = ImageCache::new(Arc::new(RecordingFetcher::default()));
        let urls = vec!["a.jpg".to_string(), "broken.jpg".to_string()];

        let report = cache.preload_batch(&urls, 6).await;
        assert_eq!(report, BatchReport { loaded: 1, failed: 1 });
        assert!(logs_contain("Failed to preload image broken.jpg"));
    }

    #[tokio::test]
    async fn test_warm_catalog_loads_visible_category_first() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let cache = ImageCache::new(fetcher.clone());
        let preloader = ImagePreloader::new(cache.clone(), AssetResolver::new("/"), Duration::ZERO);

        let categories = vec![
            Category {
                id: "hot".into(),
                name: "Hot".into(),
                icon: "🔥".into(),
                dishes: vec![dish("h1", "/images/h1.jpg")],
            },
            Category {
                id: "cold".into(),
                name: "Cold".into(),
                icon: "❄".into(),
                dishes: vec![dish("c1", "/images/c1.jpg"), dish("c2", "https://cdn.example.com/c2.jpg")],
            },
        ];

        let (first, handle) = preloader.warm_catalog(&categories, Some("cold")).await;
        assert_eq!(first.loaded, 2);
        assert!(cache.is_cached("/images/c1.jpg"));

        let rest = handle.await.unwrap();
        assert_eq!(rest.loaded, 1);

        let seen = fetcher.seen.lock().unwrap().clone();
        assert_eq!(seen.last().map(String::as_str), Some("/images/h1.jpg"));
    }
}
