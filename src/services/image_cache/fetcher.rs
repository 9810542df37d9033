//! Platform image-loading primitive

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, trace};
use url::Url;

use crate::errors::LoadError;
use crate::utils::asset_url::is_absolute_url;

/// Fetches and decodes one image. Implementations report success only once
/// the bytes have been decoded as an image.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn load(&self, url: &str) -> Result<(), LoadError>;
}

/// Fetches over HTTP with `reqwest` and decodes with `image`
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    /// Origin used to fetch relative asset URLs
    origin: Option<Url>,
}

impl HttpImageFetcher {
    pub fn new(client: Client, origin: Option<&str>) -> Self {
        let origin = origin.and_then(|o| Url::parse(o).ok());
        Self { client, origin }
    }

    fn absolute_url(&self, url: &str) -> Result<Url, LoadError> {
        if is_absolute_url(url) {
            return Url::parse(url).map_err(|e| LoadError::new(url, e.to_string()));
        }
        match &self.origin {
            Some(origin) => origin
                .join(url)
                .map_err(|e| LoadError::new(url, e.to_string())),
            None => Err(LoadError::new(
                url,
                "relative image URL and no public origin configured",
            )),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn load(&self, url: &str) -> Result<(), LoadError> {
        let target = self.absolute_url(url)?;
        trace!("Fetching image {}", target);

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| LoadError::new(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(LoadError::new(
                url,
                format!("HTTP {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::new(url, format!("Failed to read response: {e}")))?;

        let size = bytes.len();
        let (width, height) = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes).map(|img| (img.width(), img.height()))
        })
        .await
        .map_err(|e| LoadError::new(url, format!("Decode task failed: {e}")))?
        .map_err(|e| LoadError::new(url, format!("Failed to decode image: {e}")))?;

        debug!("Loaded image {} ({}x{}, {} bytes)", url, width, height, size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_url_requires_origin() {
        let fetcher = HttpImageFetcher::new(Client::new(), None);
        let err = fetcher.absolute_url("/images/pork.jpg").unwrap_err();
        assert_eq!(err.url, "/images/pork.jpg");

        let fetcher = HttpImageFetcher::new(Client::new(), Some("http://127.0.0.1:5173"));
        assert_eq!(
            fetcher.absolute_url("/images/pork.jpg").unwrap().as_str(),
            "http://127.0.0.1:5173/images/pork.jpg"
        );
        assert_eq!(
            fetcher
                .absolute_url("https://cdn.example.com/a.jpg")
                .unwrap()
                .as_str(),
            "https://cdn.example.com/a.jpg"
        );
    }
}
