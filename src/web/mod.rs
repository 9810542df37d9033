//! Web layer module
//!
//! HTTP interface for the order menu. Handlers are thin and delegate to the
//! service layer; every response uses the [`ApiResponse`] envelope.

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::services::{
    CartService, CatalogSyncController, ImageCache, ImageUploadService, OrderService,
};
use crate::utils::AssetResolver;

pub mod handlers;
pub mod responses;

pub use responses::{ApiResponse, handle_error, handle_result};

/// Headroom above the upload size limit for multipart framing, so an
/// oversized image is rejected by validation rather than by the body limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &Config, state: AppState) -> Result<Self> {
        let app = Self::create_router(state);
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;

        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        let upload_limit = state.config.compression.max_upload_bytes as usize + MULTIPART_OVERHEAD;

        Router::new()
            .route("/health", get(handlers::health::health_check))
            .nest("/api/v1", Self::api_v1_routes(upload_limit))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    fn api_v1_routes(upload_limit: usize) -> Router<AppState> {
        Router::new()
            // Catalog
            .route("/menu", get(handlers::menu::get_menu))
            .route("/menu/refresh", post(handlers::menu::refresh_menu))
            .route("/menu/reset", post(handlers::menu::reset_menu))
            .route("/dishes", post(handlers::menu::create_dish))
            .route(
                "/dishes/{id}",
                patch(handlers::menu::update_dish).delete(handlers::menu::delete_dish),
            )
            .route("/categories", post(handlers::menu::create_category))
            .route(
                "/categories/{id}",
                patch(handlers::menu::update_category).delete(handlers::menu::delete_category),
            )
            // Cart
            .route(
                "/cart",
                get(handlers::cart::get_cart).delete(handlers::cart::clear_cart),
            )
            .route(
                "/cart/items/{dish_id}",
                post(handlers::cart::add_cart_item)
                    .put(handlers::cart::set_cart_quantity)
                    .delete(handlers::cart::remove_cart_item),
            )
            // Orders
            .route(
                "/orders",
                get(handlers::orders::list_orders).post(handlers::orders::submit_order),
            )
            // Images
            .route(
                "/images",
                post(handlers::images::upload_image)
                    .layer(DefaultBodyLimit::max(upload_limit))
                    .delete(handlers::images::delete_image),
            )
            .route("/images/resolve", get(handlers::images::resolve_image))
    }

    /// Serve until SIGINT/SIGTERM, then shut down gracefully
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.addr, e))?;
        tracing::info!("Web server listening on {}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, shutting down gracefully");
                    }
                    _ = sigint.recv() => {
                        tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully");
                    }
                }
            }
            _ => {
                tracing::warn!("Failed to install signal handlers, falling back to Ctrl+C");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down gracefully"),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<CatalogSyncController>,
    pub cart: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub uploads: Arc<ImageUploadService>,
    pub images: ImageCache,
    pub resolver: AssetResolver,
    pub start_time: DateTime<Utc>,
}
