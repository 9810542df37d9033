use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_menu::{
    config::Config,
    repositories::{MenuRepository, ObjectStore, SupabaseClient, TableStore},
    services::{
        CartService, CatalogSyncController, HttpImageFetcher, ImageCache, ImagePreloader,
        ImageUploadService, OrderService, WebhookNotifier,
    },
    storage::LocalStorage,
    utils::{AssetResolver, http_client::build_client},
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "order-menu")]
#[command(version)]
#[command(about = "A food-ordering menu service with remote sync and image caching")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("order_menu={},tower_http=trace", cli.log_level)
    } else {
        format!("order_menu={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting order menu service v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let client = build_client(config.remote.connect_timeout)?;

    // One client serves both the tables and the image bucket
    let supabase = SupabaseClient::from_config(client.clone(), &config.remote).map(Arc::new);
    let tables = supabase.clone().map(|s| s as Arc<dyn TableStore>);
    let objects = supabase.map(|s| s as Arc<dyn ObjectStore>);

    let storage = LocalStorage::new(&config.storage.data_dir);
    if let Err(e) = storage.init_image_cache_version().await {
        warn!("Failed to check image cache version: {}", e);
    }

    let catalog = Arc::new(CatalogSyncController::new(
        MenuRepository::new(tables),
        Some(storage.clone()),
    ));
    catalog.initialize().await;

    let cart = Arc::new(CartService::open(storage.clone()).await);
    let notifier = Arc::new(WebhookNotifier::from_config(
        client.clone(),
        &config.notification,
    ));
    if !notifier.is_configured() {
        info!("No notification webhook configured, orders will not be forwarded");
    }
    let orders = Arc::new(
        OrderService::open(cart.clone(), notifier, storage.clone())
            .await
            .with_title(config.notification.title.clone()),
    );
    let uploads = Arc::new(
        ImageUploadService::new(objects, &config.compression)
            .with_path_prefix(&config.remote.path_prefix),
    );

    let resolver = AssetResolver::new(&config.assets.base_path);
    let images = ImageCache::with_batch_size(
        Arc::new(HttpImageFetcher::new(
            client,
            config.assets.origin.as_deref(),
        )),
        config.images.preload_batch_size,
    );

    let preloader = ImagePreloader::new(
        images.clone(),
        resolver.clone(),
        config.images.preload_batch_delay,
    );
    let categories = catalog.categories().await;
    let first_category = categories.first().map(|c| c.id.clone());
    let (report, _background) = preloader
        .warm_catalog(&categories, first_category.as_deref())
        .await;
    info!(
        "Warmed {} images for the first category ({} failed), preloading the rest in background",
        report.loaded, report.failed
    );

    let state = AppState {
        config: config.clone(),
        catalog,
        cart,
        orders,
        uploads,
        images,
        resolver,
        start_time: Utc::now(),
    };

    let server = WebServer::new(&config, state)?;
    info!("Serving on http://{}:{}", server.host(), server.port());
    server.serve().await?;

    info!("Order menu service stopped");
    Ok(())
}
