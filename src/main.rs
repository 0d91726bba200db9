//! img2color - dominant color of remote images over HTTP.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use img2color::{
    config::Config,
    fetch::HttpFetcher,
    server::{create_router, AllowList, RouterConfig},
    store::{ColorStore, MongoTier, RedisTier},
    ColorService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let allow_list = match config.allow_list() {
        Ok(list) => list,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log_configuration(&config, &allow_list);

    let store = match build_store(&config).await {
        Some(store) => store,
        None => return ExitCode::FAILURE,
    };

    let fetcher = match HttpFetcher::with_timeout(config.fetch_timeout()) {
        Ok(fetcher) => fetcher.with_max_body_bytes(config.max_image_bytes),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let color_service = ColorService::new(fetcher, store);

    let router_config = RouterConfig::new(allow_list)
        .with_redacted_errors(config.redact_errors)
        .with_tracing(!config.no_tracing);

    let router = create_router(color_service, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -H 'Referer: <allowed>' 'http://{}/api?img=<image-url>'",
        addr
    );
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "img2color=debug,tower_http=debug"
    } else {
        "img2color=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Log the effective configuration, warning about degraded setups.
fn log_configuration(config: &Config, allow_list: &AllowList) {
    info!("img2color v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");

    if allow_list.is_empty() {
        warn!("  Allowed referers: NONE - every color request will be rejected");
        warn!("        Set ALLOWED_REFERERS, e.g. ALLOWED_REFERERS='https://blog.example.com/*'");
    } else {
        info!("  Allowed referers:");
        for pattern in allow_list.patterns() {
            info!("    {}", pattern);
        }
    }

    match &config.redis_address {
        Some(address) if config.use_redis_cache => info!(
            "  Redis cache: {} (db {}, ttl {}s)",
            address, config.redis_db, config.cache_ttl_secs
        ),
        _ => warn!("  Redis cache: disabled - every request recomputes its color"),
    }

    match &config.mongo_db {
        Some(database) if config.use_mongodb => info!(
            "  MongoDB: {}.{}",
            database, config.mongo_collection
        ),
        _ => info!("  MongoDB: disabled"),
    }

    info!(
        "  Fetch limits: {}s, {} bytes",
        config.fetch_timeout_secs, config.max_image_bytes
    );
    if config.redact_errors {
        info!("  Error detail: redacted");
    }
}

/// Connect the enabled tiers and assemble the store.
///
/// Returns `None` (after logging) if an enabled tier is unreachable.
async fn build_store(config: &Config) -> Option<ColorStore> {
    let mut store = ColorStore::new().with_ttl(config.cache_ttl());

    if let Some(settings) = config.redis_settings() {
        info!("Connecting to Redis at {}...", settings.address);
        match RedisTier::connect(&settings).await {
            Ok(tier) => {
                info!("  Connected successfully");
                store = store.with_volatile(Arc::new(tier));
            }
            Err(e) => {
                error!("  Failed to connect to Redis: {}", e);
                return None;
            }
        }
    }

    if let Some(settings) = config.mongo_settings() {
        info!("Connecting to MongoDB...");
        match MongoTier::connect(&settings).await {
            Ok(tier) => {
                info!("  Connected successfully");
                store = store.with_durable(Arc::new(tier));
            }
            Err(e) => {
                error!("  Failed to connect to MongoDB: {}", e);
                return None;
            }
        }
    }

    Some(store)
}
