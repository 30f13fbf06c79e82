use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shortener::app::{build_router, AppOptions, RateLimiter};
use shortener::cache::{MemoryCache, NullCache, RedisCache, UrlCache};
use shortener::config::{AppEnv, CacheBackend, Config};
use shortener::service::{ClickAccountant, ResolutionService, ShorteningService};
use shortener::storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so it can pick the log format
    let config = Config::from_env()?;
    init_tracing(config.app_env);
    info!("Loaded configuration");

    // Initialize storage
    let storage = storage::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    // Initialize cache
    let cache: Arc<dyn UrlCache> = match config.cache.backend {
        CacheBackend::Redis => Arc::new(
            RedisCache::connect(
                &config.cache.redis.url,
                config.cache.redis.key_prefix.clone(),
                Duration::from_millis(config.cache.redis.timeout_ms),
            )
            .await
            .context("failed to connect to Redis")?,
        ),
        CacheBackend::Memory => {
            info!(max_entries = config.cache.max_entries, "Using in-process cache");
            Arc::new(MemoryCache::new(config.cache.max_entries))
        }
        CacheBackend::None => Arc::new(NullCache::new()),
    };

    // Build services
    let clicks = ClickAccountant::new(Arc::clone(&storage), config.click_timeout());
    let shortener = Arc::new(ShorteningService::new(
        Arc::clone(&storage),
        config.duplicate_policy,
    ));
    info!(duplicate_policy = ?shortener.duplicate_policy(), "Shortening service ready");
    let resolver = Arc::new(ResolutionService::new(
        Arc::clone(&storage),
        cache,
        clicks,
        config.cache_ttl(),
    ));

    let rate_limiter = if config.rate_limit.enabled {
        info!(
            window_ms = config.rate_limit.window_ms,
            max_clients = config.rate_limit.max_clients,
            "Rate limiting enabled"
        );
        Some(Arc::new(RateLimiter::new(
            Duration::from_millis(config.rate_limit.window_ms),
            config.rate_limit.max_clients,
        )))
    } else {
        None
    };

    let app = build_router(
        shortener,
        resolver,
        AppOptions {
            public_base_url: config.server.public_base_url.clone(),
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            rate_limiter,
        },
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - Short URLs are served as {}/<code>", config.server.public_base_url);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, draining connections...");
        let _ = shutdown_tx.send(true);
    });

    let mut graceful_rx = shutdown_rx.clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = graceful_rx.changed().await;
    });

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    tokio::select! {
        result = server.into_future() => {
            result?;
            info!("Server stopped");
        }
        _ = async {
            let _ = shutdown_rx.changed().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out, dropping open connections");
        }
    }

    Ok(())
}

fn init_tracing(app_env: AppEnv) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match app_env {
        AppEnv::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        AppEnv::Development => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
