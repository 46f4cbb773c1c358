use anyhow::{Context, Result};
use clap::Parser;
use firewatch_server::services::fires::{FireService, FireServiceSettings, FirmsClient};
use firewatch_server::{cli, config, openapi, routes, state, static_assets, time};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind firewatch-server listener on {addr}: port already in use. Stop the other service using this port or re-run with --port to choose another port.",
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to bind firewatch-server listener on {addr}"))
        }
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown requested");
    cancel.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!(
            "{}",
            serde_json::to_string_pretty(&openapi::openapi_json())?
        );
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "failed to load .env"),
    }

    let config = config::FirewatchConfig::from_env(args.static_root)?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("firewatch-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let client = FirmsClient::new(http, config.firms_base_url.clone(), config.fetch_timeout());
    let fires = Arc::new(FireService::new(
        client,
        FireServiceSettings {
            map_key: config.firms_map_key.clone(),
            overall_timeout: config.overall_timeout(),
            detections_ttl: config.detections_cache_ttl(),
            statistics_ttl: config.stats_cache_ttl(),
        },
        time::system_clock(),
    ));

    let cancel = CancellationToken::new();
    fires
        .clone()
        .start_sweeper(config.cache_sweep_interval(), cancel.clone());

    let state = state::AppState {
        config: config.clone(),
        fires,
    };

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .use_headers()
            .finish()
            .context("failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();
    std::thread::spawn(move || loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
        governor_limiter.retain_recent();
    });

    let app = routes::router(state)
        .layer(GovernorLayer::new(governor_conf))
        .layer(CorsLayer::permissive())
        .fallback_service(static_assets::service(config.static_root.clone())?);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = bind_listener(&addr).await?;
    tracing::info!(
        %addr,
        default_region = %config.default_region,
        max_day_window = config.max_day_window,
        firms_configured = config.firms_map_key.is_some(),
        "firewatch-server listening"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cancel.clone()))
    .await?;
    cancel.cancel();
    Ok(())
}
