//! Match tracker binary entrypoint wiring the Riot client, match store, tracking loops and HTTP.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_tracker_back::{
    build_router,
    config::AppConfig,
    dao::match_store::{MatchStore, MemoryMatchStore},
    riot::{RiotClient, RiotConfig},
    services::{polling::PollingService, publisher::BroadcastPublisher},
    state::{AppState, EVENT_CHANNEL_CAPACITY, SseHub},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();

    let riot_config = RiotConfig::from_env()
        .context("reading Riot API keys")?
        .with_hosts(
            config.regional_base_url.as_str(),
            config.platform_base_url.as_str(),
            config.platform_id.as_str(),
        )
        .with_pacing(config.min_request_delay, config.default_retry_after);
    let riot = RiotClient::new(riot_config).context("building Riot API client")?;

    let store = build_store(&config).await?;
    let events = Arc::new(SseHub::new(EVENT_CHANNEL_CAPACITY));
    let publisher = BroadcastPublisher::new(events.clone());
    let polling = PollingService::new(
        store.clone(),
        Arc::new(riot),
        Arc::new(publisher),
        config.polling,
    );

    let app_state = AppState::new(store, events, polling);
    app_state.polling().start_polling().await;

    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    app_state.polling().stop_polling().await;
    info!("shutdown complete");

    Ok(())
}

/// Pick the MongoDB store when `MONGO_URI` is set, otherwise an in-memory store seeded from
/// the configuration.
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn MatchStore>> {
    #[cfg(feature = "mongo-store")]
    if env::var_os("MONGO_URI").is_some() {
        use match_tracker_back::dao::match_store::mongodb::{MongoConfig, MongoMatchStore};

        let mongo_config = MongoConfig::from_env().context("reading MongoDB configuration")?;
        let store = MongoMatchStore::connect(mongo_config)
            .await
            .context("connecting to MongoDB")?;
        info!("using MongoDB match store");
        return Ok(Arc::new(store));
    }

    let store = MemoryMatchStore::new();
    for seed in &config.seed_players {
        if let Err(err) = store.add_player(&seed.game_name, &seed.tag_line).await {
            warn!(error = %err, "skipping seed player");
        }
    }
    info!(
        players = config.seed_players.len(),
        "using in-memory match store"
    );
    Ok(Arc::new(store))
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
