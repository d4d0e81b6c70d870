//! Matchday Back binary entrypoint wiring REST, storage and scheduler layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::AppConfig;
use dao::match_store::memory::MemoryMatchStore;
use services::{
    notifier::{HttpPushGateway, LogOnlyGateway, NotificationGateway},
    reminder_scheduler::{self, EventReminders, MatchReminders},
    status_scheduler,
};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let gateway: Arc<dyn NotificationGateway> = match &config.gateway_url {
        Some(url) => Arc::new(HttpPushGateway::new(url.clone())),
        None => Arc::new(LogOnlyGateway),
    };
    let app_state = AppState::new(config, gateway);

    init_store(&app_state).await;

    // Scheduler tasks share one shutdown signal so the process can stop the
    // tickers cleanly after the HTTP server drains.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_schedulers(app_state.clone(), shutdown_rx);

    let app = build_router(app_state);

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

    let _ = shutdown_tx.send(true);

    Ok(())
}

/// Install a storage backend: MongoDB under supervision when `MONGO_URI` is
/// set, the in-memory store otherwise.
async fn init_store(state: &SharedState) {
    #[cfg(feature = "mongo-store")]
    if env::var_os("MONGO_URI").is_some() {
        use crate::dao::match_store::{MatchStore, StorageError, mongodb};

        let connect = || async {
            let config = mongodb::config::MongoConfig::from_env()
                .await
                .map_err(StorageError::from)?;
            let store = mongodb::MongoMatchStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn MatchStore>)
        };
        tokio::spawn(services::storage_supervisor::run(state.clone(), connect));
        return;
    }

    info!("MONGO_URI not set; using the in-memory store");
    state
        .install_store(Arc::new(MemoryMatchStore::new()))
        .await;
}

/// Launch the status scheduler and both reminder schedulers.
fn spawn_schedulers(state: SharedState, shutdown: watch::Receiver<bool>) {
    let config = state.config().clone();

    tokio::spawn(status_scheduler::run(
        state.clone(),
        config.status_tick_interval,
        shutdown.clone(),
    ));
    tokio::spawn(reminder_scheduler::run(
        state.clone(),
        Arc::new(MatchReminders),
        config.match_reminder_window,
        config.reminder_tick_interval,
        shutdown.clone(),
    ));
    tokio::spawn(reminder_scheduler::run(
        state,
        Arc::new(EventReminders),
        config.event_reminder_window,
        config.reminder_tick_interval,
        shutdown,
    ));
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
