//! NesebarClima storefront server

use anyhow::Result;
use clima_storefront::config::{AppConfig, SessionBackend};
use clima_storefront::http::{build_router, AppState, SessionSettings};
use clima_storefront::notify::EventPublisher;
use clima_storefront::storage::health::{spawn_session_purge, DbHealth};
use clima_storefront::storage::memory::MemorySessionStore;
use clima_storefront::storage::postgres::{PgOrderRepository, PgProductRepository, PgSessionStore};
use clima_storefront::storage::SessionStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Lazy pool: the listener comes up even while the database is down.
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_health_interval)
        .connect_lazy(&config.database_url)?;
    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
        tracing::warn!("migrations not applied: {e}");
    }

    let health = DbHealth::new();
    health.spawn_monitor(db.clone(), config.db_health_interval);

    let session_ttl = chrono::Duration::from_std(config.session_ttl)?;
    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new(session_ttl)),
        SessionBackend::Postgres => Arc::new(PgSessionStore::new(db.clone(), session_ttl)),
    };
    spawn_session_purge(sessions.clone(), Arc::new(health.clone()), SESSION_PURGE_INTERVAL);

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("NATS unavailable, order events disabled: {e}");
                None
            }
        },
        None => None,
    };

    let state = AppState::new(
        Arc::new(PgProductRepository::new(db.clone())),
        Arc::new(PgOrderRepository::new(db)),
        sessions,
        Arc::new(health),
        EventPublisher::new(nats),
        SessionSettings { cookie_name: config.session_cookie_name.clone(), ttl: config.session_ttl },
    );
    let app = build_router(state);

    tracing::info!(backend = ?config.session_backend, "NesebarClima storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
