mod cache;
mod candidates;
mod config;
mod db;
mod errors;
mod extract;
mod job_openings;
mod matching;
mod models;
mod pagination;
mod routes;
mod seed;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{NoCache, RedisCache, ResponseCache};
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, TalentStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SkillMatch API v{}", env!("CARGO_PKG_VERSION"));

    info!(
        "Scoring skills against year {}",
        config.scoring.current_year
    );

    // Initialize persistence (PostgreSQL when configured)
    let store: Arc<dyn TalentStore> = match &config.database_url {
        Some(url) => {
            let db = create_pool(url, config.db_max_connections).await?;
            ensure_schema(&db).await?;
            Arc::new(PgStore::new(db, config.scoring))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-process store; data is lost on restart");
            Arc::new(MemoryStore::new(config.scoring))
        }
    };

    if config.seed_demo_data {
        seed::seed_if_empty(store.as_ref()).await?;
    }

    // Initialize response cache (Redis when configured)
    let cache: Arc<dyn ResponseCache> = match &config.redis_url {
        Some(url) => match RedisCache::connect(url, "skillmatch").await {
            Ok(redis) => {
                info!("Redis response cache connected");
                Arc::new(redis)
            }
            Err(e) => {
                warn!("Redis unavailable, serving without a response cache: {e}");
                Arc::new(NoCache)
            }
        },
        None => {
            info!("REDIS_URL not set, response caching disabled");
            Arc::new(NoCache)
        }
    };

    // Build app state
    let state = AppState {
        store,
        cache,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
