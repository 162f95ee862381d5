use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::store::TalentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Persistence gateway. `PgStore` in production.
    pub store: Arc<dyn TalentStore>,
    /// Read-through cache for GET endpoints. `NoCache` when Redis is not configured.
    pub cache: Arc<dyn ResponseCache>,
    pub config: Config,
}

impl AppState {
    pub fn cache_ttl(&self) -> Duration {
        self.config.cache_ttl
    }
}
