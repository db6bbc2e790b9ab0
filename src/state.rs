//! Shared application state.

use std::sync::Arc;

use homeboard_core::Vault;

use crate::config::Config;
use crate::jobs::SyncDispatcher;
use crate::orchestrator::SyncContext;
use crate::provider::CalendarApi;
use crate::rate_limit::RateLimiter;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub api: Arc<dyn CalendarApi>,
    pub vault: Arc<Vault>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub sync: SyncContext,
    pub dispatcher: SyncDispatcher,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        api: Arc<dyn CalendarApi>,
        vault: Vault,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let sync = SyncContext {
            store: Arc::clone(&store),
            api: Arc::clone(&api),
            vault: Arc::new(vault),
            guard: crate::orchestrator::SyncGuard::new(),
        };
        let dispatcher = SyncDispatcher::spawn(sync.clone());

        AppState {
            config: Arc::new(config),
            store,
            api,
            vault: Arc::clone(&sync.vault),
            rate_limiter,
            sync,
            dispatcher,
        }
    }
}
