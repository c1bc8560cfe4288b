//! Application state.

use std::sync::Arc;

use cdp_ledger_store::Store;

use crate::auth::AccessPolicy;
use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Role assignment for authenticated principals.
    pub access: AccessPolicy,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let access = AccessPolicy::new(&config.ledger_operators);

        if config.ledger_operators.is_empty() {
            tracing::warn!("No ledger operators configured - deposits and paybacks are read-only");
        } else {
            tracing::info!(
                operators = config.ledger_operators.len(),
                "Ledger operators configured"
            );
        }

        Self {
            store,
            config,
            access,
        }
    }
}
