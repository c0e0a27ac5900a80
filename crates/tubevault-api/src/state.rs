//! Application state.

use std::sync::Arc;

use tubevault_ingest::{IngestResult, Orchestrator};
use tubevault_storage::ObjectStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create state with collaborators configured from the environment.
    pub async fn new(config: ApiConfig) -> IngestResult<Self> {
        let orchestrator = Orchestrator::from_env().await?;
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    pub fn with_orchestrator(config: ApiConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// The store the orchestrator writes to.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        self.orchestrator.store()
    }
}
