use std::sync::Arc;

use anyhow::Context;

use medfind_infra::store::{InMemoryPharmacyStore, PharmacyStore, PostgresPharmacyStore, SeedData};
use medfind_infra::{AvailabilitySearch, EngineConfig, ReservationEngine};

use crate::config::ApiConfig;

pub type SharedStore = Arc<dyn PharmacyStore>;

/// Engines and the store behind them, shared by every handler.
pub struct AppServices {
    pub store: SharedStore,
    pub search: AvailabilitySearch<SharedStore>,
    pub reservations: ReservationEngine<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore, engine: &EngineConfig) -> Self {
        Self {
            search: AvailabilitySearch::new(store.clone(), engine),
            reservations: ReservationEngine::new(store.clone(), engine),
            store,
        }
    }

    /// In-memory services over an already populated store (dev/test).
    pub fn in_memory(store: InMemoryPharmacyStore, engine: &EngineConfig) -> Self {
        Self::new(Arc::new(store), engine)
    }
}

/// Select and prepare the store named by `config`, then wire the engines.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let seed = match &config.seed_file {
        Some(path) => Some(
            SeedData::from_path(path).with_context(|| format!("failed to load seed file {}", path.display()))?,
        ),
        None => None,
    };

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let store = PostgresPharmacyStore::connect(url, &config.postgres)
                .await
                .context("failed to connect to Postgres")?;
            store.migrate().await.context("failed to apply schema")?;
            if let Some(seed) = seed {
                store.load_seed(seed).await.context("failed to seed Postgres")?;
            }
            tracing::info!("using Postgres store");
            Arc::new(store)
        }
        None => {
            let store = InMemoryPharmacyStore::new();
            if let Some(seed) = seed {
                store.load_seed(seed).context("failed to seed in-memory store")?;
            }
            tracing::info!("using in-memory store");
            Arc::new(store)
        }
    };

    Ok(AppServices::new(store, &config.engine))
}
