use std::sync::Arc;

use tracing::{info, warn};

use tallybank_core::Currency;
use tallybank_infra::{InMemoryLedgerStore, PostgresLedgerStore};
use tallybank_ledger::{
    AccountService, LedgerStore, RandomAccountNumbers, TransferEngine, TransferHistory,
};

use crate::config::AppConfig;

pub type SharedStore = Arc<dyn LedgerStore>;

const PG_MAX_CONNECTIONS: u32 = 10;

/// Ledger services shared by all handlers.
pub struct AppServices {
    pub accounts: AccountService<SharedStore>,
    pub transfers: TransferEngine<SharedStore>,
    pub history: TransferHistory<SharedStore>,
}

impl AppServices {
    pub fn with_store(store: SharedStore, config: &AppConfig) -> Self {
        Self {
            accounts: AccountService::new(
                store.clone(),
                Arc::new(RandomAccountNumbers::default()),
                config.currency.clone(),
            ),
            transfers: TransferEngine::with_max_attempts(store.clone(), config.transfer_max_attempts),
            history: TransferHistory::new(store),
        }
    }

    pub fn currency(&self) -> &Currency {
        self.accounts.currency()
    }
}

/// Pick the store from configuration: Postgres when `DATABASE_URL` is set,
/// otherwise an in-memory ledger.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let pg = PostgresLedgerStore::connect(url, PG_MAX_CONNECTIONS).await?;
            pg.migrate().await?;
            info!("using postgres ledger store");
            Arc::new(pg)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory ledger store");
            Arc::new(InMemoryLedgerStore::new())
        }
    };

    Ok(AppServices::with_store(store, config))
}
