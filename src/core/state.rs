// Application state (AppState)

use crate::auth::service::CredentialService;
use crate::core::config::Config;
use crate::stores::user_store::MemoryUserStore;
use crate::wal::wal::Wal;
use std::sync::Arc;

/// Shared application state
///
/// All fields are wrapped in Arc for cheap cloning across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and token verification
    pub credentials: CredentialService,

    /// User records backing the credential service
    pub user_store: Arc<MemoryUserStore>,

    /// Write-Ahead Log for persistence
    pub wal: Arc<Wal>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, wal: Wal) -> Self {
        let wal = Arc::new(wal);
        let user_store = Arc::new(MemoryUserStore::with_wal(Arc::clone(&wal)));
        let credentials = CredentialService::new(user_store.clone(), &config.auth);

        Self {
            credentials,
            user_store,
            wal,
            config: Arc::new(config),
        }
    }
}
