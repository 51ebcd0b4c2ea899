use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::state::AppState;
use crate::models::user::User;
use crate::wal::wal::WalOperation;

/// Rebuild the user store from the WAL; this runs at boot time
pub fn restore_users(state: &AppState) -> Result<usize> {
    let operations = state.wal.replay().context("Failed to replay WAL")?;
    apply_wal_operations(state, &operations);

    info!(
        wal_path = %state.wal.path().display(),
        operations_replayed = operations.len(),
        users_loaded = state.user_store.len(),
        "WAL replay completed"
    );

    Ok(operations.len())
}

pub fn apply_wal_operations(state: &AppState, operations: &[WalOperation]) {
    for op in operations {
        match op {
            WalOperation::CreateUser {
                id,
                username,
                email,
                password_hash,
            } => {
                let user = User::new(*id, username.clone(), email.clone(), password_hash.clone());
                if let Err(e) = state.user_store.restore(user) {
                    warn!(
                        user_id = *id,
                        error = %e,
                        "Skipping WAL record that conflicts with an earlier user"
                    );
                }
            }
        }
    }
}
