//! Directory and dashboard data: account listings, counts, store listings.

use std::sync::Arc;

use crate::models::{StoreListing, UserAccount};
use crate::services::{DocumentStore, ServiceError};

#[derive(Debug, Clone, Copy)]
pub struct DirectoryCounts {
    pub users: usize,
    pub admins: usize,
    pub stores: usize,
}

#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn DocumentStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All account documents, split into (admins, everyone else), each
    /// sorted by display name.
    pub async fn list_accounts(
        &self,
    ) -> Result<(Vec<UserAccount>, Vec<UserAccount>), ServiceError> {
        let mut accounts = self
            .store
            .list_accounts()
            .await
            .map_err(ServiceError::Store)?;

        accounts.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        });

        Ok(accounts.into_iter().partition(|a| a.is_admin()))
    }

    pub async fn counts(&self) -> Result<DirectoryCounts, ServiceError> {
        let accounts = self
            .store
            .list_accounts()
            .await
            .map_err(ServiceError::Store)?;
        let stores = self
            .store
            .list_stores()
            .await
            .map_err(ServiceError::Store)?;

        let admins = accounts.iter().filter(|a| a.is_admin()).count();

        Ok(DirectoryCounts {
            users: accounts.len() - admins,
            admins,
            stores: stores.len(),
        })
    }

    /// Remove the account document only; the provider account survives and
    /// the gate rejects it from then on.
    pub async fn delete_account(&self, uid: &str) -> Result<(), ServiceError> {
        let removed = self
            .store
            .delete_account(uid)
            .await
            .map_err(ServiceError::Store)?;

        if !removed {
            return Err(ServiceError::NotFound("User"));
        }

        tracing::info!(uid = %uid, "User deleted");
        Ok(())
    }

    pub async fn list_stores(&self) -> Result<Vec<StoreListing>, ServiceError> {
        let mut stores = self
            .store
            .list_stores()
            .await
            .map_err(ServiceError::Store)?;

        stores.sort_by(|a, b| {
            a.store_name
                .to_lowercase()
                .cmp(&b.store_name.to_lowercase())
        });

        Ok(stores)
    }

    pub async fn update_store(
        &self,
        id: &str,
        store_name: &str,
        opening_time: &str,
        closing_time: &str,
    ) -> Result<(), ServiceError> {
        let matched = self
            .store
            .update_store(id, store_name, opening_time, closing_time)
            .await
            .map_err(ServiceError::Store)?;

        if !matched {
            return Err(ServiceError::NotFound("Store"));
        }

        tracing::info!(store_id = %id, "Store updated");
        Ok(())
    }

    pub async fn delete_store(&self, id: &str) -> Result<(), ServiceError> {
        let removed = self
            .store
            .delete_store(id)
            .await
            .map_err(ServiceError::Store)?;

        if !removed {
            return Err(ServiceError::NotFound("Store"));
        }

        tracing::info!(store_id = %id, "Store deleted");
        Ok(())
    }
}
