//! Document store boundary.
//!
//! Typed per-entity operations over the hosted document database. All
//! default-handling and shape concerns live here; services above only see
//! the tagged models. `MongoStore` is the production backend,
//! `MemoryStore` the in-memory double used by tests and local development.
//!
//! Instants are compared in memory after fetch; no server-side date
//! predicates are issued. The two conditional writes (token consumption,
//! pending-email commit) are the only cross-process guards the workflows
//! rely on.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};

use crate::models::{InviteToken, PendingRegistration, StoreListing, UserAccount};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn health_check(&self) -> Result<(), anyhow::Error>;

    // ==================== Invite tokens ====================

    async fn insert_invite_token(&self, token: &InviteToken) -> Result<(), anyhow::Error>;

    async fn find_invite_token(&self, token: &str) -> Result<Option<InviteToken>, anyhow::Error>;

    /// Mark the token consumed iff it is not already; returns whether this
    /// call won the claim.
    async fn consume_invite_token(&self, token: &str) -> Result<bool, anyhow::Error>;

    /// Compensation for a failed registration: hand the token back.
    async fn release_invite_token(&self, token: &str) -> Result<(), anyhow::Error>;

    // ==================== Pending registrations ====================

    async fn insert_pending(&self, pending: &PendingRegistration) -> Result<(), anyhow::Error>;

    async fn find_pending(&self, id: &str) -> Result<Option<PendingRegistration>, anyhow::Error>;

    async fn delete_pending(&self, id: &str) -> Result<bool, anyhow::Error>;

    /// All pending registrations, newest first.
    async fn list_pending(&self) -> Result<Vec<PendingRegistration>, anyhow::Error>;

    // ==================== User accounts ====================

    async fn find_account(&self, uid: &str) -> Result<Option<UserAccount>, anyhow::Error>;

    /// Insert or fully replace the account document for its uid.
    async fn put_account(&self, account: &UserAccount) -> Result<(), anyhow::Error>;

    /// Returns false when no document matched the uid.
    async fn update_account_role(&self, uid: &str, role: &str) -> Result<bool, anyhow::Error>;

    async fn update_account_display_name(
        &self,
        uid: &str,
        display_name: &str,
    ) -> Result<bool, anyhow::Error>;

    async fn set_pending_email(
        &self,
        uid: &str,
        pending_email: &str,
    ) -> Result<bool, anyhow::Error>;

    /// Commit `email = pending_email` and clear the marker iff the marker
    /// still equals `expected`; returns whether this call performed the
    /// commit.
    async fn commit_pending_email(&self, uid: &str, expected: &str)
        -> Result<bool, anyhow::Error>;

    async fn delete_account(&self, uid: &str) -> Result<bool, anyhow::Error>;

    async fn list_accounts(&self) -> Result<Vec<UserAccount>, anyhow::Error>;

    // ==================== Store listings ====================

    async fn insert_store(&self, store: &StoreListing) -> Result<(), anyhow::Error>;

    async fn find_store(&self, id: &str) -> Result<Option<StoreListing>, anyhow::Error>;

    async fn update_store(
        &self,
        id: &str,
        store_name: &str,
        opening_time: &str,
        closing_time: &str,
    ) -> Result<bool, anyhow::Error>;

    async fn delete_store(&self, id: &str) -> Result<bool, anyhow::Error>;

    async fn list_stores(&self) -> Result<Vec<StoreListing>, anyhow::Error>;
}

// ============================================================================
// MongoDB backend
// ============================================================================

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, anyhow::Error> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            anyhow::Error::new(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), anyhow::Error> {
        tracing::info!("Creating MongoDB indexes for console-service");

        let token_index = IndexModel::builder()
            .keys(doc! { "token": 1 })
            .options(
                IndexOptions::builder()
                    .name("token_lookup".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.invite_tokens().create_index(token_index, None).await?;
        tracing::info!("Created unique index on invite_tokens.token");

        let created_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_order".to_string())
                    .build(),
            )
            .build();
        self.pending_registrations()
            .create_index(created_index, None)
            .await?;
        tracing::info!("Created index on pending_registrations.created_at");

        Ok(())
    }

    fn invite_tokens(&self) -> Collection<InviteToken> {
        self.db.collection("invite_tokens")
    }

    fn pending_registrations(&self) -> Collection<PendingRegistration> {
        self.db.collection("pending_registrations")
    }

    fn users(&self) -> Collection<UserAccount> {
        self.db.collection("users")
    }

    fn stores(&self) -> Collection<StoreListing> {
        self.db.collection("stores")
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    async fn insert_invite_token(&self, token: &InviteToken) -> Result<(), anyhow::Error> {
        self.invite_tokens().insert_one(token, None).await?;
        Ok(())
    }

    async fn find_invite_token(&self, token: &str) -> Result<Option<InviteToken>, anyhow::Error> {
        let found = self
            .invite_tokens()
            .find_one(doc! { "token": token }, None)
            .await?;
        Ok(found)
    }

    async fn consume_invite_token(&self, token: &str) -> Result<bool, anyhow::Error> {
        let result = self
            .invite_tokens()
            .update_one(
                doc! { "token": token, "consumed_at": null },
                doc! { "$set": { "consumed_at": to_bson(&Utc::now())? } },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn release_invite_token(&self, token: &str) -> Result<(), anyhow::Error> {
        self.invite_tokens()
            .update_one(
                doc! { "token": token },
                doc! { "$unset": { "consumed_at": "" } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_pending(&self, pending: &PendingRegistration) -> Result<(), anyhow::Error> {
        self.pending_registrations().insert_one(pending, None).await?;
        Ok(())
    }

    async fn find_pending(&self, id: &str) -> Result<Option<PendingRegistration>, anyhow::Error> {
        let found = self
            .pending_registrations()
            .find_one(doc! { "_id": id }, None)
            .await?;
        Ok(found)
    }

    async fn delete_pending(&self, id: &str) -> Result<bool, anyhow::Error> {
        let result = self
            .pending_registrations()
            .delete_one(doc! { "_id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_pending(&self) -> Result<Vec<PendingRegistration>, anyhow::Error> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let mut cursor = self.pending_registrations().find(doc! {}, options).await?;

        let mut pending = Vec::new();
        while let Some(record) = cursor.try_next().await? {
            pending.push(record);
        }
        Ok(pending)
    }

    async fn find_account(&self, uid: &str) -> Result<Option<UserAccount>, anyhow::Error> {
        let found = self.users().find_one(doc! { "_id": uid }, None).await?;
        Ok(found)
    }

    async fn put_account(&self, account: &UserAccount) -> Result<(), anyhow::Error> {
        self.users()
            .replace_one(
                doc! { "_id": &account.uid },
                account,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn update_account_role(&self, uid: &str, role: &str) -> Result<bool, anyhow::Error> {
        let result = self
            .users()
            .update_one(doc! { "_id": uid }, doc! { "$set": { "role": role } }, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn update_account_display_name(
        &self,
        uid: &str,
        display_name: &str,
    ) -> Result<bool, anyhow::Error> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": uid },
                doc! { "$set": { "display_name": display_name } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_pending_email(
        &self,
        uid: &str,
        pending_email: &str,
    ) -> Result<bool, anyhow::Error> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": uid },
                doc! { "$set": { "pending_email": pending_email } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn commit_pending_email(
        &self,
        uid: &str,
        expected: &str,
    ) -> Result<bool, anyhow::Error> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": uid, "pending_email": expected },
                doc! {
                    "$set": { "email": expected },
                    "$unset": { "pending_email": "" },
                },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn delete_account(&self, uid: &str) -> Result<bool, anyhow::Error> {
        let result = self.users().delete_one(doc! { "_id": uid }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_accounts(&self) -> Result<Vec<UserAccount>, anyhow::Error> {
        let mut cursor = self.users().find(doc! {}, None).await?;
        let mut accounts = Vec::new();
        while let Some(account) = cursor.try_next().await? {
            accounts.push(account);
        }
        Ok(accounts)
    }

    async fn insert_store(&self, store: &StoreListing) -> Result<(), anyhow::Error> {
        self.stores().insert_one(store, None).await?;
        Ok(())
    }

    async fn find_store(&self, id: &str) -> Result<Option<StoreListing>, anyhow::Error> {
        let found = self.stores().find_one(doc! { "_id": id }, None).await?;
        Ok(found)
    }

    async fn update_store(
        &self,
        id: &str,
        store_name: &str,
        opening_time: &str,
        closing_time: &str,
    ) -> Result<bool, anyhow::Error> {
        let result = self
            .stores()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "store_name": store_name,
                    "opening_time": opening_time,
                    "closing_time": closing_time,
                } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_store(&self, id: &str) -> Result<bool, anyhow::Error> {
        let result = self.stores().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_stores(&self) -> Result<Vec<StoreListing>, anyhow::Error> {
        let mut cursor = self.stores().find(doc! {}, None).await?;
        let mut stores = Vec::new();
        while let Some(store) = cursor.try_next().await? {
            stores.push(store);
        }
        Ok(stores)
    }
}

// ============================================================================
// In-memory double
// ============================================================================

/// In-memory store for tests and local development. Per-key entry locking
/// gives the same conditional-write semantics the Mongo backend relies on.
#[derive(Default)]
pub struct MemoryStore {
    invite_tokens: DashMap<String, InviteToken>,
    pending: DashMap<String, PendingRegistration>,
    accounts: DashMap<String, UserAccount>,
    stores: DashMap<String, StoreListing>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }

    async fn insert_invite_token(&self, token: &InviteToken) -> Result<(), anyhow::Error> {
        self.invite_tokens
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_invite_token(&self, token: &str) -> Result<Option<InviteToken>, anyhow::Error> {
        Ok(self.invite_tokens.get(token).map(|t| t.clone()))
    }

    async fn consume_invite_token(&self, token: &str) -> Result<bool, anyhow::Error> {
        match self.invite_tokens.get_mut(token) {
            Some(mut record) if record.consumed_at.is_none() => {
                record.consumed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_invite_token(&self, token: &str) -> Result<(), anyhow::Error> {
        if let Some(mut record) = self.invite_tokens.get_mut(token) {
            record.consumed_at = None;
        }
        Ok(())
    }

    async fn insert_pending(&self, pending: &PendingRegistration) -> Result<(), anyhow::Error> {
        self.pending.insert(pending.id.clone(), pending.clone());
        Ok(())
    }

    async fn find_pending(&self, id: &str) -> Result<Option<PendingRegistration>, anyhow::Error> {
        Ok(self.pending.get(id).map(|p| p.clone()))
    }

    async fn delete_pending(&self, id: &str) -> Result<bool, anyhow::Error> {
        Ok(self.pending.remove(id).is_some())
    }

    async fn list_pending(&self) -> Result<Vec<PendingRegistration>, anyhow::Error> {
        let mut pending: Vec<_> = self.pending.iter().map(|e| e.value().clone()).collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn find_account(&self, uid: &str) -> Result<Option<UserAccount>, anyhow::Error> {
        Ok(self.accounts.get(uid).map(|a| a.clone()))
    }

    async fn put_account(&self, account: &UserAccount) -> Result<(), anyhow::Error> {
        self.accounts.insert(account.uid.clone(), account.clone());
        Ok(())
    }

    async fn update_account_role(&self, uid: &str, role: &str) -> Result<bool, anyhow::Error> {
        match self.accounts.get_mut(uid) {
            Some(mut account) => {
                account.role = role.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_account_display_name(
        &self,
        uid: &str,
        display_name: &str,
    ) -> Result<bool, anyhow::Error> {
        match self.accounts.get_mut(uid) {
            Some(mut account) => {
                account.display_name = display_name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_pending_email(
        &self,
        uid: &str,
        pending_email: &str,
    ) -> Result<bool, anyhow::Error> {
        match self.accounts.get_mut(uid) {
            Some(mut account) => {
                account.pending_email = Some(pending_email.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit_pending_email(
        &self,
        uid: &str,
        expected: &str,
    ) -> Result<bool, anyhow::Error> {
        match self.accounts.get_mut(uid) {
            Some(mut account) if account.pending_email.as_deref() == Some(expected) => {
                account.email = expected.to_string();
                account.pending_email = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_account(&self, uid: &str) -> Result<bool, anyhow::Error> {
        Ok(self.accounts.remove(uid).is_some())
    }

    async fn list_accounts(&self) -> Result<Vec<UserAccount>, anyhow::Error> {
        Ok(self.accounts.iter().map(|e| e.value().clone()).collect())
    }

    async fn insert_store(&self, store: &StoreListing) -> Result<(), anyhow::Error> {
        self.stores.insert(store.id.clone(), store.clone());
        Ok(())
    }

    async fn find_store(&self, id: &str) -> Result<Option<StoreListing>, anyhow::Error> {
        Ok(self.stores.get(id).map(|s| s.clone()))
    }

    async fn update_store(
        &self,
        id: &str,
        store_name: &str,
        opening_time: &str,
        closing_time: &str,
    ) -> Result<bool, anyhow::Error> {
        match self.stores.get_mut(id) {
            Some(mut store) => {
                store.store_name = store_name.to_string();
                store.opening_time = opening_time.to_string();
                store.closing_time = closing_time.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_store(&self, id: &str) -> Result<bool, anyhow::Error> {
        Ok(self.stores.remove(id).is_some())
    }

    async fn list_stores(&self) -> Result<Vec<StoreListing>, anyhow::Error> {
        Ok(self.stores.iter().map(|e| e.value().clone()).collect())
    }
}
