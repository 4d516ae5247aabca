// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use waypin_bus::EventBus;
use waypin_config::model::StorageConfig;
use waypin_core::types::{ChangeKind, Collection, Message, Profile, ProfilePatch};
use waypin_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, WaypinError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`]. Each committed write is published
/// on the [`EventBus`] after the statement returns.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
    bus: EventBus,
}

impl SqliteStorage {
    /// Create a new SqliteStorage publishing changes on `bus`.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig, bus: EventBus) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            bus,
        }
    }

    /// The change feed this store publishes to.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub(crate) fn db(&self) -> Result<&Database, WaypinError> {
        self.db.get().ok_or_else(|| WaypinError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    fn publish<T: Serialize>(&self, collection: Collection, kind: ChangeKind, row: &T) {
        match serde_json::to_value(row) {
            Ok(record) => self.bus.emit_change(collection, kind, record),
            Err(e) => warn!(%collection, %kind, error = %e, "change record not serializable"),
        }
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WaypinError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WaypinError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        self.bus.close();
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WaypinError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WaypinError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WaypinError> {
        self.db()?.checkpoint().await
    }

    // --- Profiles ---

    async fn list_profiles(&self) -> Result<Vec<Profile>, WaypinError> {
        queries::profiles::list_profiles(self.db()?).await
    }

    async fn get_profile_by_user(&self, user_id: &str) -> Result<Option<Profile>, WaypinError> {
        queries::profiles::get_profile_by_user(self.db()?, user_id).await
    }

    async fn get_profiles_by_users(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<Profile>, WaypinError> {
        queries::profiles::get_profiles_by_users(self.db()?, user_ids).await
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), WaypinError> {
        queries::profiles::insert_profile(self.db()?, profile).await?;
        self.publish(Collection::Profiles, ChangeKind::Insert, profile);
        Ok(())
    }

    async fn update_profile(
        &self,
        owner_id: &str,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<u64, WaypinError> {
        match queries::profiles::update_profile(self.db()?, owner_id, id, patch).await? {
            Some(updated) => {
                self.publish(Collection::Profiles, ChangeKind::Update, &updated);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_profile(&self, owner_id: &str, id: &str) -> Result<u64, WaypinError> {
        match queries::profiles::delete_profile(self.db()?, owner_id, id).await? {
            Some(deleted) => {
                self.publish(Collection::Profiles, ChangeKind::Delete, &deleted);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    // --- Messages ---

    async fn insert_message(&self, message: &Message) -> Result<(), WaypinError> {
        queries::messages::insert_message(self.db()?, message).await?;
        self.publish(Collection::Messages, ChangeKind::Insert, message);
        Ok(())
    }

    async fn get_messages_for_receiver(
        &self,
        receiver_id: &str,
    ) -> Result<Vec<Message>, WaypinError> {
        queries::messages::get_messages_for_receiver(self.db()?, receiver_id).await
    }

    async fn count_unread(&self, receiver_id: &str) -> Result<u64, WaypinError> {
        queries::messages::count_unread(self.db()?, receiver_id).await
    }

    async fn mark_read(&self, receiver_id: &str, ids: &[String]) -> Result<u64, WaypinError> {
        let transitioned = queries::messages::mark_read(self.db()?, receiver_id, ids).await?;
        for message in &transitioned {
            self.publish(Collection::Messages, ChangeKind::Update, message);
        }
        Ok(transitioned.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use tempfile::tempdir;
    use waypin_core::ChangeFeed;
    use waypin_core::types::{ChangeFilter, FeedItem};

    async fn setup() -> (SqliteStorage, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").display().to_string(),
            avatar_dir: dir.path().join("avatars").display().to_string(),
            ..Default::default()
        };
        let storage = SqliteStorage::new(config, EventBus::new(16));
        storage.initialize().await.unwrap();
        (storage, dir)
    }

    fn profile(id: &str, user_id: &str) -> Profile {
        Profile {
            id: id.into(),
            user_id: user_id.into(),
            username: user_id.into(),
            avatar_url: None,
            city: "Porto".into(),
            latitude: 41.15,
            longitude: -8.61,
            status: None,
            return_date: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn uninitialized_storage_errors() {
        let storage = SqliteStorage::new(StorageConfig::default(), EventBus::default());
        assert!(matches!(
            storage.list_profiles().await,
            Err(WaypinError::Storage { .. })
        ));
    }

    #[tokio::test]
    async fn double_initialize_errors() {
        let (storage, _dir) = setup().await;
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let (storage, _dir) = setup().await;
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn writes_publish_change_events() {
        let (storage, _dir) = setup().await;
        let mut stream = storage
            .bus()
            .subscribe(ChangeFilter::all(Collection::Profiles))
            .await
            .unwrap();

        storage.insert_profile(&profile("p1", "a")).await.unwrap();
        let patch = ProfilePatch {
            status: Some("away".into()),
            ..Default::default()
        };
        assert_eq!(storage.update_profile("a", "p1", &patch).await.unwrap(), 1);
        assert_eq!(storage.delete_profile("a", "p1").await.unwrap(), 1);

        let mut kinds = Vec::new();
        for _ in 0..3 {
            match tokio::time::timeout(Duration::from_secs(1), stream.next()).await {
                Ok(Some(FeedItem::Change(event))) => {
                    assert_eq!(event.record["id"], "p1");
                    kinds.push(event.kind);
                }
                other => panic!("expected change event, got {other:?}"),
            }
        }
        assert_eq!(
            kinds,
            [ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]
        );
    }

    #[tokio::test]
    async fn non_owner_update_publishes_nothing() {
        let (storage, _dir) = setup().await;
        storage.insert_profile(&profile("p1", "a")).await.unwrap();

        let mut stream = storage
            .bus()
            .subscribe(ChangeFilter::all(Collection::Profiles))
            .await
            .unwrap();
        let patch = ProfilePatch {
            city: Some("Faro".into()),
            ..Default::default()
        };
        assert_eq!(storage.update_profile("b", "p1", &patch).await.unwrap(), 0);
        assert_eq!(storage.delete_profile("b", "p1").await.unwrap(), 0);

        let waited = tokio::time::timeout(Duration::from_millis(100), stream.next()).await;
        assert!(waited.is_err(), "no event expected");
    }

    #[tokio::test]
    async fn mark_read_counts_transitions_only() {
        let (storage, _dir) = setup().await;
        let message = Message {
            id: "m1".into(),
            sender_id: "a".into(),
            receiver_id: "b".into(),
            content: "hi".into(),
            read: false,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        storage.insert_message(&message).await.unwrap();

        assert_eq!(storage.count_unread("b").await.unwrap(), 1);
        assert_eq!(storage.mark_read("b", &["m1".into()]).await.unwrap(), 1);
        assert_eq!(storage.mark_read("b", &["m1".into()]).await.unwrap(), 0);
        assert_eq!(storage.count_unread("b").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn shutdown_closes_the_feed() {
        let (storage, _dir) = setup().await;
        storage.shutdown().await.unwrap();
        assert!(storage.bus().is_closed());
    }
}
