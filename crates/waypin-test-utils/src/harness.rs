// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete local backend: temp SQLite database,
//! change feed, auth and a temp avatar directory. Every client it hands out
//! talks to that same backend, so one test can play several users.

use std::sync::Arc;

use waypin_bus::EventBus;
use waypin_config::model::{StorageConfig, SyncConfig, WaypinConfig};
use waypin_core::types::{NewProfile, Profile};
use waypin_core::{StorageAdapter, WaypinError};
use waypin_storage::{FsAvatarStore, SqliteStorage};
use waypin_sync::{BackendClient, SyncManager};

/// Password used by [`TestHarness::signed_in`].
pub const TEST_PASSWORD: &str = "correct horse";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    event_buffer: usize,
    avatar_base_url: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            event_buffer: 64,
            avatar_base_url: "http://avatars.test".to_string(),
        }
    }

    /// Per-subscriber change buffer. Small values make lag easy to provoke.
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    pub fn with_avatar_base_url(mut self, url: &str) -> Self {
        self.avatar_base_url = url.to_string();
        self
    }

    /// Build the harness, opening and migrating a fresh database.
    pub async fn build(self) -> Result<TestHarness, WaypinError> {
        let temp_dir = tempfile::TempDir::new().map_err(WaypinError::storage)?;
        let storage_config = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
            avatar_dir: temp_dir.path().join("avatars").to_string_lossy().to_string(),
            avatar_base_url: self.avatar_base_url,
        };

        let bus = EventBus::new(self.event_buffer);
        let storage = SqliteStorage::new(storage_config.clone(), bus.clone());
        storage.initialize().await?;
        let avatars = FsAvatarStore::from_config(&storage_config);

        let config = WaypinConfig {
            storage: storage_config,
            sync: SyncConfig {
                event_buffer: self.event_buffer,
                ..Default::default()
            },
            ..Default::default()
        };

        Ok(TestHarness {
            storage: Arc::new(storage),
            avatars: Arc::new(avatars),
            bus,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete local backend with temp storage.
pub struct TestHarness {
    /// SQLite storage and auth (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Avatar store rooted in the temp directory.
    pub avatars: Arc<FsAvatarStore>,
    /// The change feed storage publishes to.
    pub bus: EventBus,
    /// Configuration matching the harness paths.
    pub config: WaypinConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default options.
    pub async fn new() -> Result<Self, WaypinError> {
        Self::builder().build().await
    }

    /// An anonymous client against this backend.
    pub fn client(&self) -> Arc<BackendClient> {
        Arc::new(BackendClient::new(
            self.storage.clone(),
            self.storage.clone(),
            self.avatars.clone(),
            Arc::new(self.bus.clone()),
        ))
    }

    /// A client signed up as `email` with [`TEST_PASSWORD`].
    pub async fn signed_in(&self, email: &str) -> Result<Arc<BackendClient>, WaypinError> {
        let client = self.client();
        client.sign_up(email, TEST_PASSWORD).await?;
        Ok(client)
    }

    /// A sync manager over `client`. Not started.
    pub fn manager(&self, client: Arc<BackendClient>) -> SyncManager {
        SyncManager::new(client)
    }

    /// Create a profile for `client`'s user at the given city.
    pub async fn add_profile(
        &self,
        client: &BackendClient,
        username: &str,
        city: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Profile, WaypinError> {
        client
            .create_profile(NewProfile {
                username: username.to_string(),
                city: city.to_string(),
                latitude,
                longitude,
                ..Default::default()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::new().await.unwrap();
        assert!(harness.storage.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn signed_in_client_has_session() {
        let harness = TestHarness::new().await.unwrap();
        let client = harness.signed_in("ana@example.com").await.unwrap();
        let session = client.session().await.unwrap();
        assert_eq!(client.current_user_id().await, Some(session.user_id));
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::new().await.unwrap();
        let h2 = TestHarness::new().await.unwrap();

        let client = h1.signed_in("ana@example.com").await.unwrap();
        h1.add_profile(&client, "ana", "Lisbon", 38.7, -9.1)
            .await
            .unwrap();

        assert_eq!(h1.storage.list_profiles().await.unwrap().len(), 1);
        assert!(h2.storage.list_profiles().await.unwrap().is_empty());
    }
}
