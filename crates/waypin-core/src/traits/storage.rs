// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the `profiles` and `messages` collections.

use async_trait::async_trait;

use crate::error::WaypinError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Message, Profile, ProfilePatch};

/// Row-oriented data store.
///
/// Mutations that name an owner are constrained to rows owned by that user;
/// a mismatched owner affects zero rows rather than failing.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), WaypinError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), WaypinError>;

    // --- Profiles ---

    /// All profiles, ordered by creation time ascending.
    async fn list_profiles(&self) -> Result<Vec<Profile>, WaypinError>;

    /// The profile owned by `user_id`, if any.
    async fn get_profile_by_user(&self, user_id: &str) -> Result<Option<Profile>, WaypinError>;

    /// Profiles owned by any of `user_ids`.
    async fn get_profiles_by_users(&self, user_ids: &[String])
    -> Result<Vec<Profile>, WaypinError>;

    /// Inserts a new profile row.
    async fn insert_profile(&self, profile: &Profile) -> Result<(), WaypinError>;

    /// Applies `patch` to profile `id` if owned by `owner_id`. Returns rows affected.
    async fn update_profile(
        &self,
        owner_id: &str,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<u64, WaypinError>;

    /// Deletes profile `id` if owned by `owner_id`. Returns rows affected.
    async fn delete_profile(&self, owner_id: &str, id: &str) -> Result<u64, WaypinError>;

    // --- Messages ---

    /// Inserts a new message row.
    async fn insert_message(&self, message: &Message) -> Result<(), WaypinError>;

    /// Messages addressed to `receiver_id`, newest first.
    async fn get_messages_for_receiver(
        &self,
        receiver_id: &str,
    ) -> Result<Vec<Message>, WaypinError>;

    /// Number of unread messages addressed to `receiver_id`.
    async fn count_unread(&self, receiver_id: &str) -> Result<u64, WaypinError>;

    /// Sets the read flag on the given messages addressed to `receiver_id`.
    ///
    /// Returns the number of false-to-true transitions; already-read ids
    /// contribute zero.
    async fn mark_read(&self, receiver_id: &str, ids: &[String]) -> Result<u64, WaypinError>;
}
