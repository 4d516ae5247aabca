// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicitly constructed handle to the backend.
//!
//! A [`BackendClient`] owns its adapters and at most one signed-in session.
//! Components receive it by reference; there is no process-wide instance.
//!
//! Read paths for the current user's own data never fail: errors are logged
//! at `warn` and folded into an empty, absent or zero result. Mutations
//! surface their errors to the caller.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use waypin_core::types::{
    InboxMessage, MemberPin, Message, NewProfile, Profile, ProfilePatch, SenderSnapshot, Session,
};
use waypin_core::{AuthAdapter, BlobAdapter, ChangeFeed, StorageAdapter, WaypinError};

/// Longest accepted avatar file extension.
const MAX_EXTENSION_LEN: usize = 8;

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub struct BackendClient {
    storage: Arc<dyn StorageAdapter>,
    auth: Arc<dyn AuthAdapter>,
    blobs: Arc<dyn BlobAdapter>,
    feed: Arc<dyn ChangeFeed>,
    session: RwLock<Option<Session>>,
}

impl BackendClient {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        auth: Arc<dyn AuthAdapter>,
        blobs: Arc<dyn BlobAdapter>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            storage,
            auth,
            blobs,
            feed,
            session: RwLock::new(None),
        }
    }

    /// The change feed subscriptions are opened against.
    pub fn feed(&self) -> Arc<dyn ChangeFeed> {
        self.feed.clone()
    }

    // --- Session ---

    /// Register and sign in. Replaces any current session.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, WaypinError> {
        let session = self.auth.sign_up(email, password).await?;
        info!(user_id = %session.user_id, "signed up");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Sign in with existing credentials. Replaces any current session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, WaypinError> {
        let session = self.auth.sign_in(email, password).await?;
        info!(user_id = %session.user_id, "signed in");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Drop the local session and revoke its token. Signing out twice is a no-op.
    pub async fn sign_out(&self) -> Result<(), WaypinError> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };
        self.auth.sign_out(&session.token).await?;
        info!(user_id = %session.user_id, "signed out");
        Ok(())
    }

    /// The locally held session, without checking it against the backend.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// The signed-in user, confirmed by the auth backend.
    ///
    /// A token the backend no longer recognizes clears the local session.
    pub async fn current_user_id(&self) -> Option<String> {
        let token = self.session.read().await.as_ref()?.token.clone();
        match self.auth.current_user(&token).await {
            Ok(Some(user_id)) => Some(user_id),
            Ok(None) => {
                debug!("session no longer valid, clearing");
                let mut session = self.session.write().await;
                if session.as_ref().is_some_and(|s| s.token == token) {
                    *session = None;
                }
                None
            }
            Err(e) => {
                warn!(error = %e, "current user lookup failed");
                None
            }
        }
    }

    async fn require_user(&self) -> Result<String, WaypinError> {
        self.current_user_id()
            .await
            .ok_or(WaypinError::Unauthenticated)
    }

    // --- Reads ---

    /// Every profile as a map pin, oldest first. Empty on failure.
    pub async fn load_directory(&self) -> Vec<MemberPin> {
        match self.storage.list_profiles().await {
            Ok(profiles) => profiles.into_iter().map(MemberPin::from).collect(),
            Err(e) => {
                warn!(error = %e, "failed to load directory");
                Vec::new()
            }
        }
    }

    /// The pin owned by `user_id`. Absent when there is none or on failure.
    pub async fn load_my_profile(&self, user_id: &str) -> Option<MemberPin> {
        match self.storage.get_profile_by_user(user_id).await {
            Ok(profile) => profile.map(MemberPin::from),
            Err(e) => {
                warn!(user_id, error = %e, "failed to load own profile");
                None
            }
        }
    }

    /// Authoritative unread count for `user_id`. Zero on failure.
    pub async fn load_unread_count(&self, user_id: &str) -> u64 {
        match self.storage.count_unread(user_id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(user_id, error = %e, "failed to count unread messages");
                0
            }
        }
    }

    /// Messages addressed to `user_id`, newest first, each with a snapshot of
    /// its sender's profile. Empty on failure.
    pub async fn load_inbox(&self, user_id: &str) -> Vec<InboxMessage> {
        match self.try_load_inbox(user_id).await {
            Ok(inbox) => inbox,
            Err(e) => {
                warn!(user_id, error = %e, "failed to load inbox");
                Vec::new()
            }
        }
    }

    async fn try_load_inbox(&self, user_id: &str) -> Result<Vec<InboxMessage>, WaypinError> {
        let messages = self.storage.get_messages_for_receiver(user_id).await?;
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let sender_ids: Vec<String> = {
            let mut seen = HashSet::new();
            messages
                .iter()
                .filter(|m| seen.insert(m.sender_id.as_str()))
                .map(|m| m.sender_id.clone())
                .collect()
        };

        let senders: HashMap<String, SenderSnapshot> = self
            .storage
            .get_profiles_by_users(&sender_ids)
            .await?
            .into_iter()
            .map(|p| {
                (
                    p.user_id,
                    SenderSnapshot {
                        username: p.username,
                        avatar_url: p.avatar_url,
                    },
                )
            })
            .collect();

        Ok(messages
            .into_iter()
            .map(|message| InboxMessage {
                sender: senders.get(&message.sender_id).cloned(),
                message,
            })
            .collect())
    }

    // --- Mutations ---

    /// Send a direct message from the signed-in user.
    pub async fn send_message(
        &self,
        receiver_id: &str,
        content: &str,
    ) -> Result<Message, WaypinError> {
        let sender_id = self.require_user().await?;
        if receiver_id.trim().is_empty() {
            return Err(WaypinError::Validation("receiver is required".into()));
        }
        if content.trim().is_empty() {
            return Err(WaypinError::Validation("message must not be empty".into()));
        }

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id,
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            read: false,
            created_at: now(),
        };
        self.storage.insert_message(&message).await?;
        debug!(message_id = %message.id, receiver_id, "message sent");
        Ok(message)
    }

    /// Mark messages addressed to the signed-in user as read.
    ///
    /// Returns how many actually changed; already-read ids are skipped.
    pub async fn mark_read(&self, ids: &[String]) -> Result<u64, WaypinError> {
        let user_id = self.require_user().await?;
        if ids.is_empty() {
            return Ok(0);
        }
        let changed = self.storage.mark_read(&user_id, ids).await?;
        debug!(user_id = %user_id, requested = ids.len(), changed, "marked read");
        Ok(changed)
    }

    /// Create the signed-in user's profile. Each user owns at most one.
    pub async fn create_profile(&self, new: NewProfile) -> Result<Profile, WaypinError> {
        let user_id = self.require_user().await?;
        if new.username.trim().is_empty() {
            return Err(WaypinError::Validation("username is required".into()));
        }
        validate_coordinates(Some(new.latitude), Some(new.longitude))?;

        if self.storage.get_profile_by_user(&user_id).await?.is_some() {
            return Err(WaypinError::Validation(
                "a profile already exists for this user".into(),
            ));
        }

        let profile = Profile {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            username: new.username,
            avatar_url: new.avatar_url,
            city: new.city,
            latitude: new.latitude,
            longitude: new.longitude,
            status: new.status,
            return_date: new.return_date,
            created_at: now(),
        };
        self.storage.insert_profile(&profile).await?;
        info!(profile_id = %profile.id, user_id = %profile.user_id, "profile created");
        Ok(profile)
    }

    /// Apply `patch` to profile `id`, restricted to rows the signed-in user owns.
    ///
    /// Returns rows affected: zero when `id` belongs to someone else.
    pub async fn update_own_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> Result<u64, WaypinError> {
        let user_id = self.require_user().await?;
        validate_patch(patch)?;
        if patch.is_empty() {
            return Ok(0);
        }

        let affected = self.storage.update_profile(&user_id, id, patch).await?;
        if affected == 0 {
            warn!(user_id = %user_id, profile_id = id, "profile update matched no owned row");
        }
        Ok(affected)
    }

    /// Delete profile `id`, restricted to rows the signed-in user owns.
    pub async fn delete_own_profile(&self, id: &str) -> Result<u64, WaypinError> {
        let user_id = self.require_user().await?;
        let affected = self.storage.delete_profile(&user_id, id).await?;
        if affected == 0 {
            warn!(user_id = %user_id, profile_id = id, "profile delete matched no owned row");
        }
        Ok(affected)
    }

    /// Store an avatar image and return its public URL.
    ///
    /// Objects are named `{user_id}-{random}.{ext}` and never overwritten.
    pub async fn upload_avatar(&self, bytes: &[u8], extension: &str) -> Result<String, WaypinError> {
        let user_id = self.require_user().await?;
        if bytes.is_empty() {
            return Err(WaypinError::Validation("avatar is empty".into()));
        }
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if extension.is_empty()
            || extension.len() > MAX_EXTENSION_LEN
            || !extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(WaypinError::Validation(format!(
                "unsupported avatar extension: {extension:?}"
            )));
        }

        let name = format!("{user_id}-{}.{extension}", uuid::Uuid::new_v4().simple());
        self.blobs.put_object(&name, bytes).await?;
        debug!(user_id = %user_id, object = %name, size = bytes.len(), "avatar uploaded");
        Ok(self.blobs.public_url(&name))
    }
}

/// Field checks shared by profile updates and optimistic pin edits.
pub(crate) fn validate_patch(patch: &ProfilePatch) -> Result<(), WaypinError> {
    if patch
        .username
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(WaypinError::Validation("username must not be empty".into()));
    }
    validate_coordinates(patch.latitude, patch.longitude)
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), WaypinError> {
    if let Some(lat) = latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        return Err(WaypinError::Validation(format!(
            "latitude out of range: {lat}"
        )));
    }
    if let Some(lon) = longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        return Err(WaypinError::Validation(format!(
            "longitude out of range: {lon}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_inside_range_pass() {
        assert!(validate_coordinates(Some(18.79), Some(98.98)).is_ok());
        assert!(validate_coordinates(Some(-90.0), Some(180.0)).is_ok());
        assert!(validate_coordinates(None, None).is_ok());
    }

    #[test]
    fn coordinates_outside_range_fail() {
        assert!(matches!(
            validate_coordinates(Some(98.98), Some(18.79)),
            Err(WaypinError::Validation(_))
        ));
        assert!(validate_coordinates(None, Some(-180.5)).is_err());
        assert!(validate_coordinates(Some(f64::NAN), None).is_err());
    }

    #[test]
    fn blank_username_patch_is_rejected() {
        let patch = ProfilePatch {
            username: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(validate_patch(&patch), Err(WaypinError::Validation(_))));
        assert!(validate_patch(&ProfilePatch::default()).is_ok());
    }
}
