// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live directory and unread state for one client.
//!
//! The [`SyncManager`] combines a bulk fetch with two change-feed
//! subscriptions:
//! - the directory subscription watches every profile change and answers
//!   each one with a full re-fetch-and-replace,
//! - the inbox subscription watches message inserts addressed to the
//!   current user and bumps the unread counter once per insert.
//!
//! The inbox subscription is keyed by user id. Changing the key tears the
//! old subscription down before the new one is acquired.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use waypin_core::WaypinError;
use waypin_core::types::{
    ChangeEvent, ChangeFilter, ChangeKind, Collection, InboxMessage, MemberPin, ProfilePatch,
};

use crate::client::{BackendClient, validate_patch};
use crate::subscription::{ChangeHandler, SubscriptionSlot, SubscriptionState};
use crate::unread::UnreadCounter;

const DIRECTORY_KEY: &str = "directory";

/// Authoritative fetches tried before settling for the larger value.
const SEED_ATTEMPTS: usize = 3;

/// Seed `unread` from the authoritative count without dropping an insert the
/// feed counted while the fetch was in flight.
///
/// An insert committed before the fetch whose event arrives after the seed is
/// still counted twice until the next authoritative count.
async fn seed_unread(client: &BackendClient, user_id: &str, unread: &UnreadCounter) -> u64 {
    for _ in 0..SEED_ATTEMPTS {
        let mark = unread.mark();
        let count = client.load_unread_count(user_id).await;
        if unread.set_unless_bumped(count, mark) {
            return count;
        }
        debug!(user_id, "insert counted during unread fetch, fetching again");
    }
    let count = client.load_unread_count(user_id).await;
    unread.raise_to(count);
    unread.get()
}

/// Re-fetches the whole directory on any profile change.
struct DirectoryRefresh {
    client: Arc<BackendClient>,
    pins: Arc<watch::Sender<Vec<MemberPin>>>,
}

impl DirectoryRefresh {
    async fn refresh(&self) {
        let pins = self.client.load_directory().await;
        debug!(count = pins.len(), "directory replaced");
        self.pins.send_replace(pins);
    }
}

#[async_trait]
impl ChangeHandler for DirectoryRefresh {
    async fn on_change(&self, event: ChangeEvent) {
        debug!(kind = %event.kind, "profile changed");
        self.refresh().await;
    }

    async fn on_lagged(&self, _skipped: u64) {
        self.refresh().await;
    }
}

/// Counts inserts addressed to one user. The payload is not inspected.
struct InboxCounter {
    client: Arc<BackendClient>,
    user_id: String,
    unread: UnreadCounter,
}

#[async_trait]
impl ChangeHandler for InboxCounter {
    async fn on_change(&self, _event: ChangeEvent) {
        self.unread.increment();
    }

    async fn on_lagged(&self, _skipped: u64) {
        // Missed inserts cannot be counted; re-derive instead.
        seed_unread(&self.client, &self.user_id, &self.unread).await;
    }
}

pub struct SyncManager {
    client: Arc<BackendClient>,
    pins: Arc<watch::Sender<Vec<MemberPin>>>,
    unread: UnreadCounter,
    directory_slot: Mutex<SubscriptionSlot>,
    inbox_slot: Mutex<SubscriptionSlot>,
    directory_state: watch::Receiver<SubscriptionState>,
    inbox_state: watch::Receiver<SubscriptionState>,
}

impl SyncManager {
    pub fn new(client: Arc<BackendClient>) -> Self {
        let (pins, _) = watch::channel(Vec::new());
        let directory_slot = SubscriptionSlot::new(client.feed());
        let inbox_slot = SubscriptionSlot::new(client.feed());
        Self {
            directory_state: directory_slot.watch(),
            inbox_state: inbox_slot.watch(),
            client,
            pins: Arc::new(pins),
            unread: UnreadCounter::new(),
            directory_slot: Mutex::new(directory_slot),
            inbox_slot: Mutex::new(inbox_slot),
        }
    }

    pub fn client(&self) -> &Arc<BackendClient> {
        &self.client
    }

    /// Subscribe to profile changes and load the directory.
    ///
    /// Independent of any session. Calling it again re-subscribes.
    pub async fn start(&self) -> Result<(), WaypinError> {
        let refresh = Arc::new(DirectoryRefresh {
            client: self.client.clone(),
            pins: self.pins.clone(),
        });
        {
            let mut slot = self.directory_slot.lock().await;
            slot.acquire(
                DIRECTORY_KEY,
                ChangeFilter::all(Collection::Profiles),
                refresh.clone(),
            )
            .await?;
        }
        // Subscribed first, so nothing committed after this fetch is missed.
        refresh.refresh().await;
        info!("directory sync started");
        Ok(())
    }

    /// Re-fetch and replace the directory now.
    pub async fn refresh_directory(&self) {
        let pins = self.client.load_directory().await;
        self.pins.send_replace(pins);
    }

    /// Re-key the inbox subscription to `user_id`.
    ///
    /// The previous subscription is always released first. `None` only
    /// tears down. Re-keying to the current user is a no-op unless the
    /// subscription has failed.
    pub async fn set_user(&self, user_id: Option<&str>) -> Result<(), WaypinError> {
        let mut slot = self.inbox_slot.lock().await;
        if slot.key() == user_id && slot.state() != SubscriptionState::Error {
            return Ok(());
        }

        slot.release().await;
        self.unread.reset();
        let Some(user_id) = user_id else {
            debug!("inbox subscription released");
            return Ok(());
        };

        let counter = Arc::new(InboxCounter {
            client: self.client.clone(),
            user_id: user_id.to_string(),
            unread: self.unread.clone(),
        });
        slot.acquire(
            user_id,
            ChangeFilter::all(Collection::Messages)
                .kind(ChangeKind::Insert)
                .column_eq("receiver_id", user_id),
            counter,
        )
        .await?;

        let count = seed_unread(&self.client, user_id, &self.unread).await;
        info!(user_id, unread = count, "inbox sync keyed to user");
        Ok(())
    }

    /// Re-key the inbox subscription to whoever the client is signed in as.
    pub async fn sync_session(&self) -> Result<(), WaypinError> {
        let user_id = self.client.current_user_id().await;
        self.set_user(user_id.as_deref()).await
    }

    /// Load the inbox, mark its unread messages read, and reset the counter.
    pub async fn open_inbox(&self) -> Result<Vec<InboxMessage>, WaypinError> {
        let user_id = self
            .client
            .current_user_id()
            .await
            .ok_or(WaypinError::Unauthenticated)?;

        let mut inbox = self.client.load_inbox(&user_id).await;
        let unread: Vec<String> = inbox
            .iter()
            .filter(|entry| !entry.message.read)
            .map(|entry| entry.message.id.clone())
            .collect();

        if !unread.is_empty() {
            match self.client.mark_read(&unread).await {
                Ok(_) => inbox.iter_mut().for_each(|entry| entry.message.read = true),
                Err(e) => warn!(user_id = %user_id, error = %e, "failed to mark inbox read"),
            }
        }
        self.unread.reset();
        Ok(inbox)
    }

    /// Edit the current user's pin: applied locally first, then sent.
    ///
    /// A failed update leaves the local edit in place until the next
    /// directory refresh replaces it.
    pub async fn edit_my_pin(&self, pin_id: &str, patch: ProfilePatch) -> Result<u64, WaypinError> {
        let user_id = self
            .client
            .current_user_id()
            .await
            .ok_or(WaypinError::Unauthenticated)?;
        validate_patch(&patch)?;

        self.pins.send_if_modified(|pins| {
            match pins
                .iter_mut()
                .find(|pin| pin.id == pin_id && pin.user_id == user_id)
            {
                Some(pin) => {
                    patch.apply_to(pin);
                    true
                }
                None => false,
            }
        });

        match self.client.update_own_profile(pin_id, &patch).await {
            Ok(affected) => Ok(affected),
            Err(e) => {
                warn!(pin_id, error = %e, "pin edit not confirmed, local edit kept");
                Err(e)
            }
        }
    }

    /// Release both subscriptions.
    pub async fn shutdown(&self) {
        self.inbox_slot.lock().await.release().await;
        self.directory_slot.lock().await.release().await;
        info!("sync manager stopped");
    }

    // --- Observation ---

    pub fn directory(&self) -> Vec<MemberPin> {
        self.pins.borrow().clone()
    }

    pub fn watch_directory(&self) -> watch::Receiver<Vec<MemberPin>> {
        self.pins.subscribe()
    }

    pub fn unread_count(&self) -> u64 {
        self.unread.get()
    }

    pub fn watch_unread(&self) -> watch::Receiver<u64> {
        self.unread.subscribe()
    }

    pub fn directory_state(&self) -> SubscriptionState {
        *self.directory_state.borrow()
    }

    pub fn inbox_state(&self) -> SubscriptionState {
        *self.inbox_state.borrow()
    }

    pub fn watch_inbox_state(&self) -> watch::Receiver<SubscriptionState> {
        self.inbox_state.clone()
    }
}
