// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the Waypin client.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Auth,
    Blob,
    ChangeFeed,
    Geocoder,
}

// --- Geocoding ---

/// One candidate location returned by a geocode query.
///
/// Always latitude-then-longitude. Providers that emit the other axis order
/// must swap before constructing this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

// --- Profiles ---

/// A stored profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: Option<String>,
    pub return_date: Option<String>,
    pub created_at: String,
}

/// Fields supplied by the "add profile" flow. Owner and id are assigned by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub username: String,
    pub avatar_url: Option<String>,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: Option<String>,
    pub return_date: Option<String>,
}

/// A partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<String>,
    pub return_date: Option<String>,
}

impl ProfilePatch {
    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to a directory pin in place.
    ///
    /// `username` lands in the pin's display name; absent fields are untouched.
    pub fn apply_to(&self, pin: &mut MemberPin) {
        if let Some(username) = &self.username {
            pin.name = username.clone();
        }
        if let Some(avatar_url) = &self.avatar_url {
            pin.avatar_url = Some(avatar_url.clone());
        }
        if let Some(city) = &self.city {
            pin.city = city.clone();
        }
        if let Some(latitude) = self.latitude {
            pin.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            pin.longitude = longitude;
        }
        if let Some(status) = &self.status {
            pin.status = status.clone();
        }
        if let Some(return_date) = &self.return_date {
            pin.return_date = return_date.clone();
        }
    }
}

/// Map-display projection of a [`Profile`].
///
/// Replaced wholesale on every directory refresh; patched locally only by
/// optimistic edits of the current user's own pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberPin {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
    pub return_date: String,
    pub avatar_url: Option<String>,
}

impl From<Profile> for MemberPin {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            name: profile.username,
            city: profile.city,
            latitude: profile.latitude,
            longitude: profile.longitude,
            status: profile.status.unwrap_or_default(),
            return_date: profile.return_date.unwrap_or_default(),
            avatar_url: profile.avatar_url,
        }
    }
}

// --- Messages ---

/// A direct message row. Immutable after creation except for `read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub read: bool,
    pub created_at: String,
}

/// Sender details denormalized onto an inbox entry at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSnapshot {
    pub username: String,
    pub avatar_url: Option<String>,
}

/// A message as shown in the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub message: Message,
    /// `None` when the sender has no profile.
    pub sender: Option<SenderSnapshot>,
}

// --- Auth ---

/// An authenticated session issued by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub created_at: String,
}

// --- Change feed ---

/// A collection that emits change events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Profiles,
    Messages,
}

/// The kind of row change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A committed row change in a watched collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: String,
    pub collection: Collection,
    pub kind: ChangeKind,
    /// The new row for inserts and updates, the old row for deletes.
    pub record: serde_json::Value,
    pub committed_at: String,
}

/// Subscription filter: one collection, optionally one kind, optionally one
/// column-equality predicate on the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub collection: Collection,
    pub kind: Option<ChangeKind>,
    pub column_eq: Option<(String, String)>,
}

impl ChangeFilter {
    /// Every change in `collection`.
    pub fn all(collection: Collection) -> Self {
        Self {
            collection,
            kind: None,
            column_eq: None,
        }
    }

    /// Restrict to one change kind.
    pub fn kind(mut self, kind: ChangeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict to records whose `column` equals `value`.
    pub fn column_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.column_eq = Some((column.into(), value.into()));
        self
    }

    /// Whether `event` passes this filter.
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.collection != self.collection {
            return false;
        }
        if let Some(kind) = self.kind
            && event.kind != kind
        {
            return false;
        }
        match &self.column_eq {
            Some((column, value)) => event
                .record
                .get(column)
                .and_then(|v| v.as_str())
                .is_some_and(|v| v == value),
            None => true,
        }
    }
}

/// One item delivered on a change stream.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    /// A matching change.
    Change(ChangeEvent),
    /// The subscriber fell behind and this many events were dropped.
    Lagged(u64),
}
