// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime sync for the Waypin location board.
//!
//! - [`BackendClient`] is the explicitly constructed backend handle: auth,
//!   directory and inbox reads, and owner-scoped mutations.
//! - [`SyncManager`] keeps the member directory and the unread counter
//!   current by pairing bulk fetches with change-feed subscriptions.
//! - [`SubscriptionSlot`] scopes each subscription to a lifecycle key so a
//!   new one is never opened while the old one is still live.

pub mod client;
pub mod manager;
pub mod subscription;
pub mod unread;

pub use client::BackendClient;
pub use manager::SyncManager;
pub use subscription::{ChangeHandler, ScopedSubscription, SubscriptionSlot, SubscriptionState};
pub use unread::UnreadCounter;
