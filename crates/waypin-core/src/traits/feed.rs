// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change feed trait for realtime row-change notifications.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::WaypinError;
use crate::types::{ChangeFilter, FeedItem};

/// A live stream of changes. The stream ending means the feed was closed.
pub type ChangeStream = Pin<Box<dyn Stream<Item = FeedItem> + Send>>;

/// Subscribable source of committed row changes.
#[async_trait]
pub trait ChangeFeed: Send + Sync + 'static {
    /// Opens a filtered subscription.
    ///
    /// Returning `Ok` is the backend's acknowledgement: every change committed
    /// after this point that passes `filter` is delivered on the stream.
    async fn subscribe(&self, filter: ChangeFilter) -> Result<ChangeStream, WaypinError>;
}
