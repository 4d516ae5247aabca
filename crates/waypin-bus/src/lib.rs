// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process change feed.
//!
//! Storage publishes a [`ChangeEvent`] after each committed write. Each
//! subscriber gets its own bounded receiver; a subscriber that falls behind
//! sees a single [`FeedItem::Lagged`] instead of blocking the writer.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use waypin_core::types::{ChangeEvent, ChangeFilter, ChangeKind, Collection, FeedItem};
use waypin_core::{ChangeFeed, ChangeStream, WaypinError};

/// Default per-subscriber buffer.
pub const DEFAULT_CAPACITY: usize = 256;

/// Broadcast bus for committed row changes.
///
/// Cloning is cheap; all clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
    closed: CancellationToken,
}

impl EventBus {
    /// Create a bus where each subscriber may buffer `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            closed: CancellationToken::new(),
        }
    }

    /// Publish an event. Publishing with no subscribers is not an error.
    pub fn emit(&self, event: ChangeEvent) {
        if self.closed.is_cancelled() {
            return;
        }
        trace!(collection = %event.collection, kind = %event.kind, "change emitted");
        let _ = self.sender.send(event);
    }

    /// Build and publish an event for a freshly committed row.
    pub fn emit_change(&self, collection: Collection, kind: ChangeKind, record: serde_json::Value) {
        self.emit(ChangeEvent {
            id: uuid::Uuid::new_v4().to_string(),
            collection,
            kind,
            record,
            committed_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        });
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// End every open stream and refuse new subscriptions.
    pub fn close(&self) {
        debug!("change feed closed");
        self.closed.cancel();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

struct StreamState {
    rx: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
    closed: CancellationToken,
}

#[async_trait]
impl ChangeFeed for EventBus {
    async fn subscribe(&self, filter: ChangeFilter) -> Result<ChangeStream, WaypinError> {
        if self.closed.is_cancelled() {
            return Err(WaypinError::Subscription("change feed is closed".into()));
        }

        // The receiver exists before we return, so every later commit is seen.
        let state = StreamState {
            rx: self.sender.subscribe(),
            filter,
            closed: self.closed.clone(),
        };
        debug!(collection = %state.filter.collection, "change feed subscription opened");

        let stream = futures::stream::unfold(state, |mut state| async move {
            loop {
                let received = tokio::select! {
                    biased;
                    _ = state.closed.cancelled() => return None,
                    received = state.rx.recv() => received,
                };
                match received {
                    Ok(event) if state.filter.matches(&event) => {
                        return Some((FeedItem::Change(event), state));
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        return Some((FeedItem::Lagged(skipped), state));
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    async fn next(stream: &mut ChangeStream) -> Option<FeedItem> {
        tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("stream should yield within a second")
    }

    #[tokio::test]
    async fn delivers_matching_changes_only() {
        let bus = EventBus::new(16);
        let mut stream = bus
            .subscribe(
                ChangeFilter::all(Collection::Messages)
                    .kind(ChangeKind::Insert)
                    .column_eq("receiver_id", "bob"),
            )
            .await
            .unwrap();

        bus.emit_change(Collection::Profiles, ChangeKind::Insert, json!({"receiver_id": "bob"}));
        bus.emit_change(Collection::Messages, ChangeKind::Insert, json!({"receiver_id": "eve"}));
        bus.emit_change(Collection::Messages, ChangeKind::Update, json!({"receiver_id": "bob"}));
        bus.emit_change(
            Collection::Messages,
            ChangeKind::Insert,
            json!({"receiver_id": "bob", "content": "hi"}),
        );

        match next(&mut stream).await {
            Some(FeedItem::Change(event)) => {
                assert_eq!(event.collection, Collection::Messages);
                assert_eq!(event.record["content"], "hi");
            }
            other => panic!("expected change, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn events_before_subscribe_are_not_replayed() {
        let bus = EventBus::new(16);
        bus.emit_change(Collection::Profiles, ChangeKind::Insert, json!({"id": "old"}));

        let mut stream = bus.subscribe(ChangeFilter::all(Collection::Profiles)).await.unwrap();
        bus.emit_change(Collection::Profiles, ChangeKind::Delete, json!({"id": "new"}));

        match next(&mut stream).await {
            Some(FeedItem::Change(event)) => assert_eq!(event.record["id"], "new"),
            other => panic!("expected change, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_subscriber_sees_lag() {
        let bus = EventBus::new(2);
        let mut stream = bus.subscribe(ChangeFilter::all(Collection::Profiles)).await.unwrap();

        for i in 0..5 {
            bus.emit_change(Collection::Profiles, ChangeKind::Update, json!({"n": i}));
        }

        assert_eq!(next(&mut stream).await, Some(FeedItem::Lagged(3)));
        match next(&mut stream).await {
            Some(FeedItem::Change(event)) => assert_eq!(event.record["n"], 3),
            other => panic!("expected change, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_ends_streams_and_refuses_subscribers() {
        let bus = EventBus::default();
        let mut stream = bus.subscribe(ChangeFilter::all(Collection::Messages)).await.unwrap();
        assert_eq!(bus.subscriber_count(), 1);

        bus.close();
        assert!(bus.is_closed());
        assert_eq!(next(&mut stream).await, None);

        let err = bus
            .subscribe(ChangeFilter::all(Collection::Messages))
            .await
            .err()
            .expect("closed bus must refuse subscriptions");
        assert!(matches!(err, WaypinError::Subscription(_)));
    }

    #[tokio::test]
    async fn dropping_stream_releases_receiver() {
        let bus = EventBus::default();
        let stream = bus.subscribe(ChangeFilter::all(Collection::Profiles)).await.unwrap();
        assert_eq!(bus.subscriber_count(), 1);
        drop(stream);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
