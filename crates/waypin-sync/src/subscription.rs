// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change-feed subscriptions scoped to a lifecycle key.
//!
//! A [`SubscriptionSlot`] holds at most one live [`ScopedSubscription`].
//! Acquiring under a new key always releases the previous subscription,
//! and waits for its task to exit, before the new one is opened.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use waypin_core::types::{ChangeEvent, ChangeFilter, FeedItem};
use waypin_core::{ChangeFeed, ChangeStream, WaypinError};

/// Lifecycle of one logical subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Nothing is subscribed.
    Unsubscribed,
    /// Waiting for the feed to acknowledge.
    Subscribing,
    /// Acknowledged; changes are being delivered.
    Active,
    /// The subscription failed or the feed went away. Not retried.
    Error,
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionState::Unsubscribed => write!(f, "unsubscribed"),
            SubscriptionState::Subscribing => write!(f, "subscribing"),
            SubscriptionState::Active => write!(f, "active"),
            SubscriptionState::Error => write!(f, "error"),
        }
    }
}

/// Receives the items of one subscription, one at a time and in order.
#[async_trait]
pub trait ChangeHandler: Send + Sync + 'static {
    async fn on_change(&self, event: ChangeEvent);

    /// `skipped` changes were dropped because this subscriber fell behind.
    async fn on_lagged(&self, skipped: u64);
}

/// A live subscription. Dropping it cancels the delivery task.
pub struct ScopedSubscription {
    key: String,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    state: Arc<watch::Sender<SubscriptionState>>,
}

impl ScopedSubscription {
    /// Subscribe and start delivering to `handler`.
    ///
    /// Returns once the feed has acknowledged, so every change committed
    /// afterwards reaches the handler.
    pub async fn open(
        key: &str,
        feed: &Arc<dyn ChangeFeed>,
        filter: ChangeFilter,
        handler: Arc<dyn ChangeHandler>,
        state: Arc<watch::Sender<SubscriptionState>>,
    ) -> Result<Self, WaypinError> {
        state.send_replace(SubscriptionState::Subscribing);
        let stream = match feed.subscribe(filter).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(key, error = %e, "subscription failed");
                state.send_replace(SubscriptionState::Error);
                return Err(e);
            }
        };
        state.send_replace(SubscriptionState::Active);
        debug!(key, "subscription active");

        let token = CancellationToken::new();
        let handle = tokio::spawn(deliver(
            key.to_string(),
            stream,
            handler,
            token.clone(),
            state.clone(),
        ));
        Ok(Self {
            key: key.to_string(),
            token,
            handle: Some(handle),
            state,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stop delivery and wait for the task to finish.
    pub async fn release(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!(key = %self.key, error = %e, "subscription task ended abnormally");
        }
        self.state.send_replace(SubscriptionState::Unsubscribed);
        debug!(key = %self.key, "subscription released");
    }
}

impl Drop for ScopedSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn deliver(
    key: String,
    mut stream: ChangeStream,
    handler: Arc<dyn ChangeHandler>,
    token: CancellationToken,
    state: Arc<watch::Sender<SubscriptionState>>,
) {
    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => {
                state.send_replace(SubscriptionState::Unsubscribed);
                return;
            }
            item = stream.next() => item,
        };
        match item {
            Some(FeedItem::Change(event)) => handler.on_change(event).await,
            Some(FeedItem::Lagged(skipped)) => {
                warn!(key = %key, skipped, "subscription lagged");
                handler.on_lagged(skipped).await;
            }
            None => {
                // No reconnect: the state stays in Error until re-keyed.
                warn!(key = %key, "change feed closed");
                state.send_replace(SubscriptionState::Error);
                return;
            }
        }
    }
}

/// Holder for at most one subscription of a given class.
pub struct SubscriptionSlot {
    feed: Arc<dyn ChangeFeed>,
    state: Arc<watch::Sender<SubscriptionState>>,
    current: Option<ScopedSubscription>,
}

impl SubscriptionSlot {
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        let (state, _) = watch::channel(SubscriptionState::Unsubscribed);
        Self {
            feed,
            state: Arc::new(state),
            current: None,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn watch(&self) -> watch::Receiver<SubscriptionState> {
        self.state.subscribe()
    }

    /// Key of the held subscription, if any.
    pub fn key(&self) -> Option<&str> {
        self.current.as_ref().map(ScopedSubscription::key)
    }

    /// Release whatever is held, then subscribe under `key`.
    pub async fn acquire(
        &mut self,
        key: &str,
        filter: ChangeFilter,
        handler: Arc<dyn ChangeHandler>,
    ) -> Result<(), WaypinError> {
        self.release().await;
        let subscription =
            ScopedSubscription::open(key, &self.feed, filter, handler, self.state.clone()).await?;
        self.current = Some(subscription);
        Ok(())
    }

    /// Release the held subscription, if any. Always ends `Unsubscribed`.
    pub async fn release(&mut self) {
        match self.current.take() {
            Some(subscription) => subscription.release().await,
            None => {
                self.state.send_replace(SubscriptionState::Unsubscribed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use waypin_bus::EventBus;
    use waypin_core::types::{ChangeKind, Collection};

    #[derive(Default)]
    struct Recorder {
        changes: Mutex<Vec<ChangeEvent>>,
        lagged: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl ChangeHandler for Recorder {
        async fn on_change(&self, event: ChangeEvent) {
            self.changes.lock().await.push(event);
        }

        async fn on_lagged(&self, skipped: u64) {
            self.lagged.lock().await.push(skipped);
        }
    }

    async fn eventually<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..100 {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    fn slot(bus: &EventBus) -> SubscriptionSlot {
        SubscriptionSlot::new(Arc::new(bus.clone()))
    }

    #[tokio::test]
    async fn acquire_goes_active_and_delivers() {
        let bus = EventBus::new(16);
        let mut slot = slot(&bus);
        let recorder = Arc::new(Recorder::default());
        assert_eq!(slot.state(), SubscriptionState::Unsubscribed);

        slot.acquire(
            "directory",
            ChangeFilter::all(Collection::Profiles),
            recorder.clone(),
        )
        .await
        .unwrap();
        assert_eq!(slot.state(), SubscriptionState::Active);
        assert_eq!(slot.key(), Some("directory"));

        bus.emit_change(Collection::Profiles, ChangeKind::Insert, json!({"id": "p1"}));
        bus.emit_change(Collection::Messages, ChangeKind::Insert, json!({"id": "m1"}));
        eventually(|| async { recorder.changes.lock().await.len() == 1 }).await;
        assert_eq!(recorder.changes.lock().await[0].record["id"], "p1");
    }

    #[tokio::test]
    async fn rekey_releases_previous_first() {
        let bus = EventBus::new(16);
        let mut slot = slot(&bus);
        let alice = Arc::new(Recorder::default());
        let bob = Arc::new(Recorder::default());
        let filter = |user: &str| {
            ChangeFilter::all(Collection::Messages)
                .kind(ChangeKind::Insert)
                .column_eq("receiver_id", user)
        };

        slot.acquire("alice", filter("alice"), alice.clone()).await.unwrap();
        assert_eq!(bus.subscriber_count(), 1);

        slot.acquire("bob", filter("bob"), bob.clone()).await.unwrap();
        // The old receiver is gone once its task has been joined.
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(slot.key(), Some("bob"));

        bus.emit_change(Collection::Messages, ChangeKind::Insert, json!({"receiver_id": "alice"}));
        bus.emit_change(Collection::Messages, ChangeKind::Insert, json!({"receiver_id": "bob"}));
        eventually(|| async { bob.changes.lock().await.len() == 1 }).await;
        assert!(alice.changes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn release_returns_to_unsubscribed() {
        let bus = EventBus::new(16);
        let mut slot = slot(&bus);
        slot.acquire(
            "directory",
            ChangeFilter::all(Collection::Profiles),
            Arc::new(Recorder::default()),
        )
        .await
        .unwrap();

        slot.release().await;
        assert_eq!(slot.state(), SubscriptionState::Unsubscribed);
        assert_eq!(slot.key(), None);
        assert_eq!(bus.subscriber_count(), 0);

        // Releasing an empty slot is a no-op.
        slot.release().await;
    }

    #[tokio::test]
    async fn closed_feed_moves_to_error_without_reconnect() {
        let bus = EventBus::new(16);
        let mut slot = slot(&bus);
        let mut states = slot.watch();
        slot.acquire(
            "directory",
            ChangeFilter::all(Collection::Profiles),
            Arc::new(Recorder::default()),
        )
        .await
        .unwrap();

        bus.close();
        let state = tokio::time::timeout(
            Duration::from_secs(1),
            states.wait_for(|s| *s == SubscriptionState::Error),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(*state, SubscriptionState::Error);
    }

    #[tokio::test]
    async fn refused_subscription_is_error() {
        let bus = EventBus::new(16);
        bus.close();
        let mut slot = slot(&bus);

        let err = slot
            .acquire(
                "directory",
                ChangeFilter::all(Collection::Profiles),
                Arc::new(Recorder::default()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WaypinError::Subscription(_)));
        assert_eq!(slot.state(), SubscriptionState::Error);
        assert_eq!(slot.key(), None);
    }

    #[tokio::test]
    async fn lag_is_reported_to_handler() {
        let bus = EventBus::new(1);
        let recorder = Arc::new(Recorder::default());
        let feed: Arc<dyn ChangeFeed> = Arc::new(bus.clone());
        let (state, _) = watch::channel(SubscriptionState::Unsubscribed);

        // Subscribe by hand so nothing drains the receiver while we flood it.
        let stream = feed
            .subscribe(ChangeFilter::all(Collection::Profiles))
            .await
            .unwrap();
        for i in 0..4 {
            bus.emit_change(Collection::Profiles, ChangeKind::Update, json!({"n": i}));
        }
        let token = CancellationToken::new();
        let task = tokio::spawn(deliver(
            "directory".into(),
            stream,
            recorder.clone(),
            token.clone(),
            Arc::new(state),
        ));

        eventually(|| async { !recorder.lagged.lock().await.is_empty() }).await;
        assert_eq!(recorder.lagged.lock().await[0], 3);
        token.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn dropping_subscription_stops_delivery() {
        let bus = EventBus::new(16);
        let feed: Arc<dyn ChangeFeed> = Arc::new(bus.clone());
        let (state, _) = watch::channel(SubscriptionState::Unsubscribed);
        let state = Arc::new(state);
        let subscription = ScopedSubscription::open(
            "directory",
            &feed,
            ChangeFilter::all(Collection::Profiles),
            Arc::new(Recorder::default()),
            state.clone(),
        )
        .await
        .unwrap();

        drop(subscription);
        let mut rx = state.subscribe();
        tokio::time::timeout(
            Duration::from_secs(1),
            rx.wait_for(|s| *s == SubscriptionState::Unsubscribed),
        )
        .await
        .unwrap()
        .unwrap();
        eventually(|| async { bus.subscriber_count() == 0 }).await;
    }
}
