// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounced place search for the "add profile" flow.
//!
//! Each keystroke goes through [`PlaceSearch::input`]. The previous deferred
//! lookup is always cancelled before a new one is scheduled, so at most one
//! lookup is pending and a superseded lookup never publishes its result.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use waypin_config::model::SyncConfig;
use waypin_core::GeocodeProvider;
use waypin_core::types::PlaceCandidate;

/// What the search box should show.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// No query long enough to search.
    Idle,
    /// A lookup is scheduled or in flight.
    Pending { query: String },
    /// Candidates for `query`, possibly none.
    Ready {
        query: String,
        candidates: Vec<PlaceCandidate>,
    },
    /// The lookup for `query` failed.
    Failed { query: String, message: String },
}

struct PendingLookup {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PendingLookup {
    fn cancel(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

struct Shared {
    state: watch::Sender<SearchState>,
    slot: Mutex<Option<PendingLookup>>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Option<PendingLookup>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Single-slot debounced lookup.
pub struct PlaceSearch {
    provider: Arc<dyn GeocodeProvider>,
    debounce: Duration,
    min_chars: usize,
    shared: Arc<Shared>,
}

impl PlaceSearch {
    pub fn new(provider: Arc<dyn GeocodeProvider>, debounce: Duration, min_chars: usize) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            provider,
            debounce,
            min_chars,
            shared: Arc::new(Shared {
                state,
                slot: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(provider: Arc<dyn GeocodeProvider>, config: &SyncConfig) -> Self {
        Self::new(
            provider,
            Duration::from_millis(config.search_debounce_ms),
            config.min_query_chars,
        )
    }

    /// Observe search results.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    /// Feed the latest query text. Must be called inside a Tokio runtime.
    pub fn input(&self, query: &str) {
        let mut slot = self.shared.slot();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }

        let query = query.trim().to_string();
        if query.chars().count() < self.min_chars {
            self.shared.state.send_replace(SearchState::Idle);
            return;
        }

        self.shared.state.send_replace(SearchState::Pending {
            query: query.clone(),
        });

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_lookup(
            self.provider.clone(),
            self.debounce,
            query,
            token.clone(),
            self.shared.clone(),
        ));
        *slot = Some(PendingLookup { token, handle });
    }

    /// Drop any pending lookup and reset to [`SearchState::Idle`].
    pub fn clear(&self) {
        if let Some(previous) = self.shared.slot().take() {
            previous.cancel();
        }
        self.shared.state.send_replace(SearchState::Idle);
    }
}

impl Drop for PlaceSearch {
    fn drop(&mut self) {
        if let Some(previous) = self.shared.slot().take() {
            previous.cancel();
        }
    }
}

async fn run_lookup(
    provider: Arc<dyn GeocodeProvider>,
    debounce: Duration,
    query: String,
    token: CancellationToken,
    shared: Arc<Shared>,
) {
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(debounce) => {}
    }

    debug!(query = %query, "place search lookup");
    let result = tokio::select! {
        _ = token.cancelled() => return,
        result = provider.lookup(&query) => result,
    };

    // Publishing under the slot lock orders us against `input`: once a newer
    // query has cancelled this token, nothing below runs.
    let mut slot = shared.slot();
    if token.is_cancelled() {
        return;
    }
    let next = match result {
        Ok(candidates) => SearchState::Ready {
            query,
            candidates,
        },
        Err(e) => {
            warn!(query = %query, error = %e, "place search failed");
            SearchState::Failed {
                query,
                message: e.to_string(),
            }
        }
    };
    shared.state.send_replace(next);
    // Finished: free the slot so `input` does not abort a completed task.
    slot.take();
}
