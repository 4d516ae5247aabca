// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `waypin geocode` command implementation.
//!
//! The query goes through the same [`PlaceSearch`] path as interactive
//! input, so the configured minimum length and debounce apply.

use std::sync::Arc;

use waypin_config::model::WaypinConfig;
use waypin_core::WaypinError;
use waypin_core::types::PlaceCandidate;
use waypin_geocode::{GeocodeGateway, PlaceSearch, SearchState};

/// Resolve `query` through the configured providers and print one line per
/// candidate. No matches is not an error.
pub async fn run_geocode(config: &WaypinConfig, query: &str) -> Result<(), WaypinError> {
    let gateway = GeocodeGateway::from_config(&config.geocode)?;
    let search = PlaceSearch::from_config(Arc::new(gateway), &config.sync);

    let candidates = search_once(&search, query, config.sync.min_query_chars).await?;
    if candidates.is_empty() {
        eprintln!("no matches for `{}`", query.trim());
    }
    for candidate in &candidates {
        println!("{}", format_candidate(candidate));
    }
    Ok(())
}

/// Feed one query and wait for it to settle.
async fn search_once(
    search: &PlaceSearch,
    query: &str,
    min_chars: usize,
) -> Result<Vec<PlaceCandidate>, WaypinError> {
    let mut states = search.subscribe();
    search.input(query);

    let settled = states
        .wait_for(|state| !matches!(state, SearchState::Pending { .. }))
        .await
        .map_err(|_| WaypinError::Unknown("place search stopped".into()))?
        .clone();

    match settled {
        SearchState::Ready { candidates, .. } => Ok(candidates),
        SearchState::Idle => Err(WaypinError::Validation(format!(
            "query must be at least {min_chars} characters"
        ))),
        // The cause is already logged by the search task.
        SearchState::Failed { query, .. } | SearchState::Pending { query } => {
            Err(WaypinError::ServiceUnavailable(format!(
                "no geocoding provider could resolve `{query}`"
            )))
        }
    }
}

fn format_candidate(candidate: &PlaceCandidate) -> String {
    format!(
        "{}, {}  {}",
        candidate.latitude, candidate.longitude, candidate.label
    )
}
