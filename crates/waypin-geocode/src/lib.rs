// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geocoding gateway for the Waypin location board.
//!
//! Resolves free-text place names through a Nominatim-shaped primary and a
//! Photon-shaped secondary, normalizing both into [`PlaceCandidate`]s
//! (latitude first). [`PlaceSearch`] adds the debounced, cancellable
//! lookup used while the user is typing.
//!
//! [`PlaceCandidate`]: waypin_core::types::PlaceCandidate

pub mod client;
pub mod gateway;
pub mod nominatim;
pub mod photon;
pub mod search;
pub mod types;

pub use gateway::GeocodeGateway;
pub use nominatim::NominatimClient;
pub use photon::PhotonClient;
pub use search::{PlaceSearch, SearchState};
pub use types::GeocodeHit;
