// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geocoding provider trait.

use async_trait::async_trait;

use crate::error::WaypinError;
use crate::traits::adapter::PluginAdapter;
use crate::types::PlaceCandidate;

/// Maps a free-text place name to candidate coordinates.
#[async_trait]
pub trait GeocodeProvider: PluginAdapter {
    /// Resolves `query`. An empty vector is a successful "no matches".
    async fn lookup(&self, query: &str) -> Result<Vec<PlaceCandidate>, WaypinError>;
}
