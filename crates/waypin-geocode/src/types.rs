// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for both geocoding providers and the normalized HTTP output.

use serde::{Deserialize, Serialize};
use tracing::warn;
use waypin_core::types::PlaceCandidate;

// --- Primary (Nominatim) ---

/// One entry of the primary provider's JSON array.
///
/// Coordinates arrive as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimPlace {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl NominatimPlace {
    /// Normalize, or `None` if either coordinate fails to parse.
    pub fn into_candidate(self) -> Option<PlaceCandidate> {
        match (self.lat.trim().parse::<f64>(), self.lon.trim().parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => Some(PlaceCandidate {
                label: self.display_name,
                latitude,
                longitude,
            }),
            _ => {
                warn!(
                    label = %self.display_name,
                    lat = %self.lat,
                    lon = %self.lon,
                    "skipping place with unparsable coordinates"
                );
                None
            }
        }
    }
}

// --- Secondary (Photon) ---

/// The secondary provider's GeoJSON feature collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotonResponse {
    #[serde(default)]
    pub features: Vec<PhotonFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotonFeature {
    pub geometry: PhotonGeometry,
    #[serde(default)]
    pub properties: PhotonProperties,
}

/// `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotonGeometry {
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotonProperties {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl PhotonFeature {
    /// Normalize into latitude-then-longitude, or `None` if the feature has no
    /// usable point or label.
    pub fn into_candidate(self) -> Option<PlaceCandidate> {
        let [longitude, latitude] = self.geometry.coordinates[..] else {
            warn!(
                coordinates = ?self.geometry.coordinates,
                "skipping feature without a point geometry"
            );
            return None;
        };
        let label = self.properties.label()?;
        Some(PlaceCandidate {
            label,
            latitude,
            longitude,
        })
    }
}

impl PhotonProperties {
    /// `name, city`, else `name, country`, else whichever part exists.
    pub fn label(&self) -> Option<String> {
        fn non_empty(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        let name = non_empty(&self.name);
        let area = non_empty(&self.city).or_else(|| non_empty(&self.country));
        match (name, area) {
            (Some(name), Some(area)) => Some(format!("{name}, {area}")),
            (Some(name), None) => Some(name.to_string()),
            (None, Some(area)) => Some(area.to_string()),
            (None, None) => None,
        }
    }
}

// --- Normalized output ---

/// The primary's response shape, used for every successful `/geocode` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl From<PlaceCandidate> for GeocodeHit {
    fn from(candidate: PlaceCandidate) -> Self {
        Self {
            display_name: candidate.label,
            lat: candidate.latitude.to_string(),
            lon: candidate.longitude.to_string(),
        }
    }
}
