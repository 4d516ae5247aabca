// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Primary-then-secondary resolution.
//!
//! The primary's answer is used when it succeeds with at least one candidate.
//! Anything else (transport failure, bad status, bad payload, empty list)
//! falls through to the secondary exactly once. The secondary's answer is
//! final, including an empty one. If the secondary also fails, the caller
//! sees [`WaypinError::ServiceUnavailable`] and never the raw provider error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use waypin_config::model::GeocodeConfig;
use waypin_core::types::PlaceCandidate;
use waypin_core::{AdapterType, GeocodeProvider, HealthStatus, PluginAdapter, WaypinError};

use crate::nominatim::NominatimClient;
use crate::photon::PhotonClient;

#[derive(Clone)]
pub struct GeocodeGateway {
    primary: Arc<dyn GeocodeProvider>,
    secondary: Arc<dyn GeocodeProvider>,
}

impl GeocodeGateway {
    pub fn new(primary: Arc<dyn GeocodeProvider>, secondary: Arc<dyn GeocodeProvider>) -> Self {
        Self { primary, secondary }
    }

    /// Nominatim primary with Photon fallback, both from `config`.
    pub fn from_config(config: &GeocodeConfig) -> Result<Self, WaypinError> {
        let primary = NominatimClient::new(config)?;
        let secondary = PhotonClient::new(config)?;
        info!(
            primary = %config.primary_url,
            secondary = %config.secondary_url,
            "geocoding gateway initialized"
        );
        Ok(Self::new(Arc::new(primary), Arc::new(secondary)))
    }

    /// Resolve free text to candidate coordinates.
    pub async fn resolve(&self, query: &str) -> Result<Vec<PlaceCandidate>, WaypinError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WaypinError::Validation("query must not be empty".into()));
        }

        match self.primary.lookup(query).await {
            Ok(candidates) if !candidates.is_empty() => {
                debug!(query, provider = self.primary.name(), count = candidates.len(), "resolved");
                return Ok(candidates);
            }
            Ok(_) => {
                debug!(query, provider = self.primary.name(), "no matches, falling back");
            }
            Err(e) => {
                warn!(query, provider = self.primary.name(), error = %e, "primary failed, falling back");
            }
        }

        match self.secondary.lookup(query).await {
            Ok(candidates) => {
                debug!(query, provider = self.secondary.name(), count = candidates.len(), "resolved");
                Ok(candidates)
            }
            Err(e) => {
                warn!(query, provider = self.secondary.name(), error = %e, "secondary failed");
                Err(WaypinError::ServiceUnavailable(format!(
                    "no geocoding provider could resolve `{query}`"
                )))
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for GeocodeGateway {
    fn name(&self) -> &str {
        "geocode-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Geocoder
    }

    async fn health_check(&self) -> Result<HealthStatus, WaypinError> {
        let primary = self.primary.health_check().await?;
        let secondary = self.secondary.health_check().await?;
        Ok(match (primary, secondary) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            (HealthStatus::Unhealthy(a), HealthStatus::Unhealthy(b)) => {
                HealthStatus::Unhealthy(format!("{a}; {b}"))
            }
            // One provider still answers, so resolution degrades rather than fails.
            (HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason), _)
            | (_, HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason)) => {
                HealthStatus::Degraded(reason)
            }
        })
    }

    async fn shutdown(&self) -> Result<(), WaypinError> {
        self.primary.shutdown().await?;
        self.secondary.shutdown().await
    }
}

#[async_trait]
impl GeocodeProvider for GeocodeGateway {
    async fn lookup(&self, query: &str) -> Result<Vec<PlaceCandidate>, WaypinError> {
        self.resolve(query).await
    }
}
