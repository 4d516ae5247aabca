// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secondary provider: Photon-shaped GeoJSON endpoint.

use async_trait::async_trait;
use tracing::debug;
use waypin_config::model::GeocodeConfig;
use waypin_core::types::PlaceCandidate;
use waypin_core::{AdapterType, GeocodeProvider, HealthStatus, PluginAdapter, WaypinError};

use crate::client::{build_http_client, get_json, parse_endpoint, request_timeout};
use crate::types::{PhotonFeature, PhotonResponse};

pub struct PhotonClient {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    language: String,
    timeout: std::time::Duration,
}

impl PhotonClient {
    pub fn new(config: &GeocodeConfig) -> Result<Self, WaypinError> {
        Ok(Self {
            client: build_http_client(config)?,
            endpoint: parse_endpoint(&config.secondary_url)?,
            language: config.language.clone(),
            timeout: request_timeout(config),
        })
    }
}

#[async_trait]
impl PluginAdapter for PhotonClient {
    fn name(&self) -> &str {
        "photon"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Geocoder
    }

    async fn health_check(&self) -> Result<HealthStatus, WaypinError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WaypinError> {
        Ok(())
    }
}

#[async_trait]
impl GeocodeProvider for PhotonClient {
    async fn lookup(&self, query: &str) -> Result<Vec<PlaceCandidate>, WaypinError> {
        let response: PhotonResponse = get_json(
            &self.client,
            &self.endpoint,
            &[("q", query), ("lang", self.language.as_str())],
            self.timeout,
            "photon",
        )
        .await?;

        let candidates: Vec<_> = response
            .features
            .into_iter()
            .filter_map(PhotonFeature::into_candidate)
            .collect();
        debug!(query, count = candidates.len(), "photon lookup complete");
        Ok(candidates)
    }
}
