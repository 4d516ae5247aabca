// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Primary provider: Nominatim-shaped search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use waypin_config::model::GeocodeConfig;
use waypin_core::types::PlaceCandidate;
use waypin_core::{AdapterType, GeocodeProvider, HealthStatus, PluginAdapter, WaypinError};

use crate::client::{build_http_client, get_json, parse_endpoint, request_timeout};
use crate::types::NominatimPlace;

pub struct NominatimClient {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    language: String,
    limit: String,
    timeout: Duration,
}

impl NominatimClient {
    pub fn new(config: &GeocodeConfig) -> Result<Self, WaypinError> {
        Ok(Self {
            client: build_http_client(config)?,
            endpoint: parse_endpoint(&config.primary_url)?,
            language: config.language.clone(),
            limit: config.limit.to_string(),
            timeout: request_timeout(config),
        })
    }
}

#[async_trait]
impl PluginAdapter for NominatimClient {
    fn name(&self) -> &str {
        "nominatim"
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
impl GeocodeProvider for NominatimClient {
    async fn lookup(&self, query: &str) -> Result<Vec<PlaceCandidate>, WaypinError> {
        let places: Vec<NominatimPlace> = get_json(
            &self.client,
            &self.endpoint,
            &[
                ("q", query),
                ("format", "json"),
                ("limit", self.limit.as_str()),
                ("accept-language", self.language.as_str()),
            ],
            self.timeout,
            "nominatim",
        )
        .await?;

        let candidates: Vec<_> = places
            .into_iter()
            .filter_map(NominatimPlace::into_candidate)
            .collect();
        debug!(query, count = candidates.len(), "nominatim lookup complete");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> NominatimClient {
        NominatimClient::new(&GeocodeConfig {
            primary_url: format!("{}/search", server.uri()),
            user_agent: "waypin-test/1.0".into(),
            language: "en".into(),
            limit: 5,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn lookup_sends_expected_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Lisbon"))
            .and(query_param("format", "json"))
            .and(query_param("limit", "5"))
            .and(query_param("accept-language", "en"))
            .and(header("user-agent", "waypin-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"display_name": "Lisboa, Portugal", "lat": "38.7077", "lon": "-9.1366"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_client(&server).lookup("Lisbon").await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label, "Lisboa, Portugal");
        assert_eq!(result[0].latitude, 38.7077);
        assert_eq!(result[0].longitude, -9.1366);
    }

    #[tokio::test]
    async fn empty_array_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        assert!(test_client(&server).lookup("Chiangmai").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("anonymous access denied"))
            .mount(&server)
            .await;

        let err = test_client(&server).lookup("Lisbon").await.unwrap_err();
        assert!(matches!(err, WaypinError::Provider { .. }));
        assert!(err.to_string().contains("403"), "got: {err}");
    }

    #[tokio::test]
    async fn slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = NominatimClient::new(&GeocodeConfig {
            primary_url: format!("{}/search", server.uri()),
            timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();

        let err = client.lookup("Lisbon").await.unwrap_err();
        assert!(
            matches!(err, WaypinError::Timeout { duration } if duration.as_secs() == 1),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            test_client(&server).lookup("Lisbon").await,
            Err(WaypinError::Provider { .. })
        ));
    }
}
