// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP plumbing for the geocoding providers.
//!
//! Both providers are plain `GET` endpoints returning JSON. A request that
//! exceeds the configured timeout surfaces as [`WaypinError::Timeout`].
//! Other transport errors, non-success statuses and undecodable bodies
//! surface as [`WaypinError::Provider`]. The gateway decides what to do with
//! either.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::debug;
use waypin_config::model::GeocodeConfig;
use waypin_core::WaypinError;

/// Build the HTTP client shared by both providers.
///
/// The primary rejects anonymous traffic, so every request carries the
/// configured `User-Agent`.
pub fn build_http_client(config: &GeocodeConfig) -> Result<reqwest::Client, WaypinError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| WaypinError::Config(format!("invalid user agent header value: {e}")))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| WaypinError::Provider {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Parse a configured endpoint once at construction time.
pub fn parse_endpoint(url: &str) -> Result<reqwest::Url, WaypinError> {
    reqwest::Url::parse(url)
        .map_err(|e| WaypinError::Config(format!("invalid geocoding endpoint `{url}`: {e}")))
}

/// Per-request timeout for a configuration.
pub fn request_timeout(config: &GeocodeConfig) -> Duration {
    Duration::from_secs(config.timeout_secs)
}

fn transport_error(
    provider: &str,
    timeout: Duration,
    what: &str,
    e: reqwest::Error,
) -> WaypinError {
    if e.is_timeout() {
        return WaypinError::Timeout { duration: timeout };
    }
    WaypinError::Provider {
        message: format!("{provider} {what}: {e}"),
        source: Some(Box::new(e)),
    }
}

/// `GET endpoint?params` within `timeout` and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    endpoint: &reqwest::Url,
    params: &[(&str, &str)],
    timeout: Duration,
    provider: &str,
) -> Result<T, WaypinError> {
    let mut url = endpoint.clone();
    url.query_pairs_mut().extend_pairs(params);

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| transport_error(provider, timeout, "request failed", e))?;

    let status = response.status();
    debug!(provider, status = %status, "geocode response received");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WaypinError::Provider {
            message: format!("{provider} returned {status}: {body}"),
            source: None,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, timeout, "response body unreadable", e))?;
    serde_json::from_str(&body).map_err(|e| WaypinError::Provider {
        message: format!("failed to parse {provider} response: {e}"),
        source: Some(Box::new(e)),
    })
}
