// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles GET /health and GET /geocode.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use waypin_core::WaypinError;
use waypin_geocode::GeocodeHit;

use crate::server::GatewayState;

/// Query string for GET /geocode.
#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    /// Free-text place name. Missing and blank are both rejected.
    #[serde(default)]
    pub q: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the server state was created.
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// A [`WaypinError`] rendered as a status code plus `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub WaypinError);

impl From<WaypinError> for ApiError {
    fn from(err: WaypinError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WaypinError::Validation(_) => StatusCode::BAD_REQUEST,
            WaypinError::Unauthenticated => StatusCode::UNAUTHORIZED,
            WaypinError::NotFound { .. } => StatusCode::NOT_FOUND,
            // Both providers failing is reported as a plain 500.
            WaypinError::ServiceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_user_facing() {
            self.0.to_string()
        } else {
            error!(error = %self.0, "request failed");
            "internal error".to_string()
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// GET /health -- liveness check, no auth.
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /geocode?q= -- resolve a place name to `[{display_name, lat, lon}]`.
pub async fn get_geocode(
    State(state): State<GatewayState>,
    params: Result<Query<GeocodeQuery>, QueryRejection>,
) -> Result<Json<Vec<GeocodeHit>>, ApiError> {
    let Query(params) =
        params.map_err(|rejection| WaypinError::Validation(rejection.body_text()))?;
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(WaypinError::Validation("missing query parameter `q`".into()).into());
    }

    let candidates = state.geocoder.resolve(query).await?;
    debug!(query, count = candidates.len(), "geocode served");
    Ok(Json(candidates.into_iter().map(GeocodeHit::from).collect()))
}
