// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for Waypin.
//!
//! Exposes the geocoding gateway as `GET /geocode?q=`, a liveness check at
//! `GET /health`, and optionally the uploaded avatars under `/avatars`.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, HealthState, ServerConfig, router, start_server};
