// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Waypin integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockGeocoder`] - Scripted geocoding provider that records its queries
//! - [`TestHarness`] - Temp SQLite backend, change feed and avatar store

pub mod harness;
pub mod mock_geocoder;

pub use harness::TestHarness;
pub use mock_geocoder::MockGeocoder;
