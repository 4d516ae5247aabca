// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Waypin location board.
//!
//! This crate provides the error taxonomy, the domain types (profiles, member
//! pins, messages, place candidates, change events) and the adapter traits
//! that the storage, change-feed and geocoding crates implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WaypinError;
pub use types::{AdapterType, HealthStatus};

// Re-export all adapter traits at crate root.
pub use traits::{
    AuthAdapter, BlobAdapter, ChangeFeed, ChangeStream, GeocodeProvider, PluginAdapter,
    StorageAdapter,
};
