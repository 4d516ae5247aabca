// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Backend adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod auth;
pub mod blob;
pub mod feed;
pub mod geocode;
pub mod storage;

pub use adapter::PluginAdapter;
pub use auth::AuthAdapter;
pub use blob::BlobAdapter;
pub use feed::{ChangeFeed, ChangeStream};
pub use geocode::GeocodeProvider;
pub use storage::StorageAdapter;
