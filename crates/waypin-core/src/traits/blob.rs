// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store adapter trait for publicly readable avatar objects.

use async_trait::async_trait;

use crate::error::WaypinError;
use crate::traits::adapter::PluginAdapter;

/// Write-once object store with public URLs.
#[async_trait]
pub trait BlobAdapter: PluginAdapter {
    /// Stores `bytes` under `name`. Fails if an object with that name exists.
    async fn put_object(&self, name: &str, bytes: &[u8]) -> Result<(), WaypinError>;

    /// Public URL for an object name. Does not check existence.
    fn public_url(&self, name: &str) -> String;
}
