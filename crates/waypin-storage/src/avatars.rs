// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem avatar store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use waypin_config::model::StorageConfig;
use waypin_core::{AdapterType, BlobAdapter, HealthStatus, PluginAdapter, WaypinError};

/// Write-once avatar objects under a directory, served from a public base URL.
pub struct FsAvatarStore {
    dir: PathBuf,
    base_url: String,
}

impl FsAvatarStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.avatar_dir, &config.avatar_base_url)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn staging_name(name: &str) -> String {
    format!(".{name}.{}.part", uuid::Uuid::new_v4().simple())
}

async fn write_staged(staging: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Object names are a single path segment: no separators, no dot-dot.
fn check_object_name(name: &str) -> Result<(), WaypinError> {
    let bad = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == "..";
    if bad {
        return Err(WaypinError::Validation(format!("invalid object name: {name}")));
    }
    Ok(())
}

#[async_trait]
impl PluginAdapter for FsAvatarStore {
    fn name(&self) -> &str {
        "fs-avatars"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Blob
    }

    async fn health_check(&self) -> Result<HealthStatus, WaypinError> {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not a directory",
                self.dir.display()
            ))),
            // Created lazily on first upload.
            Err(_) => Ok(HealthStatus::Degraded(format!(
                "{} does not exist yet",
                self.dir.display()
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), WaypinError> {
        Ok(())
    }
}

#[async_trait]
impl BlobAdapter for FsAvatarStore {
    async fn put_object(&self, name: &str, bytes: &[u8]) -> Result<(), WaypinError> {
        check_object_name(name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(WaypinError::storage)?;

        // Bytes land in a staging file first. The public name is hard-linked
        // to it only once complete, and linking never replaces an existing
        // object.
        let path = self.dir.join(name);
        let staging = self.dir.join(staging_name(name));
        let stored = async {
            write_staged(&staging, bytes).await?;
            tokio::fs::hard_link(&staging, &path).await
        }
        .await;
        if let Err(e) = tokio::fs::remove_file(&staging).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %staging.display(), error = %e, "failed to remove staging file");
        }
        stored.map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => {
                WaypinError::Validation(format!("object already exists: {name}"))
            }
            _ => WaypinError::storage(e),
        })?;
        debug!(object = name, size = bytes.len(), "avatar stored");
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn put_writes_once() {
        let dir = tempdir().unwrap();
        let store = FsAvatarStore::new(dir.path().join("avatars"), "http://cdn.test/avatars/");

        store.put_object("u1-abc.png", b"png-bytes").await.unwrap();
        let stored = std::fs::read(dir.path().join("avatars/u1-abc.png")).unwrap();
        assert_eq!(stored, b"png-bytes");

        let again = store.put_object("u1-abc.png", b"other").await;
        assert!(matches!(again, Err(WaypinError::Validation(_))));
        let stored = std::fs::read(dir.path().join("avatars/u1-abc.png")).unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn successful_put_leaves_no_staging_file() {
        let dir = tempdir().unwrap();
        let store = FsAvatarStore::new(dir.path(), "http://cdn.test");
        store.put_object("u1-abc.png", b"png-bytes").await.unwrap();
        assert_eq!(entries(dir.path()), ["u1-abc.png"]);
    }

    #[tokio::test]
    async fn failed_put_cleans_up_and_keeps_name_free() {
        let dir = tempdir().unwrap();
        let store = FsAvatarStore::new(dir.path(), "http://cdn.test");

        // Something that is not a complete object already occupies the name.
        std::fs::create_dir(dir.path().join("u1-abc.png")).unwrap();
        let err = store.put_object("u1-abc.png", b"png-bytes").await.unwrap_err();
        assert!(matches!(err, WaypinError::Validation(_)));
        assert_eq!(entries(dir.path()), ["u1-abc.png"]);
        assert!(dir.path().join("u1-abc.png").is_dir());

        // A write that cannot even stage fails as storage and publishes nothing.
        let blocked = FsAvatarStore::new(
            dir.path().join("u1-abc.png/nested/file"),
            "http://cdn.test",
        );
        std::fs::write(dir.path().join("u1-abc.png/nested"), b"not a dir").unwrap();
        let err = blocked.put_object("u2-def.png", b"x").await.unwrap_err();
        assert!(matches!(err, WaypinError::Storage { .. }));
        assert!(!dir.path().join("u2-def.png").exists());
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let store = FsAvatarStore::new(dir.path(), "http://cdn.test");
        assert!(store.put_object("../escape.png", b"x").await.is_err());
        assert!(store.put_object("", b"x").await.is_err());
    }

    #[test]
    fn public_url_joins_base_and_name() {
        let store = FsAvatarStore::new("/tmp/avatars", "http://cdn.test/avatars/");
        assert_eq!(store.public_url("u1-abc.png"), "http://cdn.test/avatars/u1-abc.png");
    }

    #[tokio::test]
    async fn health_degraded_until_first_upload() {
        let dir = tempdir().unwrap();
        let store = FsAvatarStore::new(dir.path().join("later"), "http://cdn.test");
        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
        store.put_object("a.png", b"x").await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
