// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local backend for the Waypin location board.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a single-writer
//! concurrency model via `tokio-rusqlite`, email/password auth with argon2
//! hashes, and a filesystem avatar store. Every committed write to `profiles`
//! or `messages` is published on the change feed.

pub mod adapter;
pub mod auth;
pub mod avatars;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use avatars::FsAvatarStore;
pub use database::Database;
