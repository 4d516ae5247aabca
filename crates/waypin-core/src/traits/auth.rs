// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication adapter trait for email/password sessions.

use async_trait::async_trait;

use crate::error::WaypinError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Session;

/// Session-based authentication backend.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Registers a new account and returns a signed-in session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, WaypinError>;

    /// Verifies credentials and issues a new session.
    ///
    /// Unknown email and wrong password both yield [`WaypinError::Unauthenticated`].
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, WaypinError>;

    /// Revokes a session token. Revoking an unknown token is not an error.
    async fn sign_out(&self, token: &str) -> Result<(), WaypinError>;

    /// Resolves a session token to its user id, if the session is live.
    async fn current_user(&self, token: &str) -> Result<Option<String>, WaypinError>;
}
