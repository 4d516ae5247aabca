// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email/password authentication backed by the `users` and `auth_sessions` tables.
//!
//! Passwords are stored as Argon2id PHC strings. Hashing runs on the blocking
//! pool so the single database thread is never held during key derivation.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use tracing::{debug, info};

use waypin_core::types::Session;
use waypin_core::{AuthAdapter, WaypinError};

use crate::adapter::SqliteStorage;
use crate::queries::users::{self, UserRow};

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, WaypinError> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| WaypinError::Unknown(format!("failed to encode salt: {e}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| WaypinError::Unknown(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), WaypinError> {
    if !email.contains('@') {
        return Err(WaypinError::Validation(format!("invalid email: {email}")));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(WaypinError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

async fn run_blocking<T, F>(f: F) -> Result<T, WaypinError>
where
    F: FnOnce() -> Result<T, WaypinError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| WaypinError::Unknown(format!("auth task failed: {e}")))?
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

impl SqliteStorage {
    async fn issue_session(&self, user_id: &str, email: &str) -> Result<Session, WaypinError> {
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            created_at: now(),
        };
        users::insert_session(self.db()?, &session.token, user_id, &session.created_at).await?;
        Ok(session)
    }
}

#[async_trait]
impl AuthAdapter for SqliteStorage {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, WaypinError> {
        let email = email.trim().to_lowercase();
        validate_credentials(&email, password)?;

        let password = password.to_string();
        let password_hash = run_blocking(move || hash_password(&password)).await?;

        let user = UserRow {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            password_hash,
            created_at: now(),
        };
        if !users::insert_user(self.db()?, &user).await? {
            return Err(WaypinError::Validation(format!(
                "email already registered: {email}"
            )));
        }
        info!(user_id = %user.id, "account created");
        self.issue_session(&user.id, &email).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, WaypinError> {
        let email = email.trim().to_lowercase();
        let Some(user) = users::get_user_by_email(self.db()?, &email).await? else {
            debug!("sign-in for unknown email");
            return Err(WaypinError::Unauthenticated);
        };

        let password = password.to_string();
        let phc = user.password_hash.clone();
        let verified = run_blocking(move || Ok(verify_password(&password, &phc))).await?;
        if !verified {
            debug!(user_id = %user.id, "sign-in with wrong password");
            return Err(WaypinError::Unauthenticated);
        }
        self.issue_session(&user.id, &user.email).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), WaypinError> {
        let removed = users::delete_session(self.db()?, token).await?;
        debug!(removed, "session revoked");
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<Option<String>, WaypinError> {
        users::session_user(self.db()?, token).await
    }
}
