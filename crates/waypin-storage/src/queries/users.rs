// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account and auth-session rows.

use rusqlite::{OptionalExtension, params};
use waypin_core::WaypinError;

use crate::database::{Database, map_tr_err};

/// A stored account. The hash is an argon2 PHC string.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Insert an account. Returns `false` when the email is already registered.
pub async fn insert_user(db: &Database, user: &UserRow) -> Result<bool, WaypinError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user.id, user.email, user.password_hash, user.created_at],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Look up an account by email.
pub async fn get_user_by_email(db: &Database, email: &str) -> Result<Option<UserRow>, WaypinError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, email, password_hash, created_at FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Record a live session token for `user_id`.
pub async fn insert_session(
    db: &Database,
    token: &str,
    user_id: &str,
    created_at: &str,
) -> Result<(), WaypinError> {
    let (token, user_id, created_at) = (token.to_string(), user_id.to_string(), created_at.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO auth_sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Revoke a session token. Returns rows removed.
pub async fn delete_session(db: &Database, token: &str) -> Result<u64, WaypinError> {
    let token = token.to_string();
    let removed = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM auth_sessions WHERE token = ?1", params![token]))
        .await
        .map_err(map_tr_err)?;
    Ok(removed as u64)
}

/// The user owning a live session token.
pub async fn session_user(db: &Database, token: &str) -> Result<Option<String>, WaypinError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT user_id FROM auth_sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
