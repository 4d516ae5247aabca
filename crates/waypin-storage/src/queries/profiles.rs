// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile CRUD operations.

use rusqlite::{OptionalExtension, params, params_from_iter};
use waypin_core::WaypinError;
use waypin_core::types::{Profile, ProfilePatch};

use crate::database::{Database, map_tr_err};

const COLUMNS: &str =
    "id, user_id, username, avatar_url, city, latitude, longitude, status, return_date, created_at";

fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        avatar_url: row.get(3)?,
        city: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        status: row.get(7)?,
        return_date: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert a new profile.
pub async fn insert_profile(db: &Database, profile: &Profile) -> Result<(), WaypinError> {
    let p = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO profiles (id, user_id, username, avatar_url, city, latitude,
                                       longitude, status, return_date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    p.id,
                    p.user_id,
                    p.username,
                    p.avatar_url,
                    p.city,
                    p.latitude,
                    p.longitude,
                    p.status,
                    p.return_date,
                    p.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All profiles in creation order. Rows sharing a timestamp keep insertion order.
pub async fn list_profiles(db: &Database) -> Result<Vec<Profile>, WaypinError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM profiles ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map([], row_to_profile)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// The profile owned by `user_id`.
pub async fn get_profile_by_user(
    db: &Database,
    user_id: &str,
) -> Result<Option<Profile>, WaypinError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM profiles WHERE user_id = ?1"),
                params![user_id],
                row_to_profile,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Profiles owned by any of `user_ids`. Unknown ids are skipped.
pub async fn get_profiles_by_users(
    db: &Database,
    user_ids: &[String],
) -> Result<Vec<Profile>, WaypinError> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = user_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM profiles WHERE user_id IN ({placeholders})
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_profile)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply `patch` to profile `id` when it belongs to `owner_id`.
///
/// Returns the updated row, or `None` when no owned row matched.
pub async fn update_profile(
    db: &Database,
    owner_id: &str,
    id: &str,
    patch: &ProfilePatch,
) -> Result<Option<Profile>, WaypinError> {
    let owner_id = owner_id.to_string();
    let id = id.to_string();
    let patch = patch.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE profiles SET
                        username    = COALESCE(?3, username),
                        avatar_url  = COALESCE(?4, avatar_url),
                        city        = COALESCE(?5, city),
                        latitude    = COALESCE(?6, latitude),
                        longitude   = COALESCE(?7, longitude),
                        status      = COALESCE(?8, status),
                        return_date = COALESCE(?9, return_date)
                     WHERE id = ?1 AND user_id = ?2
                     RETURNING {COLUMNS}"
                ),
                params![
                    id,
                    owner_id,
                    patch.username,
                    patch.avatar_url,
                    patch.city,
                    patch.latitude,
                    patch.longitude,
                    patch.status,
                    patch.return_date,
                ],
                row_to_profile,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete profile `id` when it belongs to `owner_id`.
///
/// Returns the deleted row, or `None` when no owned row matched.
pub async fn delete_profile(
    db: &Database,
    owner_id: &str,
    id: &str,
) -> Result<Option<Profile>, WaypinError> {
    let owner_id = owner_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("DELETE FROM profiles WHERE id = ?1 AND user_id = ?2 RETURNING {COLUMNS}"),
                params![id, owner_id],
                row_to_profile,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
