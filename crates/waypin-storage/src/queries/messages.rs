// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use rusqlite::{params, params_from_iter};
use waypin_core::WaypinError;
use waypin_core::types::Message;

use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, sender_id, receiver_id, content, read, created_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        read: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a new message.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), WaypinError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.id,
                    msg.sender_id,
                    msg.receiver_id,
                    msg.content,
                    msg.read,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Messages addressed to `receiver_id`, newest first.
pub async fn get_messages_for_receiver(
    db: &Database,
    receiver_id: &str,
) -> Result<Vec<Message>, WaypinError> {
    let receiver_id = receiver_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE receiver_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![receiver_id], row_to_message)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Count of unread messages addressed to `receiver_id`.
pub async fn count_unread(db: &Database, receiver_id: &str) -> Result<u64, WaypinError> {
    let receiver_id = receiver_id.to_string();
    let count: i64 = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1 AND read = 0",
                params![receiver_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(count.max(0) as u64)
}

/// Set the read flag on `ids` addressed to `receiver_id`.
///
/// Only rows that were unread are touched; the returned messages are exactly
/// the false-to-true transitions.
pub async fn mark_read(
    db: &Database,
    receiver_id: &str,
    ids: &[String],
) -> Result<Vec<Message>, WaypinError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut bind = Vec::with_capacity(ids.len() + 1);
    bind.push(receiver_id.to_string());
    bind.extend(ids.iter().cloned());

    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; bind.len() - 1].join(", ");
            let mut stmt = conn.prepare(&format!(
                "UPDATE messages SET read = 1
                 WHERE receiver_id = ? AND read = 0 AND id IN ({placeholders})
                 RETURNING {COLUMNS}"
            ))?;
            let rows = stmt.query_map(params_from_iter(bind.iter()), row_to_message)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
