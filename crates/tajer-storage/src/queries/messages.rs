// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message log.

use rusqlite::{OptionalExtension, params};
use tajer_core::TajerError;
use tajer_core::types::{MessageDirection, MessageLogEntry};

use crate::database::{Database, map_tr_err};

/// Append one message to the log.
pub async fn append(
    db: &Database,
    customer_id: i64,
    direction: MessageDirection,
    body: &str,
) -> Result<(), TajerError> {
    let direction = direction.to_string();
    let body = body.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (customer_id, direction, body) VALUES (?1, ?2, ?3)",
                params![customer_id, direction, body],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Timestamp of the customer's most recent inbound message.
pub async fn last_inbound_at(db: &Database, customer_id: i64) -> Result<Option<String>, TajerError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT created_at FROM messages
                 WHERE customer_id = ?1 AND direction = 'inbound'
                 ORDER BY id DESC LIMIT 1",
                params![customer_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Messages for a customer in chronological order, at most `limit` of the newest.
pub async fn recent_for_customer(
    db: &Database,
    customer_id: i64,
    limit: usize,
) -> Result<Vec<MessageLogEntry>, TajerError> {
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, customer_id, direction, body, created_at FROM (
                    SELECT * FROM messages WHERE customer_id = ?1 ORDER BY id DESC LIMIT ?2
                 ) ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![customer_id, limit], |row| {
                let direction: String = row.get(2)?;
                Ok(MessageLogEntry {
                    id: row.get(0)?,
                    customer_id: row.get(1)?,
                    direction: if direction == "inbound" {
                        MessageDirection::Inbound
                    } else {
                        MessageDirection::Outbound
                    },
                    body: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
