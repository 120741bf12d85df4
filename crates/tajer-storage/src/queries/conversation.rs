// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state rows: one per customer, state tag plus JSON payload.
//!
//! Every write bumps `version`. Payload merges run inside SQLite with
//! `json_patch`, so a merge never races a concurrent read-modify-write.

use rusqlite::{OptionalExtension, params, types::Type};
use tajer_core::TajerError;
use tajer_core::types::{ConversationRecord, Language};

use crate::database::{Database, map_tr_err};

pub async fn get(db: &Database, customer_id: i64) -> Result<Option<ConversationRecord>, TajerError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT customer_id, state, data, language, version, updated_at
                 FROM conversation_state WHERE customer_id = ?1",
                params![customer_id],
                |row| {
                    let raw: String = row.get(2)?;
                    let data = serde_json::from_str(&raw).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                    })?;
                    let language: Option<String> = row.get(3)?;
                    Ok(ConversationRecord {
                        customer_id: row.get(0)?,
                        state: row.get(1)?,
                        data,
                        language: language.and_then(|l| l.parse().ok()),
                        version: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Replaces state and payload. No merge with the previous payload.
pub async fn put(
    db: &Database,
    customer_id: i64,
    state: &str,
    data: &serde_json::Value,
) -> Result<(), TajerError> {
    let state = state.to_string();
    let data = data.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_state (customer_id, state, data, version)
                 VALUES (?1, ?2, ?3, 1)
                 ON CONFLICT(customer_id) DO UPDATE SET
                    state = excluded.state,
                    data = excluded.data,
                    version = conversation_state.version + 1,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![customer_id, state, data],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Merges `patch` into the stored payload, keeping the state tag.
///
/// With no row yet, the patch becomes the payload of an `idle` row.
pub async fn merge_data(
    db: &Database,
    customer_id: i64,
    patch: &serde_json::Value,
) -> Result<(), TajerError> {
    let patch = patch.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_state (customer_id, data, version)
                 VALUES (?1, json_patch('{}', ?2), 1)
                 ON CONFLICT(customer_id) DO UPDATE SET
                    data = json_patch(conversation_state.data, ?2),
                    version = conversation_state.version + 1,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![customer_id, patch],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Resets the row to `idle_state` with an empty payload. Language survives.
pub async fn clear(db: &Database, customer_id: i64, idle_state: &str) -> Result<(), TajerError> {
    put(db, customer_id, idle_state, &serde_json::json!({})).await
}

pub async fn set_language(
    db: &Database,
    customer_id: i64,
    language: Language,
) -> Result<(), TajerError> {
    let language = language.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_state (customer_id, language, version)
                 VALUES (?1, ?2, 1)
                 ON CONFLICT(customer_id) DO UPDATE SET
                    language = excluded.language,
                    version = conversation_state.version + 1,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![customer_id, language],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::customers;
    use serde_json::json;
    use tempfile::tempdir;

    async fn setup_db_with_customer() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let customer = customers::upsert(&db, "+96170123456").await.unwrap();
        (db, customer.id, dir)
    }

    #[tokio::test]
    async fn missing_row_returns_none() {
        let (db, id, _dir) = setup_db_with_customer().await;
        assert!(get(&db, id).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn put_replaces_payload_entirely() {
        let (db, id, _dir) = setup_db_with_customer().await;
        put(&db, id, "awaiting_quantity", &json!({"product": "P1", "page": 2}))
            .await
            .unwrap();
        put(&db, id, "awaiting_name", &json!({"quantity": 3})).await.unwrap();

        let record = get(&db, id).await.unwrap().unwrap();
        assert_eq!(record.state, "awaiting_name");
        assert_eq!(record.data, json!({"quantity": 3}));
        assert_eq!(record.version, 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn merge_keeps_state_and_existing_keys() {
        let (db, id, _dir) = setup_db_with_customer().await;
        put(&db, id, "awaiting_product_selection", &json!({"page": 1, "query": "pen"}))
            .await
            .unwrap();
        merge_data(&db, id, &json!({"page": 2})).await.unwrap();

        let record = get(&db, id).await.unwrap().unwrap();
        assert_eq!(record.state, "awaiting_product_selection");
        assert_eq!(record.data, json!({"page": 2, "query": "pen"}));
        assert_eq!(record.version, 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn merge_without_row_creates_idle_row() {
        let (db, id, _dir) = setup_db_with_customer().await;
        merge_data(&db, id, &json!({"note": "x"})).await.unwrap();
        let record = get(&db, id).await.unwrap().unwrap();
        assert_eq!(record.state, "idle");
        assert_eq!(record.data, json!({"note": "x"}));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn clear_resets_payload_but_keeps_language() {
        let (db, id, _dir) = setup_db_with_customer().await;
        set_language(&db, id, Language::Ar).await.unwrap();
        put(&db, id, "awaiting_quantity", &json!({"product": "P1"})).await.unwrap();
        clear(&db, id, "idle").await.unwrap();

        let record = get(&db, id).await.unwrap().unwrap();
        assert_eq!(record.state, "idle");
        assert_eq!(record.data, json!({}));
        assert_eq!(record.language, Some(Language::Ar));
        assert_eq!(record.version, 3);
        db.close().await.unwrap();
    }
}
