// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer lookups and updates.

use rusqlite::{OptionalExtension, Row, params};
use tajer_core::TajerError;
use tajer_core::types::{ContactUpdate, Customer, Language};

use crate::database::{Database, map_tr_err};

const CUSTOMER_COLUMNS: &str =
    "id, phone, name, email, address, language, erp_code, created_at, updated_at";

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    let language: Option<String> = row.get(5)?;
    Ok(Customer {
        id: row.get(0)?,
        phone: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        address: row.get(4)?,
        // Unknown codes in the column are treated as unset.
        language: language.and_then(|l| l.parse().ok()),
        erp_code: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub async fn get_by_phone(db: &Database, phone: &str) -> Result<Option<Customer>, TajerError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1"),
                params![phone],
                customer_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, id: i64) -> Result<Option<Customer>, TajerError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
                params![id],
                customer_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Returns the customer for `phone`, inserting an empty record on first contact.
pub async fn upsert(db: &Database, phone: &str) -> Result<Customer, TajerError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO customers (phone) VALUES (?1) ON CONFLICT(phone) DO NOTHING",
                params![phone],
            )?;
            conn.query_row(
                &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1"),
                params![phone],
                customer_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_language(db: &Database, id: i64, language: Language) -> Result<(), TajerError> {
    let language = language.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE customers SET language = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![language, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Applies the set fields of `contact`. Unset fields keep their stored value.
pub(crate) fn apply_contact(
    conn: &rusqlite::Connection,
    id: i64,
    contact: &ContactUpdate,
) -> rusqlite::Result<()> {
    if contact.is_empty() {
        return Ok(());
    }
    conn.execute(
        "UPDATE customers SET
            name = COALESCE(?1, name),
            address = COALESCE(?2, address),
            email = COALESCE(?3, email),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?4",
        params![contact.name, contact.address, contact.email, id],
    )?;
    Ok(())
}

pub async fn update_contact(
    db: &Database,
    id: i64,
    contact: &ContactUpdate,
) -> Result<(), TajerError> {
    let contact = contact.clone();
    db.connection()
        .call(move |conn| apply_contact(conn, id, &contact))
        .await
        .map_err(map_tr_err)
}

/// Links a customer to an ERP account code.
pub async fn set_erp_code(db: &Database, phone: &str, erp_code: &str) -> Result<bool, TajerError> {
    let phone = phone.to_string();
    let erp_code = erp_code.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE customers SET erp_code = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE phone = ?2",
                params![erp_code, phone],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
