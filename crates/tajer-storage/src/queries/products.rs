// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product catalog queries.

use rusqlite::{OptionalExtension, Row, params};
use tajer_core::TajerError;
use tajer_core::types::{Product, ProductUpsert};

use crate::database::{Database, map_tr_err};

const PRODUCT_COLUMNS: &str = "id, code, name, price, quantity, category, image_url";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        price: row.get(3)?,
        quantity: row.get(4)?,
        category: row.get(5)?,
        image_url: row.get(6)?,
    })
}

/// Escapes LIKE wildcards so user text matches literally.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn query_products(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<Product>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, product_from_row)?;
    rows.collect()
}

/// Substring search over product names, in catalog order.
///
/// The whole phrase is tried first. When it matches nothing and the phrase
/// has several words, every word must appear somewhere in the name.
/// An empty term lists the catalog from the start.
pub async fn search(db: &Database, term: &str, limit: usize) -> Result<Vec<Product>, TajerError> {
    let term = term.trim().to_string();
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            if term.is_empty() {
                return query_products(
                    conn,
                    &format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id LIMIT ?1"),
                    &[&limit],
                );
            }

            let phrase = like_pattern(&term);
            let found = query_products(
                conn,
                &format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products
                     WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT ?2"
                ),
                &[&phrase, &limit],
            )?;

            let words: Vec<String> = term.split_whitespace().map(like_pattern).collect();
            if !found.is_empty() || words.len() < 2 {
                return Ok(found);
            }

            let clauses = (1..=words.len())
                .map(|i| format!("name LIKE ?{i} ESCAPE '\\'"))
                .collect::<Vec<_>>()
                .join(" AND ");
            let sql = format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE {clauses} ORDER BY id LIMIT ?{}",
                words.len() + 1
            );
            let mut bound: Vec<&dyn rusqlite::ToSql> =
                words.iter().map(|w| w as &dyn rusqlite::ToSql).collect();
            bound.push(&limit);
            query_products(conn, &sql, &bound)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_by_code(db: &Database, code: &str) -> Result<Option<Product>, TajerError> {
    let code = code.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1"),
                params![code],
                product_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list(db: &Database, offset: usize, limit: usize) -> Result<Vec<Product>, TajerError> {
    let (offset, limit) = (offset as i64, limit as i64);
    db.connection()
        .call(move |conn| {
            query_products(
                conn,
                &format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id LIMIT ?1 OFFSET ?2"),
                &[&limit, &offset],
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count(db: &Database) -> Result<usize, TajerError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
        })
        .await
        .map(|n| n as usize)
        .map_err(map_tr_err)
}

pub async fn list_in_stock(db: &Database, limit: usize) -> Result<Vec<Product>, TajerError> {
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            query_products(
                conn,
                &format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE quantity > 0 ORDER BY id LIMIT ?1"
                ),
                &[&limit],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts a product, or updates every field of the existing one with the same code.
pub async fn upsert(db: &Database, product: &ProductUpsert) -> Result<(), TajerError> {
    let p = product.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO products (code, name, price, quantity, category, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(code) DO UPDATE SET
                    name = excluded.name,
                    price = excluded.price,
                    quantity = excluded.quantity,
                    category = excluded.category,
                    image_url = excluded.image_url,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![p.code, p.name, p.price, p.quantity, p.category, p.image_url],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
