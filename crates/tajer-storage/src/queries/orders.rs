// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order creation and history.

use rusqlite::{OptionalExtension, params};
use tajer_core::TajerError;
use tajer_core::types::{NewOrder, Order, OrderItem, OrderStatus};

use crate::database::{Database, map_tr_err};
use crate::queries::customers::apply_contact;

fn load_items(conn: &rusqlite::Connection, order_id: i64) -> rusqlite::Result<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT product_code, product_name, quantity, unit_price
         FROM order_items WHERE order_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![order_id], |row| {
        Ok(OrderItem {
            product_code: row.get(0)?,
            product_name: row.get(1)?,
            quantity: row.get(2)?,
            unit_price: row.get(3)?,
        })
    })?;
    rows.collect()
}

fn load_order(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Order>> {
    let header = conn
        .query_row(
            "SELECT id, customer_id, status, total, notes, created_at FROM orders WHERE id = ?1",
            params![id],
            |row| {
                let status: String = row.get(2)?;
                let status = status.parse::<OrderStatus>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(Order {
                    id: row.get(0)?,
                    customer_id: row.get(1)?,
                    status,
                    total: row.get(3)?,
                    notes: row.get(4)?,
                    created_at: row.get(5)?,
                    items: Vec::new(),
                })
            },
        )
        .optional()?;
    match header {
        Some(mut order) => {
            order.items = load_items(conn, order.id)?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

/// Writes the order, its items and the customer contact update in one transaction.
pub async fn create(db: &Database, new_order: &NewOrder) -> Result<Order, TajerError> {
    let new_order = new_order.clone();
    let total = new_order.total();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO orders (customer_id, status, total, notes) VALUES (?1, ?2, ?3, ?4)",
                params![
                    new_order.customer_id,
                    OrderStatus::Pending.to_string(),
                    total,
                    new_order.notes,
                ],
            )?;
            let order_id = tx.last_insert_rowid();
            for item in &new_order.items {
                tx.execute(
                    "INSERT INTO order_items (order_id, product_code, product_name, quantity, unit_price)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        order_id,
                        item.product_code,
                        item.product_name,
                        item.quantity,
                        item.unit_price,
                    ],
                )?;
            }
            apply_contact(&tx, new_order.customer_id, &new_order.contact)?;
            let order = load_order(&tx, order_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(order)
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent orders first.
pub async fn list_for_customer(
    db: &Database,
    customer_id: i64,
    limit: usize,
) -> Result<Vec<Order>, TajerError> {
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            let ids: Vec<i64> = {
                let mut stmt = conn.prepare(
                    "SELECT id FROM orders WHERE customer_id = ?1 ORDER BY id DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![customer_id, limit], |row| row.get(0))?;
                rows.collect::<rusqlite::Result<_>>()?
            };
            let mut orders = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(order) = load_order(conn, id)? {
                    orders.push(order);
                }
            }
            Ok(orders)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, id: i64) -> Result<Option<Order>, TajerError> {
    db.connection()
        .call(move |conn| load_order(conn, id))
        .await
        .map_err(map_tr_err)
}

pub async fn update_status(db: &Database, id: i64, status: OrderStatus) -> Result<(), TajerError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE orders SET status = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status, id],
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
    use tajer_core::types::ContactUpdate;
    use tempfile::tempdir;

    async fn setup_db_with_customer() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let customer = customers::upsert(&db, "+96170123456").await.unwrap();
        (db, customer.id, dir)
    }

    fn pen_order(customer_id: i64, quantity: i64, contact: ContactUpdate) -> NewOrder {
        NewOrder {
            customer_id,
            items: vec![OrderItem {
                product_code: "P1".into(),
                product_name: "Blue Pen".into(),
                quantity,
                unit_price: 1.5,
            }],
            notes: None,
            contact,
        }
    }

    #[tokio::test]
    async fn create_writes_order_items_and_contact() {
        let (db, customer_id, _dir) = setup_db_with_customer().await;
        let order = create(
            &db,
            &pen_order(
                customer_id,
                4,
                ContactUpdate {
                    name: Some("Rami".into()),
                    address: Some("Hamra street".into()),
                    email: None,
                },
            ),
        )
        .await
        .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, 6.0);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 4);

        let customer = customers::get(&db, customer_id).await.unwrap().unwrap();
        assert_eq!(customer.name.as_deref(), Some("Rami"));
        assert_eq!(customer.address.as_deref(), Some("Hamra street"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_item_insert_rolls_back_everything() {
        let (db, customer_id, _dir) = setup_db_with_customer().await;
        // quantity 0 violates the CHECK constraint on order_items.
        let result = create(
            &db,
            &pen_order(
                customer_id,
                0,
                ContactUpdate {
                    name: Some("Rami".into()),
                    ..Default::default()
                },
            ),
        )
        .await;
        assert!(result.is_err());
        assert!(list_for_customer(&db, customer_id, 10).await.unwrap().is_empty());
        let customer = customers::get(&db, customer_id).await.unwrap().unwrap();
        assert!(customer.name.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn history_is_newest_first_and_status_updates() {
        let (db, customer_id, _dir) = setup_db_with_customer().await;
        let first = create(&db, &pen_order(customer_id, 1, ContactUpdate::default()))
            .await
            .unwrap();
        let second = create(&db, &pen_order(customer_id, 2, ContactUpdate::default()))
            .await
            .unwrap();

        let history = list_for_customer(&db, customer_id, 10).await.unwrap();
        assert_eq!(history.iter().map(|o| o.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        update_status(&db, first.id, OrderStatus::Cancelled).await.unwrap();
        let reloaded = get(&db, first.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Cancelled);
        assert!(get(&db, 9999).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
