// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guided order collection: input checks, step sequencing and commit.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tajer_core::types::{ContactUpdate, Customer, NewOrder, Order, OrderItem, SaleLine};
use tajer_core::{ErpAdapter, StorageAdapter, TajerError};
use tajer_lang::{fold_numerals, parse_number};
use tracing::{info, warn};

use crate::state::PendingOrder;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").unwrap());

/// Outcome of checking a quantity reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityCheck {
    Valid(i64),
    NotANumber,
    TooLow,
    /// Above the per-order cap.
    AboveMax(i64),
    /// Above live stock.
    AboveStock(i64),
}

/// Accepts `q` iff `1 <= q <= min(max, stock)`. Digits in any script count.
pub fn check_quantity(text: &str, stock: i64, max: i64) -> QuantityCheck {
    let trimmed = text.trim();
    if let Some(magnitude) = trimmed.strip_prefix('-') {
        if is_digit_run(magnitude) {
            return QuantityCheck::TooLow;
        }
    }
    if !is_digit_run(trimmed) {
        return QuantityCheck::NotANumber;
    }
    // Too large for u64 or i64: more than any stock.
    let Some(quantity) = parse_number(trimmed).and_then(|v| i64::try_from(v).ok()) else {
        return QuantityCheck::AboveStock(stock);
    };
    if quantity < 1 {
        QuantityCheck::TooLow
    } else if quantity > stock {
        QuantityCheck::AboveStock(stock)
    } else if quantity > max {
        QuantityCheck::AboveMax(max)
    } else {
        QuantityCheck::Valid(quantity)
    }
}

/// Whether `text` is a plain number in any digit script, however large.
fn is_digit_run(text: &str) -> bool {
    let folded = fold_numerals(text);
    let digits = folded.trim().trim_end_matches(['.', ')']).trim();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Trimmed, whitespace-collapsed text when it has at least `min` chars.
fn long_enough(text: &str, min: usize) -> Option<String> {
    let value = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (value.chars().count() >= min).then_some(value)
}

pub fn check_name(text: &str, min: usize) -> Option<String> {
    long_enough(text, min)
}

pub fn check_address(text: &str, min: usize) -> Option<String> {
    long_enough(text, min)
}

pub fn check_email(text: &str) -> Option<String> {
    let value = text.trim();
    EMAIL.is_match(value).then(|| value.to_lowercase())
}

/// What the flow needs next once a quantity is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    AskName,
    AskAddress,
    AskEmail,
    Commit,
}

/// Name, then address, then (only right after a newly collected address)
/// email. Fields already on the customer record are skipped.
pub fn next_step(pending: &PendingOrder, customer: &Customer, collect_email: bool) -> NextStep {
    if pending.name.is_none() && customer.name.is_none() {
        NextStep::AskName
    } else if pending.address.is_none() && customer.address.is_none() {
        NextStep::AskAddress
    } else if collect_email && pending.address.is_some() && customer.email.is_none() {
        NextStep::AskEmail
    } else {
        NextStep::Commit
    }
}

/// Writes orders and posts them to the ERP.
#[derive(Clone)]
pub struct OrderFlow {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    erp: Option<Arc<dyn ErpAdapter + Send + Sync>>,
}

impl OrderFlow {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        erp: Option<Arc<dyn ErpAdapter + Send + Sync>>,
    ) -> Self {
        Self { storage, erp }
    }

    /// Commits one order with one line. The order, its item and the
    /// newly collected contact fields are written in one transaction. The
    /// ERP post that follows is best effort.
    pub async fn commit(
        &self,
        customer: &Customer,
        pending: &PendingOrder,
        email: Option<String>,
    ) -> Result<Order, TajerError> {
        let new_order = NewOrder {
            customer_id: customer.id,
            items: vec![OrderItem {
                product_code: pending.product.code.clone(),
                product_name: pending.product.name.clone(),
                quantity: pending.quantity,
                unit_price: pending.product.price,
            }],
            notes: None,
            contact: ContactUpdate {
                name: pending.name.clone(),
                address: pending.address.clone(),
                email,
            },
        };
        let order = self.storage.create_order(&new_order).await?;
        info!(
            customer_id = customer.id,
            order_id = order.id,
            total = order.total,
            "order created"
        );

        self.post_to_erp(customer, &order).await;
        Ok(order)
    }

    async fn post_to_erp(&self, customer: &Customer, order: &Order) {
        let Some(erp) = &self.erp else {
            return;
        };
        let account = customer.erp_code.as_deref().unwrap_or(&customer.phone);
        let lines: Vec<SaleLine> = order.items.iter().map(SaleLine::from).collect();
        let notes = format!("WhatsApp order #{}", order.id);
        match erp.create_sale(account, &lines, &notes).await {
            Ok(invoice) => info!(order_id = order.id, invoice = %invoice, "order posted to ERP"),
            Err(e) => warn!(
                order_id = order.id,
                error = %e,
                "ERP posting failed, order kept locally"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::state::ProductRef;

    fn customer(name: Option<&str>, address: Option<&str>, email: Option<&str>) -> Customer {
        Customer {
            id: 1,
            phone: "+96170123456".into(),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            address: address.map(str::to_string),
            language: None,
            erp_code: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn pending(name: Option<&str>, address: Option<&str>) -> PendingOrder {
        PendingOrder {
            product: ProductRef {
                code: "P1".into(),
                name: "Blue pen".into(),
                price: 1.0,
            },
            quantity: 2,
            name: name.map(str::to_string),
            address: address.map(str::to_string),
        }
    }

    #[test]
    fn quantity_bounds() {
        assert_eq!(check_quantity("3", 10, 1000), QuantityCheck::Valid(3));
        assert_eq!(check_quantity("٣", 10, 1000), QuantityCheck::Valid(3));
        assert_eq!(check_quantity("0", 10, 1000), QuantityCheck::TooLow);
        assert_eq!(check_quantity("-2", 10, 1000), QuantityCheck::TooLow);
        assert_eq!(check_quantity("11", 10, 1000), QuantityCheck::AboveStock(10));
        assert_eq!(check_quantity("1001", 5000, 1000), QuantityCheck::AboveMax(1000));
        assert_eq!(check_quantity("two", 10, 1000), QuantityCheck::NotANumber);
        assert_eq!(
            check_quantity("99999999999999999999999", 10, 1000),
            QuantityCheck::AboveStock(10)
        );
        assert_eq!(
            check_quantity("٩٩٩٩٩٩٩٩٩٩٩٩٩٩٩٩٩٩٩٩٩٩", 10, 1000),
            QuantityCheck::AboveStock(10)
        );
        assert_eq!(
            check_quantity("-99999999999999999999999", 10, 1000),
            QuantityCheck::TooLow
        );
    }

    proptest! {
        #[test]
        fn quantity_accepted_iff_within_bounds(q in -5i64..1200, stock in 0i64..1500) {
            let accepted = matches!(check_quantity(&q.to_string(), stock, 1000), QuantityCheck::Valid(_));
            prop_assert_eq!(accepted, 1 <= q && q <= stock.min(1000));
        }
    }

    #[test]
    fn names_and_addresses_need_min_chars() {
        assert_eq!(check_name("  Rami   Khoury ", 2).as_deref(), Some("Rami Khoury"));
        assert_eq!(check_name("R", 2), None);
        assert_eq!(check_name("رامي", 2).as_deref(), Some("رامي"));
        assert_eq!(check_address("Hamra", 5).as_deref(), Some("Hamra"));
        assert_eq!(check_address("Bey", 5), None);
    }

    #[test]
    fn email_format() {
        assert_eq!(check_email(" Rami@Example.com ").as_deref(), Some("rami@example.com"));
        assert_eq!(check_email("rami@example"), None);
        assert_eq!(check_email("not an email"), None);
    }

    #[test]
    fn known_fields_are_skipped() {
        let known = customer(Some("Rami"), Some("Hamra, Beirut"), None);
        assert_eq!(next_step(&pending(None, None), &known, true), NextStep::Commit);

        let fresh = customer(None, None, None);
        assert_eq!(next_step(&pending(None, None), &fresh, true), NextStep::AskName);
        assert_eq!(
            next_step(&pending(Some("Rami"), None), &fresh, true),
            NextStep::AskAddress
        );
        assert_eq!(
            next_step(&pending(Some("Rami"), Some("Hamra")), &fresh, true),
            NextStep::AskEmail
        );
        assert_eq!(
            next_step(&pending(Some("Rami"), Some("Hamra")), &fresh, false),
            NextStep::Commit
        );

        let has_email = customer(None, None, Some("r@example.com"));
        assert_eq!(
            next_step(&pending(Some("Rami"), Some("Hamra")), &has_email, true),
            NextStep::Commit
        );
    }
}
