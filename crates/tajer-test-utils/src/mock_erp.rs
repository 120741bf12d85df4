// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock ERP adapter recording posted sales.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tajer_core::TajerError;
use tajer_core::traits::adapter::PluginAdapter;
use tajer_core::traits::erp::ErpAdapter;
use tajer_core::types::{AdapterType, ErpAccount, ErpItem, HealthStatus, SaleLine};

/// A sale as received by [`MockErp`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSale {
    pub customer_code: String,
    pub items: Vec<SaleLine>,
    pub notes: String,
}

pub struct MockErp {
    items: Vec<ErpItem>,
    accounts: Vec<ErpAccount>,
    sales: Arc<Mutex<Vec<RecordedSale>>>,
    failing: AtomicBool,
}

impl MockErp {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            accounts: Vec::new(),
            sales: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_items(mut self, items: Vec<ErpItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_accounts(mut self, accounts: Vec<ErpAccount>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Make every call fail as if retries were exhausted.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sales(&self) -> Vec<RecordedSale> {
        self.sales.lock().await.clone()
    }

    fn check(&self) -> Result<(), TajerError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(TajerError::Erp {
                message: "mock ERP unavailable".into(),
                source: None,
            })
        } else {
            Ok(())
        }
    }
}

impl Default for MockErp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockErp {
    fn name(&self) -> &str {
        "mock-erp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Erp
    }

    async fn health_check(&self) -> Result<HealthStatus, TajerError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TajerError> {
        Ok(())
    }
}

#[async_trait]
impl ErpAdapter for MockErp {
    async fn fetch_items(&self) -> Result<Vec<ErpItem>, TajerError> {
        self.check()?;
        Ok(self.items.clone())
    }

    async fn fetch_accounts(&self) -> Result<Vec<ErpAccount>, TajerError> {
        self.check()?;
        Ok(self.accounts.clone())
    }

    async fn create_sale(
        &self,
        customer_code: &str,
        items: &[SaleLine],
        notes: &str,
    ) -> Result<String, TajerError> {
        self.check()?;
        let mut sales = self.sales.lock().await;
        sales.push(RecordedSale {
            customer_code: customer_code.to_string(),
            items: items.to_vec(),
            notes: notes.to_string(),
        });
        Ok(format!("INV-{}", sales.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sales_with_increasing_invoice_ids() {
        let erp = MockErp::new();
        let line = SaleLine {
            product_code: "NB-1".into(),
            quantity: 2,
            unit_price: 3.5,
        };
        assert_eq!(erp.create_sale("C-1", &[line.clone()], "a").await.unwrap(), "INV-1");
        assert_eq!(erp.create_sale("C-2", &[line], "b").await.unwrap(), "INV-2");
        let sales = erp.sales().await;
        assert_eq!(sales[1].customer_code, "C-2");
    }

    #[tokio::test]
    async fn failing_mode_rejects_every_call() {
        let erp = MockErp::new();
        erp.set_failing(true);
        assert!(erp.fetch_items().await.is_err());
        assert!(erp.create_sale("C-1", &[], "x").await.is_err());
        assert!(erp.sales().await.is_empty());
    }
}
