// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ERP adapter trait for accounting/inventory back-office integration.

use async_trait::async_trait;

use crate::error::TajerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ErpAccount, ErpItem, SaleLine};

/// Adapter for the ERP collaborator.
///
/// All operations are safe to retry. The dialogue engine treats failures
/// as non-fatal: a locally committed order is never rolled back because
/// the ERP rejected or missed the sale.
#[async_trait]
pub trait ErpAdapter: PluginAdapter {
    /// Fetches the ERP item list.
    async fn fetch_items(&self) -> Result<Vec<ErpItem>, TajerError>;

    /// Fetches the ERP customer accounts.
    async fn fetch_accounts(&self) -> Result<Vec<ErpAccount>, TajerError>;

    /// Posts a sale invoice and returns the ERP's invoice reference.
    async fn create_sale(
        &self,
        customer_code: &str,
        items: &[SaleLine],
        notes: &str,
    ) -> Result<String, TajerError>;
}
