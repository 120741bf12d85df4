// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tajer commerce bot.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Tajer workspace. Every external
//! collaborator (storage, messaging gateway, AI fallback, ERP) is reached
//! through a trait defined here.

pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TajerError;
pub use phone::normalize_phone;
pub use types::{AdapterType, HealthStatus, Language, MessageId};

pub use traits::{ChannelAdapter, ErpAdapter, PluginAdapter, ProviderAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewOrder, OrderItem, OrderStatus};

    #[test]
    fn tajer_error_has_all_variants() {
        let _config = TajerError::Config("test".into());
        let _storage = TajerError::storage(std::io::Error::other("test"));
        let _channel = TajerError::Channel {
            message: "test".into(),
            source: None,
        };
        let _provider = TajerError::Provider {
            message: "test".into(),
            source: None,
        };
        let _erp = TajerError::Erp {
            message: "test".into(),
            source: None,
        };
        let _not_found = TajerError::AdapterNotFound {
            adapter_type: "Channel".into(),
            name: "test".into(),
        };
        let _health = TajerError::HealthCheckFailed {
            name: "test".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = TajerError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = TajerError::Internal("test".into());
    }

    #[test]
    fn language_codes_round_trip() {
        use std::str::FromStr;

        for lang in Language::ALL {
            let code = lang.to_string();
            assert_eq!(Language::from_str(&code).unwrap(), lang);
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
        assert_eq!(Language::Ar.to_string(), "ar");
    }

    #[test]
    fn order_status_codes() {
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
        assert_eq!(
            "cancelled".parse::<OrderStatus>().unwrap(),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn new_order_total_sums_lines() {
        let order = NewOrder {
            customer_id: 1,
            items: vec![
                OrderItem {
                    product_code: "P1".into(),
                    product_name: "Pen".into(),
                    quantity: 3,
                    unit_price: 1.5,
                },
                OrderItem {
                    product_code: "P2".into(),
                    product_name: "Ruler".into(),
                    quantity: 1,
                    unit_price: 2.0,
                },
            ],
            notes: None,
            contact: Default::default(),
        };
        assert!((order.total() - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_erp_adapter<T: ErpAdapter>() {}
    }
}
