// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tajer integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock AI provider with scripted answers
//! - [`MockChannel`] - Mock messaging channel capturing outbound messages
//! - [`MockErp`] - Mock ERP recording posted sales
//! - [`TestHarness`] - Temp SQLite, seeded catalog and a wired engine

pub mod harness;
pub mod mock_channel;
pub mod mock_erp;
pub mod mock_provider;

pub use harness::{TEST_PHONE, TestHarness, default_catalog};
pub use mock_channel::MockChannel;
pub use mock_erp::{MockErp, RecordedSale};
pub use mock_provider::MockProvider;
