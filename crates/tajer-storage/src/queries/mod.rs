// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each function takes `&Database` and runs one
//! closure on the shared connection.

pub mod conversation;
pub mod customers;
pub mod messages;
pub mod orders;
pub mod products;
