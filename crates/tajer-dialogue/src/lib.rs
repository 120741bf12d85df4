// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multilingual dialogue engine for the Tajer commerce bot.
//!
//! This crate provides:
//! - [`DialogueEngine`]: the message router and state machine
//! - [`ConversationStore`]: typed per-customer conversation state
//! - [`ProductSearch`]: catalog search with sort directives
//! - [`OrderFlow`]: guided order collection and commit
//! - [`AiFallback`]: the AI collaborator contract used when search finds nothing

pub mod catalog;
pub mod fallback;
pub mod intents;
pub mod order;
pub mod pagination;
pub mod replies;
pub mod router;
pub mod state;

pub use catalog::{ProductSearch, rank};
pub use fallback::{AiFallback, AiVerdict, parse_verdict};
pub use intents::{FaqTopic, Interrupt, InterruptRules};
pub use order::{OrderFlow, QuantityCheck, check_quantity};
pub use pagination::{Page, paginate};
pub use router::{DialogueEngine, ImageAttachment, Reply};
pub use state::{Conversation, ConversationState, ConversationStore};
