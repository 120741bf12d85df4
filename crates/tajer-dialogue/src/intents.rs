// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Universal interrupts: intents recognized in any state, evaluated in a
//! fixed priority order before the state handler runs.

use std::sync::Arc;

use tajer_config::ConfigError;
use tajer_config::model::{CustomAnswerConfig, ShopConfig};
use tajer_core::Language;
use tajer_lang::{CompiledLexicon, IntentKind, IntentMatcher, PhraseMatcher, fold};

use crate::state::ConversationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FaqTopic {
    Hours,
    Location,
    Delivery,
    Contact,
}

/// An intent that short-circuits state dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// Resets to idle. Carries the language of the greeting phrase.
    Greeting(Option<Language>),
    Help,
    ProductList,
    CancelFlow,
    OrderHistory,
    /// Answered from a configured shop fact.
    Faq { topic: FaqTopic, fact: String },
    Custom(String),
}

impl Interrupt {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Interrupt::Greeting(_) => "greeting",
            Interrupt::Help => "help",
            Interrupt::ProductList => "product_list",
            Interrupt::CancelFlow => "cancel",
            Interrupt::OrderHistory => "order_history",
            Interrupt::Faq { .. } => "faq",
            Interrupt::Custom(_) => "custom_answer",
        }
    }

    /// FAQ and custom answers leave the conversation where it was.
    pub fn keeps_state(&self) -> bool {
        matches!(self, Interrupt::Faq { .. } | Interrupt::Custom(_))
    }
}

type Rule = fn(&InterruptRules, &str, &ConversationState) -> Option<Interrupt>;

/// Priority order. Reordering changes which reply wins for overlapping
/// phrases ("cancel order" vs "orders").
const RULES: &[Rule] = &[
    greeting,
    help,
    product_list,
    cancel_flow,
    order_history,
    faq,
    custom_answer,
];

pub struct InterruptRules {
    intents: IntentMatcher,
    faq_facts: Vec<(FaqTopic, IntentKind, String)>,
    custom: Vec<(PhraseMatcher, String)>,
}

impl InterruptRules {
    pub fn new(
        lexicon: Arc<CompiledLexicon>,
        shop: &ShopConfig,
        custom_answers: &[CustomAnswerConfig],
    ) -> Result<Self, ConfigError> {
        let faq_facts = [
            (FaqTopic::Hours, IntentKind::FaqHours, &shop.opening_hours),
            (FaqTopic::Location, IntentKind::FaqLocation, &shop.address),
            (FaqTopic::Delivery, IntentKind::FaqDelivery, &shop.delivery_info),
            (FaqTopic::Contact, IntentKind::FaqContact, &shop.contact_phone),
        ]
        .into_iter()
        .filter_map(|(topic, kind, fact)| fact.clone().map(|fact| (topic, kind, fact)))
        .collect();

        let custom = custom_answers
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let matcher = PhraseMatcher::new(&c.patterns)
                    .map_err(|e| ConfigError::custom_answer(index, &c.patterns.join(", "), e))?;
                Ok((matcher, c.answer.clone()))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            intents: IntentMatcher::new(lexicon),
            faq_facts,
            custom,
        })
    }

    /// The first rule that fires, if any.
    pub fn evaluate(&self, text: &str, state: &ConversationState) -> Option<Interrupt> {
        RULES.iter().find_map(|rule| rule(self, text, state))
    }

    pub fn intents(&self) -> &IntentMatcher {
        &self.intents
    }
}

fn greeting(rules: &InterruptRules, text: &str, state: &ConversationState) -> Option<Interrupt> {
    // "Hala" and "Salam" are names as well as greetings.
    if matches!(state, ConversationState::AwaitingName(_)) {
        return None;
    }
    rules
        .intents
        .matches(IntentKind::Greeting, text)
        .map(|m| Interrupt::Greeting(m.language))
}

fn help(rules: &InterruptRules, text: &str, _: &ConversationState) -> Option<Interrupt> {
    rules.intents.is(IntentKind::Help, text).then_some(Interrupt::Help)
}

fn product_list(rules: &InterruptRules, text: &str, _: &ConversationState) -> Option<Interrupt> {
    rules
        .intents
        .is(IntentKind::ProductList, text)
        .then_some(Interrupt::ProductList)
}

fn cancel_flow(rules: &InterruptRules, text: &str, state: &ConversationState) -> Option<Interrupt> {
    (!state.is_idle() && rules.intents.is(IntentKind::Cancel, text)).then_some(Interrupt::CancelFlow)
}

fn order_history(rules: &InterruptRules, text: &str, state: &ConversationState) -> Option<Interrupt> {
    (!state.collects_free_text() && rules.intents.is(IntentKind::OrderHistory, text))
        .then_some(Interrupt::OrderHistory)
}

fn faq(rules: &InterruptRules, text: &str, state: &ConversationState) -> Option<Interrupt> {
    if state.collects_free_text() {
        return None;
    }
    rules
        .faq_facts
        .iter()
        .find(|(_, kind, _)| rules.intents.is(*kind, text))
        .map(|(topic, _, fact)| Interrupt::Faq {
            topic: *topic,
            fact: fact.clone(),
        })
}

fn custom_answer(rules: &InterruptRules, text: &str, state: &ConversationState) -> Option<Interrupt> {
    if state.collects_free_text() {
        return None;
    }
    let folded = fold(text);
    rules
        .custom
        .iter()
        .find(|(matcher, _)| matcher.is_match(&folded))
        .map(|(_, answer)| Interrupt::Custom(answer.clone()))
}
