// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dialogue router: one inbound message in, exactly one reply out.
//!
//! Each message resolves the customer, their language and their current
//! state, then goes through the universal interrupts before the handler
//! for the current state runs. Deliveries for the same phone number are
//! serialized so two rapid messages never interleave their state updates.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde_json::json;
use tajer_config::model::{DialogueConfig, TajerConfig};
use tajer_core::types::{Customer, MessageDirection, OrderStatus, Product};
use tajer_core::{ErpAdapter, Language, ProviderAdapter, StorageAdapter, TajerError, normalize_phone};
use tajer_lang::{CompiledLexicon, IntentKind, LanguageDetector, Normalizer, parse_number};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::catalog::ProductSearch;
use crate::fallback::{AiFallback, AiVerdict};
use crate::intents::{FaqTopic, Interrupt, InterruptRules};
use crate::order::{
    NextStep, OrderFlow, QuantityCheck, check_address, check_email, check_name, check_quantity,
    next_step,
};
use crate::pagination::{self, clamp_page, next_page, paginate, previous_page};
use crate::replies::{self, ListKind};
use crate::state::{
    CatalogPage, ConversationState, ConversationStore, OrderChoices, PendingOrder,
    PendingProduct, ProductRef, SearchResults,
};

/// Orders listed by the order-history view.
const ORDER_HISTORY_LIMIT: usize = 5;

/// An image sent ahead of the reply text.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub url: String,
    pub caption: Option<String>,
}

/// The engine's answer to one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub image: Option<ImageAttachment>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, url: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            text: text.into(),
            image: Some(ImageAttachment {
                url: url.into(),
                caption,
            }),
        }
    }
}

/// Per-message context handed to the state handlers.
struct Turn<'a> {
    customer: &'a Customer,
    language: Language,
    text: &'a str,
}

impl Turn<'_> {
    fn id(&self) -> i64 {
        self.customer.id
    }
}

pub struct DialogueEngine {
    shop_name: String,
    default_language: Language,
    country_code: String,
    settings: DialogueConfig,
    ai_max_tokens: u32,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    store: ConversationStore,
    detector: LanguageDetector,
    normalizer: Normalizer,
    interrupts: InterruptRules,
    search: ProductSearch,
    orders: OrderFlow,
    fallback: AiFallback,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DialogueEngine {
    /// Builds an engine without AI fallback or ERP posting.
    pub fn new(
        config: &TajerConfig,
        lexicon: Arc<CompiledLexicon>,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
    ) -> Result<Self, TajerError> {
        let default_language = config.shop.default_language.parse::<Language>().map_err(|_| {
            TajerError::Config(format!(
                "unknown default language `{}`",
                config.shop.default_language
            ))
        })?;
        let interrupts = InterruptRules::new(lexicon.clone(), &config.shop, &config.custom_answers)?;

        Ok(Self {
            shop_name: config.shop.name.clone(),
            default_language,
            country_code: config.shop.default_country_code.clone(),
            settings: config.dialogue.clone(),
            ai_max_tokens: config.anthropic.max_tokens,
            store: ConversationStore::new(storage.clone()),
            detector: LanguageDetector::new(lexicon.clone()),
            normalizer: Normalizer::new(lexicon),
            interrupts,
            search: ProductSearch::new(storage.clone(), config.dialogue.search_limit),
            orders: OrderFlow::new(storage.clone(), None),
            fallback: AiFallback::disabled(),
            locks: DashMap::new(),
            storage,
        })
    }

    /// Enables the AI fallback stages.
    pub fn with_provider(mut self, provider: Arc<dyn ProviderAdapter + Send + Sync>) -> Self {
        self.fallback = AiFallback::new(Some(provider), self.ai_max_tokens);
        self
    }

    /// Posts committed orders to the ERP.
    pub fn with_erp(mut self, erp: Arc<dyn ErpAdapter + Send + Sync>) -> Self {
        self.orders = OrderFlow::new(self.storage.clone(), Some(erp));
        self
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Handles one inbound message. Never fails: every error ends in the
    /// localized apology, and an in-flow failure also resets the state.
    pub async fn handle_message(&self, phone: &str, text: &str) -> Reply {
        let Some(phone) = normalize_phone(phone, &self.country_code) else {
            warn!(phone, "ignoring message from unparseable phone number");
            return Reply::text(replies::generic_error(self.default_language));
        };

        let lock = self.locks.entry(phone.clone()).or_default().clone();
        let _guard = lock.lock().await;

        let customer = match self.storage.upsert_customer(&phone).await {
            Ok(customer) => customer,
            Err(e) => {
                error!(error = %e, "failed to resolve customer");
                return Reply::text(replies::generic_error(self.default_language));
            }
        };

        let mut language = customer.language.unwrap_or(self.default_language);
        let reply = match self.respond(&customer, text, &mut language).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(customer_id = customer.id, error = %e, "failed to handle message");
                if let Err(e) = self.store.clear(customer.id).await {
                    warn!(customer_id = customer.id, error = %e, "failed to reset conversation");
                }
                Reply::text(replies::generic_error(language))
            }
        };

        if let Err(e) = self
            .storage
            .append_message(customer.id, MessageDirection::Outbound, &reply.text)
            .await
        {
            warn!(customer_id = customer.id, error = %e, "failed to log outbound message");
        }
        reply
    }

    async fn respond(
        &self,
        customer: &Customer,
        text: &str,
        language: &mut Language,
    ) -> Result<Reply, TajerError> {
        let previous_inbound = self.storage.last_inbound_at(customer.id).await?;
        self.storage
            .append_message(customer.id, MessageDirection::Inbound, text)
            .await?;
        let conversation = self.store.load(customer.id).await?;

        let known = conversation
            .language
            .or(customer.language)
            .unwrap_or(self.default_language);
        *language = self.detector.resolve(text, known);

        let interrupt = self.interrupts.evaluate(text, &conversation.state);
        if let Some(Interrupt::Greeting(Some(greeted))) = &interrupt {
            *language = *greeted;
        }
        let lang = *language;
        if conversation.language != Some(lang) {
            self.store.set_language(customer.id, lang).await?;
        }
        if customer.language != Some(lang) {
            self.storage.update_customer_language(customer.id, lang).await?;
        }

        let turn = Turn {
            customer,
            language: lang,
            text,
        };
        match interrupt {
            Some(interrupt) => {
                debug!(
                    customer_id = customer.id,
                    state = %conversation.state,
                    language = %lang,
                    intent = interrupt.label(),
                    "universal interrupt"
                );
                let returning = self.is_returning(previous_inbound.as_deref());
                self.on_interrupt(&turn, interrupt, returning).await
            }
            None => {
                debug!(
                    customer_id = customer.id,
                    state = %conversation.state,
                    language = %lang,
                    "dispatching to state handler"
                );
                self.on_state(&turn, conversation.state).await
            }
        }
    }

    /// True when the last inbound message before this one is more than
    /// `returning_after_hours` old.
    fn is_returning(&self, previous_inbound: Option<&str>) -> bool {
        previous_inbound
            .and_then(|at| DateTime::parse_from_rfc3339(at).ok())
            .is_some_and(|at| {
                let elapsed = Utc::now().signed_duration_since(at.with_timezone(&Utc));
                elapsed > TimeDelta::hours(self.settings.returning_after_hours)
            })
    }

    async fn on_interrupt(
        &self,
        turn: &Turn<'_>,
        interrupt: Interrupt,
        returning: bool,
    ) -> Result<Reply, TajerError> {
        let lang = turn.language;
        if !interrupt.keeps_state() && !matches!(interrupt, Interrupt::OrderHistory) {
            self.store.clear(turn.id()).await?;
        }
        match interrupt {
            Interrupt::Greeting(_) => Ok(Reply::text(replies::greeting(
                lang,
                &self.shop_name,
                returning,
            ))),
            Interrupt::Help => Ok(Reply::text(replies::help(lang))),
            Interrupt::ProductList => self.show_catalog_page(turn, 1).await,
            Interrupt::CancelFlow => {
                info!(customer_id = turn.id(), "flow cancelled by customer");
                Ok(Reply::text(replies::flow_cancelled(lang)))
            }
            Interrupt::OrderHistory => self.show_order_history(turn).await,
            Interrupt::Faq { topic, fact } => Ok(Reply::text(match topic {
                FaqTopic::Hours => replies::faq_hours(lang, &fact),
                FaqTopic::Location => replies::faq_location(lang, &fact),
                FaqTopic::Delivery => replies::faq_delivery(lang, &fact),
                FaqTopic::Contact => replies::faq_contact(lang, &fact),
            })),
            Interrupt::Custom(answer) => Ok(Reply::text(answer)),
        }
    }

    async fn on_state(&self, turn: &Turn<'_>, state: ConversationState) -> Result<Reply, TajerError> {
        match state {
            ConversationState::Idle => self.on_idle(turn).await,
            ConversationState::AwaitingProductSelection(results) => {
                self.on_search_results(turn, results).await
            }
            ConversationState::BrowsingCatalog(page) => self.on_catalog_page(turn, page).await,
            ConversationState::ConfirmingProduct(pending) => self.on_confirming(turn, pending).await,
            ConversationState::AwaitingQuantity(pending) => self.on_quantity(turn, pending).await,
            ConversationState::AwaitingName(order) => self.on_name(turn, order).await,
            ConversationState::AwaitingAddress(order) => self.on_address(turn, order).await,
            ConversationState::AwaitingEmail(order) => self.on_email(turn, order).await,
            ConversationState::AwaitingOrderCancel(choices) => {
                self.on_order_cancel(turn, choices).await
            }
        }
    }

    /// Leaves the current step and treats the message as a fresh request.
    async fn restart(&self, turn: &Turn<'_>) -> Result<Reply, TajerError> {
        self.store.clear(turn.id()).await?;
        self.on_idle(turn).await
    }

    // --- Idle: search, then AI fallback ---

    async fn on_idle(&self, turn: &Turn<'_>) -> Result<Reply, TajerError> {
        if parse_number(turn.text).is_some() {
            return Ok(Reply::text(replies::numeric_in_idle(turn.language)));
        }

        let query = self.normalizer.normalize(turn.text);
        if !query.term.is_empty() || query.directive.is_some() {
            let products = self.search.search_query(&query).await?;
            debug!(
                customer_id = turn.id(),
                term = %query.term,
                directive = ?query.directive,
                hits = products.len(),
                "quick search"
            );
            if !products.is_empty() {
                return self.show_search_results(turn, &products).await;
            }
        }
        self.ai_fallback(turn).await
    }

    async fn ai_fallback(&self, turn: &Turn<'_>) -> Result<Reply, TajerError> {
        let lang = turn.language;
        if self.fallback.is_enabled() {
            let snapshot = self
                .storage
                .list_in_stock_products(self.settings.ai_snapshot_limit)
                .await?;
            match self.fallback.classify(turn.text, lang, &snapshot).await {
                Ok(verdict) => {
                    if let Some(reply) = self.apply_verdict(turn, verdict).await? {
                        return Ok(reply);
                    }
                }
                Err(e) => warn!(customer_id = turn.id(), error = %e, "AI product match failed"),
            }

            match self.fallback.converse(turn.text, lang, &self.shop_name).await {
                Ok(Some(answer)) => return Ok(Reply::text(answer)),
                Ok(None) => {}
                Err(e) => warn!(customer_id = turn.id(), error = %e, "AI conversation failed"),
            }
        }
        Ok(Reply::text(replies::not_understood(lang)))
    }

    async fn apply_verdict(
        &self,
        turn: &Turn<'_>,
        verdict: AiVerdict,
    ) -> Result<Option<Reply>, TajerError> {
        match verdict {
            AiVerdict::Codes(codes) => {
                let mut products: Vec<Product> = Vec::new();
                for code in &codes {
                    if let Some(product) = self.storage.get_product_by_code(code).await? {
                        if !products.iter().any(|p| p.code == product.code) {
                            products.push(product);
                        }
                    }
                }
                if products.is_empty() {
                    debug!(customer_id = turn.id(), ?codes, "AI codes matched no product");
                    return Ok(None);
                }
                self.show_search_results(turn, &products).await.map(Some)
            }
            AiVerdict::NoMatch => Ok(Some(Reply::text(replies::not_in_stock(turn.language)))),
            AiVerdict::FreeText(text) => Ok(Some(Reply::text(text))),
            AiVerdict::Empty => Ok(None),
        }
    }

    // --- Product lists ---

    async fn show_search_results(
        &self,
        turn: &Turn<'_>,
        products: &[Product],
    ) -> Result<Reply, TajerError> {
        let refs: Vec<ProductRef> = products.iter().map(ProductRef::from).collect();
        let page = paginate(&refs, 1, self.settings.page_size);
        let text = replies::product_page(
            turn.language,
            ListKind::SearchResults,
            &page.items,
            page.number,
            page.page_count,
        );
        self.store
            .set(
                turn.id(),
                &ConversationState::AwaitingProductSelection(SearchResults {
                    products: refs,
                    page: page.number,
                    page_count: page.page_count,
                }),
            )
            .await?;
        Ok(Reply::text(text))
    }

    /// Next page only. "Previous" is not a command here and reads as a
    /// new search.
    async fn on_search_results(
        &self,
        turn: &Turn<'_>,
        results: SearchResults,
    ) -> Result<Reply, TajerError> {
        let page_size = self.settings.page_size;
        if self.interrupts.intents().is(IntentKind::Next, turn.text) {
            let page = next_page(results.page, results.page_count);
            self.store.update_data(turn.id(), &json!({ "page": page })).await?;
            let view = paginate(&results.products, page, page_size);
            return Ok(Reply::text(replies::product_page(
                turn.language,
                ListKind::SearchResults,
                &view.items,
                view.number,
                view.page_count,
            )));
        }
        if let Some(index) = parse_number(turn.text) {
            let view = paginate(&results.products, results.page, page_size);
            return self.select(turn, &view.items, index).await;
        }
        self.restart(turn).await
    }

    async fn show_catalog_page(&self, turn: &Turn<'_>, requested: usize) -> Result<Reply, TajerError> {
        let total = self.storage.count_products().await?;
        if total == 0 {
            self.store.clear(turn.id()).await?;
            return Ok(Reply::text(replies::empty_catalog(turn.language)));
        }
        let page_size = self.settings.page_size;
        let pages = pagination::page_count(total, page_size);
        let page = clamp_page(requested, pages);
        let items: Vec<ProductRef> = self
            .storage
            .list_products((page - 1) * page_size, page_size)
            .await?
            .iter()
            .map(ProductRef::from)
            .collect();

        let text = replies::product_page(turn.language, ListKind::Catalog, &items, page, pages);
        self.store
            .set(
                turn.id(),
                &ConversationState::BrowsingCatalog(CatalogPage {
                    items,
                    page,
                    page_count: pages,
                }),
            )
            .await?;
        Ok(Reply::text(text))
    }

    async fn on_catalog_page(&self, turn: &Turn<'_>, page: CatalogPage) -> Result<Reply, TajerError> {
        let intents = self.interrupts.intents();
        if intents.is(IntentKind::Next, turn.text) {
            return self
                .show_catalog_page(turn, next_page(page.page, page.page_count))
                .await;
        }
        if intents.is(IntentKind::Previous, turn.text) {
            return self
                .show_catalog_page(turn, previous_page(page.page, page.page_count))
                .await;
        }
        if let Some(index) = parse_number(turn.text) {
            return self.select(turn, &page.items, index).await;
        }
        self.restart(turn).await
    }

    /// Picks the 1-based `index` from the displayed page. Stock is checked
    /// live; an invalid index or a sold-out product keeps the list open.
    async fn select(
        &self,
        turn: &Turn<'_>,
        items: &[ProductRef],
        index: u64,
    ) -> Result<Reply, TajerError> {
        let lang = turn.language;
        let chosen = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| items.get(i));
        let Some(chosen) = chosen else {
            return Ok(Reply::text(replies::invalid_selection(lang, items.len())));
        };

        let product = self.storage.get_product_by_code(&chosen.code).await?;
        let Some(product) = product.filter(Product::in_stock) else {
            return Ok(Reply::text(replies::out_of_stock(lang, &chosen.name)));
        };

        self.store
            .set(
                turn.id(),
                &ConversationState::ConfirmingProduct(PendingProduct {
                    product: ProductRef::from(&product),
                }),
            )
            .await?;
        debug!(customer_id = turn.id(), code = %product.code, "product selected");

        let text = replies::confirm_product(lang, &product);
        Ok(match &product.image_url {
            Some(url) => Reply::with_image(text, url, Some(product.name.clone())),
            None => Reply::text(text),
        })
    }

    // --- Guided order ---

    /// "1" confirms. Any other number re-prompts; text starts a new search.
    async fn on_confirming(
        &self,
        turn: &Turn<'_>,
        pending: PendingProduct,
    ) -> Result<Reply, TajerError> {
        let lang = turn.language;
        match parse_number(turn.text) {
            Some(1) => {
                let product = self
                    .storage
                    .get_product_by_code(&pending.product.code)
                    .await?
                    .filter(Product::in_stock);
                let Some(product) = product else {
                    self.store.clear(turn.id()).await?;
                    return Ok(Reply::text(replies::out_of_stock(lang, &pending.product.name)));
                };
                self.store
                    .set(turn.id(), &ConversationState::AwaitingQuantity(pending))
                    .await?;
                let max = product.quantity.min(self.settings.max_quantity);
                Ok(Reply::text(replies::ask_quantity(lang, &product.name, max)))
            }
            Some(_) => Ok(Reply::text(replies::confirm_reminder(lang))),
            None => self.restart(turn).await,
        }
    }

    async fn on_quantity(
        &self,
        turn: &Turn<'_>,
        pending: PendingProduct,
    ) -> Result<Reply, TajerError> {
        let lang = turn.language;
        let live = self
            .storage
            .get_product_by_code(&pending.product.code)
            .await?
            .filter(Product::in_stock);
        let Some(live) = live else {
            self.store.clear(turn.id()).await?;
            return Ok(Reply::text(replies::out_of_stock(lang, &pending.product.name)));
        };

        match check_quantity(turn.text, live.quantity, self.settings.max_quantity) {
            QuantityCheck::Valid(quantity) => {
                // Price is taken from the catalog at order time.
                let order = PendingOrder {
                    product: ProductRef::from(&live),
                    quantity,
                    name: None,
                    address: None,
                };
                self.advance(turn, order).await
            }
            QuantityCheck::NotANumber => Ok(Reply::text(replies::quantity_not_a_number(lang))),
            QuantityCheck::TooLow => Ok(Reply::text(replies::quantity_too_low(lang))),
            QuantityCheck::AboveStock(stock) => {
                Ok(Reply::text(replies::quantity_above_stock(lang, stock)))
            }
            QuantityCheck::AboveMax(max) => Ok(Reply::text(replies::quantity_above_max(lang, max))),
        }
    }

    async fn advance(&self, turn: &Turn<'_>, order: PendingOrder) -> Result<Reply, TajerError> {
        let lang = turn.language;
        let (state, prompt) = match next_step(&order, turn.customer, self.settings.collect_email) {
            NextStep::AskName => (ConversationState::AwaitingName(order), replies::ask_name(lang)),
            NextStep::AskAddress => (
                ConversationState::AwaitingAddress(order),
                replies::ask_address(lang),
            ),
            NextStep::AskEmail => (ConversationState::AwaitingEmail(order), replies::ask_email(lang)),
            NextStep::Commit => return self.commit(turn, order, None).await,
        };
        self.store.set(turn.id(), &state).await?;
        Ok(Reply::text(prompt))
    }

    async fn on_name(&self, turn: &Turn<'_>, mut order: PendingOrder) -> Result<Reply, TajerError> {
        let min = self.settings.min_name_chars;
        let Some(name) = check_name(turn.text, min) else {
            return Ok(Reply::text(replies::name_too_short(turn.language, min)));
        };
        order.name = Some(name);
        self.advance(turn, order).await
    }

    async fn on_address(&self, turn: &Turn<'_>, mut order: PendingOrder) -> Result<Reply, TajerError> {
        let min = self.settings.min_address_chars;
        let Some(address) = check_address(turn.text, min) else {
            return Ok(Reply::text(replies::address_too_short(turn.language, min)));
        };
        order.address = Some(address);
        self.advance(turn, order).await
    }

    async fn on_email(&self, turn: &Turn<'_>, order: PendingOrder) -> Result<Reply, TajerError> {
        if self.interrupts.intents().is(IntentKind::Skip, turn.text)
            || parse_number(turn.text) == Some(0)
        {
            return self.commit(turn, order, None).await;
        }
        match check_email(turn.text) {
            Some(email) => self.commit(turn, order, Some(email)).await,
            None => Ok(Reply::text(replies::invalid_email(turn.language))),
        }
    }

    async fn commit(
        &self,
        turn: &Turn<'_>,
        pending: PendingOrder,
        email: Option<String>,
    ) -> Result<Reply, TajerError> {
        let order = self.orders.commit(turn.customer, &pending, email).await?;
        self.store.clear(turn.id()).await?;
        Ok(Reply::text(replies::order_confirmed(turn.language, &order)))
    }

    // --- Order history ---

    async fn show_order_history(&self, turn: &Turn<'_>) -> Result<Reply, TajerError> {
        let orders = self
            .storage
            .list_orders_for_customer(turn.id(), ORDER_HISTORY_LIMIT)
            .await?;
        if orders.is_empty() {
            return Ok(Reply::text(replies::no_orders(turn.language)));
        }
        self.store
            .set(
                turn.id(),
                &ConversationState::AwaitingOrderCancel(OrderChoices {
                    order_ids: orders.iter().map(|o| o.id).collect(),
                }),
            )
            .await?;
        Ok(Reply::text(replies::order_history(turn.language, &orders)))
    }

    async fn on_order_cancel(
        &self,
        turn: &Turn<'_>,
        choices: OrderChoices,
    ) -> Result<Reply, TajerError> {
        let lang = turn.language;
        let Some(index) = parse_number(turn.text) else {
            return self.restart(turn).await;
        };
        let order_id = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| choices.order_ids.get(i))
            .copied();
        let Some(order_id) = order_id else {
            return Ok(Reply::text(replies::invalid_selection(lang, choices.order_ids.len())));
        };

        let order = self
            .storage
            .get_order(order_id)
            .await?
            .filter(|o| o.customer_id == turn.id());
        self.store.clear(turn.id()).await?;
        let Some(order) = order else {
            return Ok(Reply::text(replies::invalid_selection(lang, choices.order_ids.len())));
        };
        if order.status != OrderStatus::Pending {
            return Ok(Reply::text(replies::order_not_cancellable(
                lang,
                order.id,
                order.status,
            )));
        }

        self.storage
            .update_order_status(order.id, OrderStatus::Cancelled)
            .await?;
        info!(customer_id = turn.id(), order_id = order.id, "order cancelled");
        Ok(Reply::text(replies::order_cancelled(lang, order.id)))
    }
}
