// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product search and ranking.

use std::cmp::Ordering;
use std::sync::Arc;

use tajer_core::types::Product;
use tajer_core::{StorageAdapter, TajerError};
use tajer_lang::{NormalizedQuery, SortDirective};
use tracing::debug;

/// Reorders `products` for `directive`. The sort is stable, so ties keep
/// catalog order.
///
/// `Best` puts in-stock items first and then sorts by descending price.
/// Price is only a proxy for quality; there is no real quality signal.
pub fn rank(mut products: Vec<Product>, directive: Option<SortDirective>) -> Vec<Product> {
    match directive {
        None => {}
        Some(SortDirective::Cheapest) => products.sort_by(|a, b| a.price.total_cmp(&b.price)),
        Some(SortDirective::MostExpensive) => {
            products.sort_by(|a, b| b.price.total_cmp(&a.price))
        }
        Some(SortDirective::Best) => products.sort_by(|a, b| {
            match (a.in_stock(), b.in_stock()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => b.price.total_cmp(&a.price),
            }
        }),
    }
    products
}

/// Catalog search over canonical terms.
#[derive(Clone)]
pub struct ProductSearch {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    limit: usize,
}

impl ProductSearch {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>, limit: usize) -> Self {
        Self {
            storage,
            limit: limit.max(1),
        }
    }

    /// Substring search for `term`, ranked by `directive`, at most
    /// `limit` results.
    ///
    /// An empty term with a directive ranks the whole catalog ("cheapest").
    /// An empty term without one returns nothing. A plural miss retries
    /// the singular (`pens` -> `pen`). No match is an empty list, never an
    /// error.
    pub async fn search(
        &self,
        term: &str,
        directive: Option<SortDirective>,
    ) -> Result<Vec<Product>, TajerError> {
        let term = term.trim();
        if term.is_empty() {
            let Some(directive) = directive else {
                return Ok(Vec::new());
            };
            let total = self.storage.count_products().await?;
            let all = self.storage.list_products(0, total).await?;
            let mut ranked = rank(all, Some(directive));
            ranked.truncate(self.limit);
            return Ok(ranked);
        }

        // With a directive every match is ranked before truncation.
        let fetch = match directive {
            Some(_) => self.storage.count_products().await?.max(1),
            None => self.limit,
        };
        let mut products = self.storage.search_products(term, fetch).await?;
        if products.is_empty() {
            if let Some(singular) = singular(term) {
                debug!(term, singular, "retrying search with singular");
                products = self.storage.search_products(singular, fetch).await?;
            }
        }
        let mut ranked = rank(products, directive);
        ranked.truncate(self.limit);
        Ok(ranked)
    }

    pub async fn search_query(&self, query: &NormalizedQuery) -> Result<Vec<Product>, TajerError> {
        self.search(&query.term, query.directive).await
    }
}

/// Drops a plural `s` from the last word, if that leaves a real word.
fn singular(term: &str) -> Option<&str> {
    let stripped = term.strip_suffix('s')?;
    let last_word = stripped.rsplit(' ').next().unwrap_or(stripped);
    (last_word.chars().count() >= 3 && !stripped.ends_with('s')).then_some(stripped)
}

#[cfg(test)]
mod tests {
    use tajer_config::model::StorageConfig;
    use tajer_core::types::ProductUpsert;
    use tajer_storage::SqliteStorage;

    use super::*;

    fn product(code: &str, price: f64, quantity: i64) -> Product {
        Product {
            id: 0,
            code: code.into(),
            name: code.into(),
            price,
            quantity,
            category: None,
            image_url: None,
        }
    }

    fn codes(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.code.as_str()).collect()
    }

    #[test]
    fn ranking_orders_and_keeps_ties_stable() {
        let products = vec![
            product("a", 2.0, 1),
            product("b", 1.0, 0),
            product("c", 2.0, 5),
            product("d", 3.0, 0),
        ];
        assert_eq!(codes(&rank(products.clone(), None)), ["a", "b", "c", "d"]);
        assert_eq!(
            codes(&rank(products.clone(), Some(SortDirective::Cheapest))),
            ["b", "a", "c", "d"]
        );
        assert_eq!(
            codes(&rank(products.clone(), Some(SortDirective::MostExpensive))),
            ["d", "a", "c", "b"]
        );
        assert_eq!(
            codes(&rank(products, Some(SortDirective::Best))),
            ["a", "c", "d", "b"]
        );
    }

    #[test]
    fn singular_only_strips_plain_plurals() {
        assert_eq!(singular("pens"), Some("pen"));
        assert_eq!(singular("pen blues"), Some("pen blue"));
        assert_eq!(singular("glass"), None);
        assert_eq!(singular("ps"), None);
        assert_eq!(singular("pen"), None);
    }

    async fn seeded() -> (ProductSearch, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("catalog.db").display().to_string(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        for (code, name, price, quantity) in [
            ("P1", "Blue pen", 1.0, 10),
            ("P2", "Red pen", 0.5, 0),
            ("N1", "Spiral notebook", 3.0, 4),
            ("P3", "Gel pen deluxe", 2.5, 2),
        ] {
            storage
                .upsert_product(&ProductUpsert {
                    code: code.into(),
                    name: name.into(),
                    price,
                    quantity,
                    category: None,
                    image_url: None,
                })
                .await
                .unwrap();
        }
        (ProductSearch::new(Arc::new(storage), 50), dir)
    }

    #[tokio::test]
    async fn search_returns_catalog_order_without_directive() {
        let (search, _dir) = seeded().await;
        let found = search.search("pen", None).await.unwrap();
        assert_eq!(codes(&found), ["P1", "P2", "P3"]);
    }

    #[tokio::test]
    async fn plural_falls_back_to_singular() {
        let (search, _dir) = seeded().await;
        let found = search.search("pens", None).await.unwrap();
        assert_eq!(found.len(), 3);
    }

    #[tokio::test]
    async fn directive_reorders_results() {
        let (search, _dir) = seeded().await;
        let found = search.search("pen", Some(SortDirective::Cheapest)).await.unwrap();
        assert_eq!(codes(&found), ["P2", "P1", "P3"]);
    }

    #[tokio::test]
    async fn empty_term_ranks_whole_catalog_only_with_directive() {
        let (search, _dir) = seeded().await;
        assert!(search.search("", None).await.unwrap().is_empty());
        let found = search
            .search("", Some(SortDirective::MostExpensive))
            .await
            .unwrap();
        assert_eq!(codes(&found), ["N1", "P3", "P1", "P2"]);
    }

    #[tokio::test]
    async fn directive_ranks_matches_beyond_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("catalog.db").display().to_string(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        for i in 1..=60 {
            storage
                .upsert_product(&ProductUpsert {
                    code: format!("P{i}"),
                    name: format!("Pen {i}"),
                    price: if i == 55 { 0.1 } else { 6.0 + f64::from(i) },
                    quantity: 5,
                    category: None,
                    image_url: None,
                })
                .await
                .unwrap();
        }
        let search = ProductSearch::new(Arc::new(storage), 50);

        let cheapest = search.search("pen", Some(SortDirective::Cheapest)).await.unwrap();
        assert_eq!(cheapest.len(), 50);
        assert_eq!(cheapest[0].code, "P55");

        let dearest = search
            .search("pen", Some(SortDirective::MostExpensive))
            .await
            .unwrap();
        assert_eq!(dearest[0].code, "P60");

        assert_eq!(search.search("pen", None).await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn no_match_is_empty_not_error() {
        let (search, _dir) = seeded().await;
        assert!(search.search("stapler", None).await.unwrap().is_empty());
    }
}
