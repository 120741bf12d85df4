// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tajer import-products` command implementation.
//!
//! Reads a CSV catalog (`code,name,price,quantity[,category,image_url]`)
//! and upserts every valid row by product code. Invalid rows are logged
//! and skipped; they never abort the import.

use std::io::Read;
use std::path::Path;

use colored::Colorize;
use serde::Deserialize;
use tajer_config::TajerConfig;
use tajer_core::types::ProductUpsert;
use tajer_core::{StorageAdapter, TajerError};
use tracing::{info, warn};

use crate::app;

#[derive(Debug, Deserialize)]
struct CsvProduct {
    code: String,
    name: String,
    price: f64,
    quantity: i64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl CsvProduct {
    fn into_upsert(self) -> Result<ProductUpsert, String> {
        let code = self.code.trim().to_string();
        let name = self.name.trim().to_string();
        if code.is_empty() {
            return Err("empty product code".into());
        }
        if name.is_empty() {
            return Err(format!("product {code} has no name"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("product {code} has invalid price {}", self.price));
        }
        if self.quantity < 0 {
            return Err(format!("product {code} has negative quantity {}", self.quantity));
        }
        Ok(ProductUpsert {
            code,
            name,
            price: self.price,
            quantity: self.quantity,
            category: non_empty(self.category),
            image_url: non_empty(self.image_url),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Upserts every valid row of `reader` into `storage`.
///
/// Storage errors abort the import; bad rows only bump `skipped`.
pub async fn import_products<R: Read>(
    storage: &dyn StorageAdapter,
    reader: R,
) -> Result<ImportSummary, TajerError> {
    let mut rows = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut summary = ImportSummary::default();
    for (index, row) in rows.deserialize::<CsvProduct>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let product = match row {
            Ok(row) => match row.into_upsert() {
                Ok(product) => product,
                Err(reason) => {
                    warn!(line, %reason, "skipping catalog row");
                    summary.skipped += 1;
                    continue;
                }
            },
            Err(e) => {
                warn!(line, error = %e, "skipping unreadable catalog row");
                summary.skipped += 1;
                continue;
            }
        };
        storage.upsert_product(&product).await?;
        summary.imported += 1;
    }

    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "catalog import finished"
    );
    Ok(summary)
}

/// Runs the `tajer import-products` command.
pub async fn run_import(config: TajerConfig, path: &Path) -> Result<(), TajerError> {
    let file = std::fs::File::open(path).map_err(|e| {
        TajerError::Config(format!("cannot open {}: {e}", path.display()))
    })?;
    let storage = app::open_storage(&config).await?;
    let summary = import_products(storage.as_ref(), file).await?;
    storage.close().await?;

    println!(
        "{} {} products imported, {} rows skipped",
        "ok".green(),
        summary.imported,
        summary.skipped
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tajer_config::model::StorageConfig;
    use tajer_storage::SqliteStorage;

    async fn temp_storage() -> (tempfile::TempDir, SqliteStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("import.db").to_string_lossy().to_string(),
            ..StorageConfig::default()
        });
        storage.initialize().await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn imports_valid_rows_and_skips_bad_ones() {
        let (_dir, storage) = temp_storage().await;
        let csv = "\
code,name,price,quantity,category,image_url
NB-A4,A4 notebook,3.5,25,stationery,https://cdn.example.com/nb.jpg
PEN-BL,Blue pen,0.5,120
,Nameless,1.0,1
BAD-PRICE,Broken,-2,5
BAD-QTY,Broken,2,not-a-number
";
        let summary = import_products(&storage, csv.as_bytes()).await.unwrap();
        assert_eq!(summary, ImportSummary { imported: 2, skipped: 3 });

        let notebook = storage.get_product_by_code("NB-A4").await.unwrap().unwrap();
        assert_eq!(notebook.quantity, 25);
        assert_eq!(notebook.image_url.as_deref(), Some("https://cdn.example.com/nb.jpg"));
        let pen = storage.get_product_by_code("PEN-BL").await.unwrap().unwrap();
        assert_eq!(pen.image_url, None);
    }

    #[tokio::test]
    async fn reimport_updates_existing_products() {
        let (_dir, storage) = temp_storage().await;
        import_products(&storage, "code,name,price,quantity\nERS-1,Eraser,0.3,200\n".as_bytes())
            .await
            .unwrap();
        import_products(&storage, "code,name,price,quantity\nERS-1,Eraser,0.35,150\n".as_bytes())
            .await
            .unwrap();

        assert_eq!(storage.count_products().await.unwrap(), 1);
        let eraser = storage.get_product_by_code("ERS-1").await.unwrap().unwrap();
        assert_eq!(eraser.quantity, 150);
        assert!((eraser.price - 0.35).abs() < f64::EPSILON);
    }
}
