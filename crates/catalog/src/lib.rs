//! Product catalog loading and normalization.
//!
//! Provides the `CatalogSource` trait and its JSON file implementation, plus
//! the normalizer that turns raw spreadsheet rows into canonical `Product`s.
//! Normalization never fails: malformed fields degrade to empty tag sets,
//! an empty name or the generic brand.

use std::fs;
use std::path::PathBuf;

use guia_features::{first_value, humanize_token, parse_multi_value};
use guia_model::{Category, Product, RawRecord, TagsByCategory};
use serde_json::Value;
use thiserror::Error;

/// Brand used when a description carries no `" - BRAND"` suffix.
pub const GENERIC_BRAND: &str = "Generic";

const BRAND_SEPARATOR: &str = " - ";

/// Errors from catalog loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Sheet not found: {0}")]
    MissingSheet(String),

    #[error("Unexpected catalog shape: expected an array or an object with sheets")]
    UnexpectedShape,
}

/// Split a description into `(name, brand)` at the last `" - "`.
///
/// Without a separator the whole trimmed description is the name. An empty
/// brand part falls back to [`GENERIC_BRAND`].
pub fn split_name_and_brand(description: &str) -> (String, String) {
    match description.rsplit_once(BRAND_SEPARATOR) {
        Some((name, brand)) => {
            let brand = brand.trim();
            let brand = if brand.is_empty() { GENERIC_BRAND } else { brand };
            (name.trim().to_string(), brand.to_string())
        }
        None => (description.trim().to_string(), GENERIC_BRAND.to_string()),
    }
}

/// `"<product type> para <first area>"`, display only.
pub fn short_description(raw: &RawRecord) -> String {
    let tipo = humanize_token(&raw.tipo_produto);
    let area = first_value(&raw.area_macro);
    format!("{} para {}", tipo, area).trim().to_string()
}

/// Normalize one raw record into a canonical product.
pub fn normalize(raw: &RawRecord) -> Product {
    let mut tags = TagsByCategory::default();
    for category in Category::ALL {
        *tags.get_mut(category) = parse_multi_value(raw.category_field(category));
    }

    let (name, brand) = split_name_and_brand(&raw.descricao);

    Product::new(raw.codigo.clone(), name, brand, short_description(raw), tags)
}

/// Normalize every record, preserving input order.
pub fn normalize_all(raws: &[RawRecord]) -> Vec<Product> {
    raws.iter().map(normalize).collect()
}

/// Trait for catalog sources (JSON export, in-memory fixtures, etc.)
pub trait CatalogSource {
    /// Load every raw record from the source.
    fn load(&self) -> Result<Vec<RawRecord>, CatalogError>;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}

/// Load a source and normalize its records.
pub fn load_products<S: CatalogSource + ?Sized>(source: &S) -> Result<Vec<Product>, CatalogError> {
    let raws = source.load()?;
    let products = normalize_all(&raws);

    tracing::info!(source = source.name(), count = products.len(), "Loaded catalog");

    Ok(products)
}

/// JSON catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Path to the exported JSON file
    pub path: PathBuf,
    /// Sheet holding the product rows
    pub sheet: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/produtos.json"),
            sheet: "produtos".to_string(),
        }
    }
}

/// Catalog read from a spreadsheet JSON export.
///
/// Accepts `{"sheets": {"<sheet>": [rows]}}` or a bare array of rows.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    config: CatalogConfig,
}

impl JsonCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    /// Parse catalog JSON text into raw records.
    pub fn parse_str(&self, text: &str) -> Result<Vec<RawRecord>, CatalogError> {
        let value: Value = serde_json::from_str(text)?;
        self.parse_value(value)
    }

    fn parse_value(&self, value: Value) -> Result<Vec<RawRecord>, CatalogError> {
        let rows = match value {
            Value::Array(rows) => rows,
            Value::Object(mut root) => {
                let Some(Value::Object(mut sheets)) = root.remove("sheets") else {
                    return Err(CatalogError::UnexpectedShape);
                };
                match sheets.remove(&self.config.sheet) {
                    Some(Value::Array(rows)) => rows,
                    Some(_) => return Err(CatalogError::UnexpectedShape),
                    None => return Err(CatalogError::MissingSheet(self.config.sheet.clone())),
                }
            }
            _ => return Err(CatalogError::UnexpectedShape),
        };

        tracing::debug!(rows = rows.len(), sheet = %self.config.sheet, "Parsing catalog rows");

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            if !row.is_object() {
                tracing::warn!(index, "Skipping non-object catalog row");
                continue;
            }
            records.push(serde_json::from_value(row)?);
        }

        Ok(records)
    }
}

impl CatalogSource for JsonCatalog {
    fn load(&self) -> Result<Vec<RawRecord>, CatalogError> {
        let path = &self.config.path;
        tracing::debug!(path = %path.display(), "Reading catalog");

        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;

        self.parse_str(&text)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: Vec<RawRecord>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

impl CatalogSource for InMemoryCatalog {
    fn load(&self) -> Result<Vec<RawRecord>, CatalogError> {
        Ok(self.records.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
