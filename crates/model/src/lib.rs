//! Core domain model for the product guide.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `Category`: the five fixed tagging dimensions and their static weights
//! - `RawRecord`: a catalog row as it arrives from the spreadsheet export
//! - `Product`: the canonical, normalized product
//! - `Selection`: the tags a user picked per category
//! - `MatchReason` / `RankedProduct`: ranking output

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One of the fixed tagging dimensions.
///
/// Declaration order is the scoring iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// The problem to solve (weight 5)
    Problema,
    /// Surface or location (weight 3)
    Area,
    /// Surface material (weight 2)
    Material,
    /// Step of the process (weight 2)
    Etapa,
    /// Intensity of the job (weight 1)
    Intensidade,
}

/// Static display and scoring configuration for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    pub key: Category,
    pub label: &'static str,
    pub weight: u32,
    pub icon: &'static str,
}

/// Configuration table, indexed by `Category as usize`.
pub static CATEGORY_CONFIGS: [CategoryConfig; 5] = [
    CategoryConfig { key: Category::Problema, label: "Problema", weight: 5, icon: "🔧" },
    CategoryConfig { key: Category::Area, label: "Área", weight: 3, icon: "📍" },
    CategoryConfig { key: Category::Material, label: "Material", weight: 2, icon: "🧱" },
    CategoryConfig { key: Category::Etapa, label: "Etapa", weight: 2, icon: "📋" },
    CategoryConfig { key: Category::Intensidade, label: "Intensidade", weight: 1, icon: "⚡" },
];

impl Category {
    /// All categories in scoring order.
    pub const ALL: [Category; 5] = [
        Self::Problema,
        Self::Area,
        Self::Material,
        Self::Etapa,
        Self::Intensidade,
    ];

    pub fn config(self) -> &'static CategoryConfig {
        &CATEGORY_CONFIGS[self as usize]
    }

    /// Identifier used in catalog columns and URL parameters.
    pub fn key(self) -> &'static str {
        match self {
            Self::Problema => "problema",
            Self::Area => "area",
            Self::Material => "material",
            Self::Etapa => "etapa",
            Self::Intensidade => "intensidade",
        }
    }

    pub fn label(self) -> &'static str {
        self.config().label
    }

    pub fn weight(self) -> u32 {
        self.config().weight
    }

    pub fn icon(self) -> &'static str {
        self.config().icon
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// One tag set per category.
///
/// Every category always has a (possibly empty) set, so lookups by
/// `Category` never miss.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsByCategory {
    #[serde(default)]
    pub problema: BTreeSet<String>,
    #[serde(default)]
    pub area: BTreeSet<String>,
    #[serde(default)]
    pub material: BTreeSet<String>,
    #[serde(default)]
    pub etapa: BTreeSet<String>,
    #[serde(default)]
    pub intensidade: BTreeSet<String>,
}

impl TagsByCategory {
    pub fn get(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Problema => &self.problema,
            Category::Area => &self.area,
            Category::Material => &self.material,
            Category::Etapa => &self.etapa,
            Category::Intensidade => &self.intensidade,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Problema => &mut self.problema,
            Category::Area => &mut self.area,
            Category::Material => &mut self.material,
            Category::Etapa => &mut self.etapa,
            Category::Intensidade => &mut self.intensidade,
        }
    }

    /// Iterate `(category, tags)` pairs in scoring order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &BTreeSet<String>)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Union of the tags of every category.
    pub fn union(&self) -> BTreeSet<String> {
        self.iter().flat_map(|(_, tags)| tags.iter().cloned()).collect()
    }

    /// Total number of tags across categories.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, tags)| tags.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, tags)| tags.is_empty())
    }
}

/// A catalog row as exported from the product spreadsheet.
///
/// Text fields are free-form; multi-value fields hold `|`-separated values.
/// Deserialization never fails on a bad field: anything that is not a
/// string becomes the empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub codigo: String,

    /// Description, conventionally `"<name> - <BRAND>"`
    #[serde(default, deserialize_with = "lenient_string")]
    pub descricao: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub problema: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub area_macro: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub componente: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub subcomponente: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub material_superficie: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub tipo_produto: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub etapa: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub intensidade: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

impl RawRecord {
    /// Create a minimal record for testing.
    pub fn new(codigo: impl Into<String>, descricao: impl Into<String>) -> Self {
        Self {
            codigo: codigo.into(),
            descricao: descricao.into(),
            ..Default::default()
        }
    }

    /// The raw multi-value column holding tags for `category`.
    pub fn category_field(&self, category: Category) -> &str {
        match category {
            Category::Problema => &self.problema,
            Category::Area => &self.area_macro,
            Category::Material => &self.material_superficie,
            Category::Etapa => &self.etapa,
            Category::Intensidade => &self.intensidade,
        }
    }

    pub fn with_field(mut self, category: Category, value: impl Into<String>) -> Self {
        let value = value.into();
        match category {
            Category::Problema => self.problema = value,
            Category::Area => self.area_macro = value,
            Category::Material => self.material_superficie = value,
            Category::Etapa => self.etapa = value,
            Category::Intensidade => self.intensidade = value,
        }
        self
    }

    pub fn with_tipo_produto(mut self, tipo: impl Into<String>) -> Self {
        self.tipo_produto = tipo.into();
        self
    }
}

/// A normalized product.
///
/// This is the canonical representation consumed by ranking and display.
/// Tag sets are only set through the constructor and `with_tags`, which keep
/// `all_tags` equal to the union of the per-category sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stringified catalog code
    pub id: String,

    /// Description without the brand suffix
    pub name: String,

    /// Brand token, or "Generic"
    pub brand: String,

    /// Display-only summary
    #[serde(default)]
    pub short_description: String,

    #[serde(default)]
    tags_by_category: TagsByCategory,

    #[serde(default)]
    all_tags: BTreeSet<String>,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        brand: impl Into<String>,
        short_description: impl Into<String>,
        tags_by_category: TagsByCategory,
    ) -> Self {
        let all_tags = tags_by_category.union();
        Self {
            id: id.into(),
            name: name.into(),
            brand: brand.into(),
            short_description: short_description.into(),
            tags_by_category,
            all_tags,
        }
    }

    /// Replace the tags of one category.
    pub fn with_tags<I, S>(mut self, category: Category, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.tags_by_category.get_mut(category) = tags.into_iter().map(Into::into).collect();
        self.all_tags = self.tags_by_category.union();
        self
    }

    pub fn tags(&self, category: Category) -> &BTreeSet<String> {
        self.tags_by_category.get(category)
    }

    pub fn tags_by_category(&self) -> &TagsByCategory {
        &self.tags_by_category
    }

    pub fn all_tags(&self) -> &BTreeSet<String> {
        &self.all_tags
    }
}

/// The tags a user picked, per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    tags: TagsByCategory,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `add`.
    pub fn with(mut self, category: Category, tag: impl Into<String>) -> Self {
        self.add(category, tag);
        self
    }

    /// Returns false if the tag was already selected.
    pub fn add(&mut self, category: Category, tag: impl Into<String>) -> bool {
        self.tags.get_mut(category).insert(tag.into())
    }

    /// Returns false if the tag was not selected.
    pub fn remove(&mut self, category: Category, tag: &str) -> bool {
        self.tags.get_mut(category).remove(tag)
    }

    /// Flip a tag, returning whether it is selected afterwards.
    pub fn toggle(&mut self, category: Category, tag: &str) -> bool {
        if self.remove(category, tag) {
            false
        } else {
            self.add(category, tag)
        }
    }

    pub fn contains(&self, category: Category, tag: &str) -> bool {
        self.tags.get(category).contains(tag)
    }

    pub fn selected(&self, category: Category) -> &BTreeSet<String> {
        self.tags.get(category)
    }

    pub fn clear_category(&mut self, category: Category) {
        self.tags.get_mut(category).clear();
    }

    pub fn clear_all(&mut self) {
        self.tags = TagsByCategory::default();
    }

    pub fn total_selected(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &BTreeSet<String>)> + '_ {
        self.tags.iter()
    }
}

/// One weighted overlap between a product tag and a selected tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReason {
    pub category: Category,
    pub category_label: String,
    pub tag: String,
    pub weight: u32,
}

impl MatchReason {
    /// Build a reason carrying the category's label and weight.
    pub fn new(category: Category, tag: impl Into<String>) -> Self {
        Self {
            category,
            category_label: category.label().to_string(),
            tag: tag.into(),
            weight: category.weight(),
        }
    }
}

/// A product with its compatibility score for one selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedProduct {
    #[serde(flatten)]
    pub product: Product,

    /// Normalized score, 0 to 100
    pub score: u8,

    /// Highest-weight reasons, at most three
    #[serde(default)]
    pub match_reasons: Vec<MatchReason>,
}

impl RankedProduct {
    /// A product with no score and no reasons.
    pub fn unscored(product: Product) -> Self {
        Self {
            product,
            score: 0,
            match_reasons: Vec::new(),
        }
    }
}
