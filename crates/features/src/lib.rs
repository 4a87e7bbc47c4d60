//! Text features for catalog tags and product names.
//!
//! Provides pure functions used by normalization, ranking and display:
//! - Multi-value field parsing
//! - Tag label formatting
//! - Portuguese (pt-BR) collation for names and tags

use std::cmp::Ordering;
use std::collections::BTreeSet;

use deunicode::deunicode;
use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;

/// Separator between values in a multi-value catalog field.
pub const MULTI_VALUE_SEPARATOR: char = '|';

/// Parse a `|`-separated field into a set of normalized tags.
///
/// Each piece is trimmed and lower-cased; empty pieces are dropped.
pub fn parse_multi_value(value: &str) -> BTreeSet<String> {
    value
        .split(MULTI_VALUE_SEPARATOR)
        .map(|piece| piece.trim().to_lowercase())
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// First raw value of a multi-value field, untouched.
pub fn first_value(value: &str) -> &str {
    value.split(MULTI_VALUE_SEPARATOR).next().unwrap_or_default()
}

/// Replace underscores with spaces.
pub fn humanize_token(token: &str) -> String {
    token.replace('_', " ")
}

/// Format a tag for display: `"sujeira_leve"` becomes `"Sujeira Leve"`.
///
/// Only the first letter of each word changes case.
pub fn format_tag_label(tag: &str) -> String {
    humanize_token(tag)
        .split_whitespace()
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Locale-aware string ordering for Brazilian Portuguese.
///
/// Backed by the ICU collator. When the collator cannot be built the
/// comparison falls back to transliterated, lower-cased keys.
pub struct Collation {
    collator: Option<Collator>,
}

impl Collation {
    pub fn pt_br() -> Self {
        match Collator::try_new(&locale!("pt-BR").into(), CollatorOptions::new()) {
            Ok(collator) => Self {
                collator: Some(collator),
            },
            Err(err) => {
                tracing::warn!(error = ?err, "pt-BR collator unavailable, using folded comparison");
                Self::folded()
            }
        }
    }

    /// Accent- and case-folding comparison without ICU.
    pub fn folded() -> Self {
        Self { collator: None }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => compare_folded(a, b),
        }
    }

    /// Sort strings in place, ascending.
    pub fn sort<S: AsRef<str>>(&self, items: &mut [S]) {
        items.sort_by(|a, b| self.compare(a.as_ref(), b.as_ref()));
    }
}

impl Default for Collation {
    fn default() -> Self {
        Self::pt_br()
    }
}

fn compare_folded(a: &str, b: &str) -> Ordering {
    let key_a = deunicode(a).to_lowercase();
    let key_b = deunicode(b).to_lowercase();
    key_a.cmp(&key_b).then_with(|| a.cmp(b))
}
