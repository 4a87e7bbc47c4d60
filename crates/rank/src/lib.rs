//! Ranking of catalog products against a user selection.
//!
//! Each overlap between a product tag and a selected tag adds its category
//! weight to the product's raw score. Raw scores are normalized against the
//! best score the selection allows, then products are filtered and ordered
//! deterministically.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use guia_features::Collation;
use guia_model::{Category, MatchReason, Product, RankedProduct, Selection};
use serde::{Deserialize, Serialize};

pub use guia_features::format_tag_label;

/// Configuration for the ranker.
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// Match reasons kept per product
    pub max_match_reasons: usize,
    /// Scores strictly above this count as high compatibility
    pub high_score_threshold: u8,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            max_match_reasons: 3,
            high_score_threshold: 70,
        }
    }
}

/// Output of one ranking pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingResult {
    pub ranked_products: Vec<RankedProduct>,
    pub max_possible_score: u32,
}

/// Raw weighted score of a product, with one reason per matching tag.
///
/// Reasons come out in category order, then tag order within a category.
pub fn calculate_raw_score(product: &Product, selection: &Selection) -> (u32, Vec<MatchReason>) {
    let mut score = 0;
    let mut matches = Vec::new();

    for category in Category::ALL {
        let selected = selection.selected(category);
        for tag in product.tags(category) {
            if selected.contains(tag) {
                score += category.weight();
                matches.push(MatchReason::new(category, tag.clone()));
            }
        }
    }

    (score, matches)
}

/// Score of a product matching every selected tag.
pub fn calculate_max_possible_score(selection: &Selection) -> u32 {
    selection
        .iter()
        .map(|(category, tags)| tags.len() as u32 * category.weight())
        .sum()
}

/// Scale a raw score to 0..=100, rounding halves up.
pub fn normalize_score(raw: u32, max_possible: u32) -> u8 {
    if max_possible == 0 {
        return 0;
    }

    let raw = u64::from(raw.min(max_possible));
    let max = u64::from(max_possible);
    let rounded = (raw * 200 + max) / (2 * max);

    u8::try_from(rounded).unwrap_or(100)
}

/// Rank products with the default configuration.
pub fn rank_products(products: &[Product], selection: &Selection) -> RankingResult {
    rank_products_with(products, selection, &RankConfig::default())
}

/// Rank products against a selection.
///
/// An empty selection lists the whole catalog by name with score 0.
/// Otherwise products without any overlap are dropped and the rest are
/// ordered by score, then number of reasons, then name.
pub fn rank_products_with(
    products: &[Product],
    selection: &Selection,
    config: &RankConfig,
) -> RankingResult {
    let collation = Collation::pt_br();
    let max_possible_score = calculate_max_possible_score(selection);

    if max_possible_score == 0 {
        let mut ranked: Vec<RankedProduct> =
            products.iter().cloned().map(RankedProduct::unscored).collect();
        ranked.sort_by(|a, b| collation.compare(&a.product.name, &b.product.name));

        tracing::debug!(products = ranked.len(), "Empty selection, listing catalog by name");

        return RankingResult {
            ranked_products: ranked,
            max_possible_score,
        };
    }

    let mut ranked: Vec<RankedProduct> = products
        .iter()
        .filter_map(|product| {
            let (raw_score, mut matches) = calculate_raw_score(product, selection);
            let score = normalize_score(raw_score, max_possible_score);
            if score == 0 {
                return None;
            }

            // Stable: equal weights keep category order.
            matches.sort_by(|a, b| b.weight.cmp(&a.weight));
            matches.truncate(config.max_match_reasons);

            Some(RankedProduct {
                product: product.clone(),
                score,
                match_reasons: matches,
            })
        })
        .collect();

    ranked.sort_by(|a, b| compare_ranked(a, b, &collation));

    tracing::debug!(
        products = products.len(),
        matched = ranked.len(),
        max_possible_score,
        "Ranked catalog"
    );

    RankingResult {
        ranked_products: ranked,
        max_possible_score,
    }
}

fn compare_ranked(a: &RankedProduct, b: &RankedProduct, collation: &Collation) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.match_reasons.len().cmp(&a.match_reasons.len()))
        .then_with(|| collation.compare(&a.product.name, &b.product.name))
}

/// Every distinct tag of a category across products, in pt-BR order.
pub fn get_unique_tags(products: &[Product], category: Category) -> Vec<String> {
    unique_tags(products, category, &Collation::pt_br())
}

fn unique_tags(products: &[Product], category: Category, collation: &Collation) -> Vec<String> {
    let set: BTreeSet<&String> = products.iter().flat_map(|p| p.tags(category)).collect();
    let mut tags: Vec<String> = set.into_iter().cloned().collect();
    collation.sort(&mut tags);
    tags
}

/// Selectable tags for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagOptions {
    pub category: Category,
    pub tags: Vec<String>,
}

/// Selectable tags for every category, in category order.
pub fn category_tag_options(products: &[Product]) -> Vec<TagOptions> {
    let collation = Collation::pt_br();
    Category::ALL
        .into_iter()
        .map(|category| TagOptions {
            category,
            tags: unique_tags(products, category, &collation),
        })
        .collect()
}

/// Post-ranking filters over an already ordered result.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    /// Keep only scores strictly above this value
    pub score_above: Option<u8>,
    /// Case-insensitive text matched against name, brand and short description
    pub search: Option<String>,
}

impl ResultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_high_score_only(mut self, config: &RankConfig) -> Self {
        self.score_above = Some(config.high_score_threshold);
        self
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn matches(&self, ranked: &RankedProduct) -> bool {
        if let Some(threshold) = self.score_above {
            if ranked.score <= threshold {
                return false;
            }
        }

        let query = match &self.search {
            Some(search) => search.trim().to_lowercase(),
            None => return true,
        };
        if query.is_empty() {
            return true;
        }

        let product = &ranked.product;
        [&product.name, &product.brand, &product.short_description]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }

    /// Keep matching products, preserving order.
    pub fn apply(&self, ranked: Vec<RankedProduct>) -> Vec<RankedProduct> {
        ranked.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guia_model::TagsByCategory;
    use pretty_assertions::assert_eq;

    fn make_product(id: &str, name: &str) -> Product {
        Product::new(id, name, "Marca Teste", "Descrição curta", TagsByCategory::default())
            .with_tags(Category::Problema, ["sujeira_leve"])
            .with_tags(Category::Area, ["externo"])
            .with_tags(Category::Material, ["pintura_verniz"])
            .with_tags(Category::Etapa, ["lavagem"])
            .with_tags(Category::Intensidade, ["leve"])
    }

    fn names(result: &RankingResult) -> Vec<&str> {
        result
            .ranked_products
            .iter()
            .map(|r| r.product.name.as_str())
            .collect()
    }

    #[test]
    fn test_raw_score_empty_selection() {
        let (score, matches) = calculate_raw_score(&make_product("1", "Teste"), &Selection::new());
        assert_eq!(score, 0);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_raw_score_weights() {
        let selection = Selection::new()
            .with(Category::Problema, "sujeira_leve")
            .with(Category::Area, "externo");

        let (score, matches) = calculate_raw_score(&make_product("1", "Teste"), &selection);

        assert_eq!(score, 8);
        assert_eq!(
            matches,
            vec![
                MatchReason::new(Category::Problema, "sujeira_leve"),
                MatchReason::new(Category::Area, "externo"),
            ]
        );
    }

    #[test]
    fn test_raw_score_multiple_tags_same_category() {
        let product = make_product("1", "Teste")
            .with_tags(Category::Problema, ["sujeira_leve", "sujeira_pesada"]);
        let selection = Selection::new()
            .with(Category::Problema, "sujeira_leve")
            .with(Category::Problema, "sujeira_pesada");

        let (score, matches) = calculate_raw_score(&product, &selection);
        assert_eq!(score, 10);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_max_possible_score() {
        assert_eq!(calculate_max_possible_score(&Selection::new()), 0);

        let selection = Selection::new()
            .with(Category::Problema, "sujeira_leve")
            .with(Category::Problema, "sujeira_pesada")
            .with(Category::Area, "externo");
        assert_eq!(calculate_max_possible_score(&selection), 13);
    }

    #[test]
    fn test_normalize_score() {
        assert_eq!(normalize_score(10, 0), 0);
        assert_eq!(normalize_score(0, 0), 0);
        assert_eq!(normalize_score(10, 10), 100);
        assert_eq!(normalize_score(13, 13), 100);
        assert_eq!(normalize_score(5, 10), 50);
        assert_eq!(normalize_score(3, 10), 30);
        assert_eq!(normalize_score(1, 8), 13);
        assert_eq!(normalize_score(5, 13), 38);
        assert_eq!(normalize_score(20, 10), 100);
    }

    #[test]
    fn test_more_matches_rank_first() {
        let products = vec![
            make_product("1", "Produto A"),
            make_product("2", "Produto B")
                .with_tags(Category::Problema, ["sujeira_leve", "sujeira_pesada"]),
        ];
        let selection = Selection::new()
            .with(Category::Problema, "sujeira_leve")
            .with(Category::Problema, "sujeira_pesada");

        let result = rank_products(&products, &selection);

        assert_eq!(result.max_possible_score, 10);
        assert_eq!(result.ranked_products[0].product.id, "2");
        assert_eq!(result.ranked_products[0].score, 100);
        assert_eq!(result.ranked_products[1].score, 50);
    }

    #[test]
    fn test_ties_break_by_name() {
        let products = vec![make_product("1", "Zebra"), make_product("2", "Alfa")];
        let selection = Selection::new().with(Category::Problema, "sujeira_leve");

        let result = rank_products(&products, &selection);
        assert_eq!(names(&result), vec!["Alfa", "Zebra"]);
    }

    #[test]
    fn test_equal_score_more_reasons_first() {
        let single = Product::new("1", "Alfa", "X", "", TagsByCategory::default())
            .with_tags(Category::Problema, ["p"]);
        let double = Product::new("2", "Zebra", "Y", "", TagsByCategory::default())
            .with_tags(Category::Area, ["x"])
            .with_tags(Category::Material, ["m"]);
        let selection = Selection::new()
            .with(Category::Problema, "p")
            .with(Category::Area, "x")
            .with(Category::Material, "m")
            .with(Category::Etapa, "e");

        let result = rank_products(&[single, double], &selection);

        assert_eq!(result.ranked_products[0].score, result.ranked_products[1].score);
        assert_eq!(names(&result), vec!["Zebra", "Alfa"]);
    }

    #[test]
    fn test_top_three_reasons_by_weight() {
        let selection = Selection::new()
            .with(Category::Problema, "sujeira_leve")
            .with(Category::Area, "externo")
            .with(Category::Material, "pintura_verniz")
            .with(Category::Etapa, "lavagem")
            .with(Category::Intensidade, "leve");

        let result = rank_products(&[make_product("1", "Teste")], &selection);
        let ranked = &result.ranked_products[0];

        assert_eq!(ranked.score, 100);
        let kept: Vec<(Category, u32)> = ranked
            .match_reasons
            .iter()
            .map(|r| (r.category, r.weight))
            .collect();
        assert_eq!(
            kept,
            vec![(Category::Problema, 5), (Category::Area, 3), (Category::Material, 2)]
        );
    }

    #[test]
    fn test_custom_reason_cap() {
        let selection = Selection::new()
            .with(Category::Problema, "sujeira_leve")
            .with(Category::Area, "externo");
        let config = RankConfig {
            max_match_reasons: 1,
            ..Default::default()
        };

        let result = rank_products_with(&[make_product("1", "Teste")], &selection, &config);
        assert_eq!(result.ranked_products[0].match_reasons.len(), 1);
        assert_eq!(result.ranked_products[0].match_reasons[0].category, Category::Problema);
    }

    #[test]
    fn test_non_matching_products_dropped() {
        let products = vec![
            make_product("1", "Combina"),
            Product::new("2", "Nada", "X", "", TagsByCategory::default())
                .with_tags(Category::Problema, ["oxidacao"]),
        ];
        let selection = Selection::new().with(Category::Problema, "sujeira_leve");

        let result = rank_products(&products, &selection);

        assert_eq!(names(&result), vec!["Combina"]);
        assert!(result.ranked_products.iter().all(|r| r.score > 0));
    }

    #[test]
    fn test_empty_selection_lists_everything_by_name() {
        let products = vec![
            make_product("1", "Zebra"),
            make_product("2", "água"),
            make_product("3", "Banho"),
        ];

        let result = rank_products(&products, &Selection::new());

        assert_eq!(result.max_possible_score, 0);
        assert_eq!(names(&result), vec!["água", "Banho", "Zebra"]);
        assert!(result
            .ranked_products
            .iter()
            .all(|r| r.score == 0 && r.match_reasons.is_empty()));
    }

    #[test]
    fn test_unique_tags() {
        let products = vec![
            make_product("1", "A").with_tags(Category::Area, ["vidros", "externo"]),
            make_product("2", "B").with_tags(Category::Area, ["área_interna", "externo"]),
        ];

        assert_eq!(
            get_unique_tags(&products, Category::Area),
            vec!["área_interna", "externo", "vidros"]
        );
        assert_eq!(get_unique_tags(&[], Category::Area), Vec::<String>::new());

        let options = category_tag_options(&products);
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].category, Category::Problema);
        assert_eq!(options[0].tags, vec!["sujeira_leve"]);
    }

    #[test]
    fn test_rank_normalized_catalog() {
        use guia_catalog::normalize_all;
        use guia_model::RawRecord;

        let raws = vec![
            RawRecord::new("1", "Hidratante de Couro").with_field(Category::Area, "interno"),
            RawRecord::new("2", "Cera - MEGUIARS")
                .with_field(Category::Problema, "riscos")
                .with_field(Category::Area, " Externo "),
            RawRecord::new("3", "Shampoo Neutro - VONIXX")
                .with_field(Category::Problema, "sujeira_leve|poeira")
                .with_field(Category::Area, "externo"),
        ];
        let selection = Selection::new()
            .with(Category::Problema, "sujeira_leve")
            .with(Category::Area, "externo");

        let result = rank_products(&normalize_all(&raws), &selection);

        assert_eq!(result.max_possible_score, 8);
        assert_eq!(names(&result), vec!["Shampoo Neutro", "Cera"]);
        let scores: Vec<u8> = result.ranked_products.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![100, 38]);
    }

    #[test]
    fn test_format_tag_label_reexport() {
        assert_eq!(format_tag_label("sujeira_leve"), "Sujeira Leve");
    }

    #[test]
    fn test_result_filter() {
        let config = RankConfig::default();
        let mut high = RankedProduct::unscored(
            Product::new("1", "Cera Premium", "MEGUIARS", "cera para externo", TagsByCategory::default()),
        );
        high.score = 90;
        let mut border = RankedProduct::unscored(
            Product::new("2", "Shampoo", "VONIXX", "shampoo para externo", TagsByCategory::default()),
        );
        border.score = 70;

        let ranked = vec![high, border];

        let only_high = ResultFilter::new().with_high_score_only(&config).apply(ranked.clone());
        assert_eq!(only_high.len(), 1);
        assert_eq!(only_high[0].product.id, "1");

        let by_brand = ResultFilter::new().with_search("  vonixx ").apply(ranked.clone());
        assert_eq!(by_brand.len(), 1);
        assert_eq!(by_brand[0].product.id, "2");

        let by_description = ResultFilter::new().with_search("EXTERNO").apply(ranked.clone());
        assert_eq!(by_description.len(), 2);

        let blank = ResultFilter::new().with_search("   ").apply(ranked);
        assert_eq!(blank.len(), 2);
    }
}
