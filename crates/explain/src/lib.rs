//! Explanation generation for ranked products.
//!
//! Converts match reasons and scores into human-readable text for product
//! cards: "why it appeared" chips, compatibility tiers and summaries.

use guia_features::format_tag_label;
use guia_model::{Category, MatchReason, RankedProduct};
use serde::{Deserialize, Serialize};

/// Summary shown for a product ranked without any selected criteria.
pub const NO_CRITERIA: &str = "Sem critérios selecionados";

/// A display-ready match reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonExplanation {
    pub category: Category,

    pub icon: String,

    /// Formatted tag, e.g. "Sujeira Leve"
    pub tag_label: String,

    pub weight: u32,

    /// "<category label>: <tag label>"
    pub text: String,
}

/// Compatibility band of a normalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    /// 70 and above
    High,
    /// 40 to 69
    Medium,
    /// Below 40
    Low,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            Self::High
        } else if score >= 40 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "Alta compatibilidade",
            Self::Medium => "Média compatibilidade",
            Self::Low => "Baixa compatibilidade",
        }
    }
}

/// Explain a single match reason.
pub fn explain_reason(reason: &MatchReason) -> ReasonExplanation {
    let tag_label = format_tag_label(&reason.tag);
    ReasonExplanation {
        category: reason.category,
        icon: reason.category.icon().to_string(),
        text: format!("{}: {}", reason.category_label, tag_label),
        tag_label,
        weight: reason.weight,
    }
}

/// Explain every kept reason of a ranked product, in order.
pub fn explain_product(ranked: &RankedProduct) -> Vec<ReasonExplanation> {
    ranked.match_reasons.iter().map(explain_reason).collect()
}

/// One-line summary: score, tier and reasons.
pub fn summarize(ranked: &RankedProduct) -> String {
    if ranked.match_reasons.is_empty() {
        return NO_CRITERIA.to_string();
    }

    let tier = ScoreTier::from_score(ranked.score);
    let reasons: Vec<String> = explain_product(ranked).into_iter().map(|e| e.text).collect();

    format!("{}% {}: {}", ranked.score, tier.label(), reasons.join(", "))
}

/// "3 critérios aplicados"
pub fn criteria_count_label(total: usize) -> String {
    if total == 1 {
        "1 critério aplicado".to_string()
    } else {
        format!("{} critérios aplicados", total)
    }
}

/// "12 produtos encontrados"
pub fn results_count_label(total: usize) -> String {
    if total == 1 {
        "1 produto encontrado".to_string()
    } else {
        format!("{} produtos encontrados", total)
    }
}
