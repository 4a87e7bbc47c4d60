//! Selection query strings.
//!
//! Converts a `Selection` to and from the URL query parameters used by the
//! ranking page: one key per category, its tags joined by commas, e.g.
//! `problema=sujeira_leve%2Csujeira_pesada&area=externo`.

use guia_model::{Category, Selection};
use thiserror::Error;
use url::form_urlencoded;

/// Separator between tags inside one parameter value.
pub const TAG_SEPARATOR: &str = ",";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown category parameter: {0}")]
    UnknownCategory(String),
}

/// Trait for converting selections to and from a textual form.
pub trait SelectionCodec {
    fn encode(&self, selection: &Selection) -> String;

    fn decode(&self, text: &str) -> Result<Selection, QueryError>;
}

/// `application/x-www-form-urlencoded` codec.
///
/// The lenient codec skips parameters that are not category keys; the
/// strict one rejects them.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlParamsCodec {
    pub strict: bool,
}

impl UrlParamsCodec {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl SelectionCodec for UrlParamsCodec {
    fn encode(&self, selection: &Selection) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        for (category, tags) in selection.iter() {
            if tags.is_empty() {
                continue;
            }
            let joined = tags
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(TAG_SEPARATOR);
            serializer.append_pair(category.key(), &joined);
        }

        serializer.finish()
    }

    fn decode(&self, text: &str) -> Result<Selection, QueryError> {
        let text = text.trim();
        let text = text.strip_prefix('?').unwrap_or(text);
        let mut selection = Selection::new();

        for (key, value) in form_urlencoded::parse(text.as_bytes()) {
            let category = match key.parse::<Category>() {
                Ok(category) => category,
                Err(_) if self.strict => return Err(QueryError::UnknownCategory(key.into_owned())),
                Err(_) => {
                    tracing::debug!(key = %key, "Ignoring unknown query parameter");
                    continue;
                }
            };

            for tag in value
                .split(TAG_SEPARATOR)
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
            {
                selection.add(category, tag);
            }
        }

        Ok(selection)
    }
}

/// Encode with the lenient codec.
pub fn encode_selection(selection: &Selection) -> String {
    UrlParamsCodec::default().encode(selection)
}

/// Decode with the lenient codec.
pub fn decode_selection(text: &str) -> Result<Selection, QueryError> {
    UrlParamsCodec::default().decode(text)
}

/// Relative link to the ranking page for a selection.
pub fn ranking_link(selection: &Selection) -> String {
    let query = encode_selection(selection);
    if query.is_empty() {
        "/ranking".to_string()
    } else {
        format!("/ranking?{}", query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_category_order() {
        let selection = Selection::new()
            .with(Category::Area, "externo")
            .with(Category::Problema, "sujeira_pesada")
            .with(Category::Problema, "sujeira_leve");

        assert_eq!(
            encode_selection(&selection),
            "problema=sujeira_leve%2Csujeira_pesada&area=externo"
        );
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_selection(&Selection::new()), "");
        assert_eq!(ranking_link(&Selection::new()), "/ranking");
    }

    #[test]
    fn test_decode_lenient() {
        let selection =
            decode_selection("?problema=sujeira_leve,sujeira_pesada&area=externo&foo=bar").unwrap();

        assert_eq!(selection.total_selected(), 3);
        assert!(selection.contains(Category::Problema, "sujeira_pesada"));
        assert!(selection.contains(Category::Area, "externo"));
    }

    #[test]
    fn test_decode_strict_rejects_unknown() {
        let result = UrlParamsCodec::strict().decode("problema=a&foo=bar");
        assert_eq!(result, Err(QueryError::UnknownCategory("foo".to_string())));
    }

    #[test]
    fn test_decode_trims_and_drops_empty() {
        let selection = decode_selection("etapa=%20lavagem%20,,+,secagem").unwrap();
        assert_eq!(selection.total_selected(), 2);
        assert!(selection.contains(Category::Etapa, "lavagem"));
        assert!(selection.contains(Category::Etapa, "secagem"));
    }

    #[test]
    fn test_decode_encoded_selection() {
        let selection = Selection::new()
            .with(Category::Area, "área_interna")
            .with(Category::Material, "couro natural")
            .with(Category::Intensidade, "leve");

        let link = ranking_link(&selection);
        let query = link.trim_start_matches("/ranking");

        assert_eq!(decode_selection(query).unwrap(), selection);
    }
}
