//! Seams for the two AI-backed steps and the records passed between them.

use crate::category;
use crate::ranking::SearchHit;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Websites that add nothing to an answer and are left out of context records.
pub const OMITTED_DOMAINS: &[&str] = &["gobiernodecanarias.org"];

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Turns a free-form question into search keywords.
///
/// Output tokens are lowercase, singular, stopword-free; proper nouns are
/// kept and multi-word ones split into separate tokens.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    async fn extract(&self, query: &str) -> Result<Vec<String>, CapabilityError>;
}

/// Writes the short plain-text reply for a question and its results.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, query: &str, records: &[ContextRecord]) -> Result<String, CapabilityError>;
}

/// What the narrator gets to see about one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextRecord {
    pub name: String,
    pub category: String,
    pub municipality: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub info: String,
}

impl ContextRecord {
    pub fn from_hit(hit: &SearchHit) -> Self {
        let f = &hit.facility;
        let original = if f.category.trim().is_empty() {
            "No definida".to_string()
        } else {
            category::display_name(&f.category)
        };

        Self {
            name: non_blank(&f.name).unwrap_or_else(|| "Sin nombre".into()),
            category: hit.display_category.clone(),
            municipality: non_blank(&f.municipality).unwrap_or_else(|| "Tenerife".into()),
            phone: f.phone.clone().unwrap_or_else(|| "No disponible".into()),
            website: f
                .website
                .clone()
                .filter(|w| !OMITTED_DOMAINS.iter().any(|d| w.to_lowercase().contains(d))),
            info: format!("Categoría original: {}", original),
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Parse a comma-separated keyword reply ("universidad, La Laguna").
pub fn parse_keywords(text: &str) -> Vec<String> {
    text.split(',')
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Facility;

    fn hit(name: &str, category: &str, website: Option<&str>) -> SearchHit {
        SearchHit {
            facility: Facility {
                name: name.into(),
                category: category.into(),
                municipality: String::new(),
                street: String::new(),
                street_number: String::new(),
                phone: None,
                website: website.map(str::to_string),
                lat: 28.0,
                lon: -16.5,
            },
            score: 15.0,
            display_category: crate::ranking::display_category(name, category),
        }
    }

    #[test]
    fn test_record_defaults() {
        let r = ContextRecord::from_hit(&hit("", "", None));
        assert_eq!(r.name, "Sin nombre");
        assert_eq!(r.category, "Centro");
        assert_eq!(r.municipality, "Tenerife");
        assert_eq!(r.phone, "No disponible");
        assert_eq!(r.info, "Categoría original: No definida");
    }

    #[test]
    fn test_record_renders_original_category() {
        let r = ContextRecord::from_hit(&hit("Ludoteca Municipal", "biblioteca ludoteca", Some("www.adeje.es")));
        assert_eq!(r.category, "Ludoteca");
        assert_eq!(r.info, "Categoría original: Biblioteca y Ludoteca");
        assert_eq!(r.website.as_deref(), Some("www.adeje.es"));
    }

    #[test]
    fn test_record_keeps_raw_category_with_synonym() {
        let r = ContextRecord::from_hit(&hit("Casa del Niño", "ludoteca infantil", None));
        assert_eq!(r.info, "Categoría original: Ludoteca Infantil");

        let r = ContextRecord::from_hit(&hit("Sala Cabrera Pinto", "centro de arte y museo", None));
        assert_eq!(r.info, "Categoría original: Centro de Arte y Museo");
    }

    #[test]
    fn test_record_drops_redundant_domain() {
        let r = ContextRecord::from_hit(&hit("IES Canarias", "enseñanza secundaria", Some("https://www.gobiernodecanarias.org/centros/ies")));
        assert_eq!(r.website, None);
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_keywords("universidad, La Laguna"), vec!["universidad", "la laguna"]);
        assert_eq!(parse_keywords(" ies ,sobradillo,, \n"), vec!["ies", "sobradillo"]);
        assert!(parse_keywords("").is_empty());
    }
}
