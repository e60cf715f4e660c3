//! Keyword relevance ranking over the facility set.
//!
//! Per keyword (trimmed, lowercased, longer than 2 chars):
//!   +10 if it occurs in "name category municipality",
//!   +5  more if it also occurs in the name.
//! A jitter term in [0, 1) breaks ties; anything scoring ≤ 1 is dropped.

use crate::dataset::Facility;
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;

pub const TEXT_MATCH_POINTS: f64 = 10.0;
pub const NAME_MATCH_POINTS: f64 = 5.0;
pub const SCORE_THRESHOLD: f64 = 1.0;
pub const DEFAULT_LIMIT: usize = 5;
const MIN_KEYWORD_CHARS: usize = 3;

/// Tie-break term added to every score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Uniform in [0, 1).
    Random,
    /// A constant, for reproducible ordering.
    Fixed(f64),
}

impl Jitter {
    fn sample(&self) -> f64 {
        match self {
            Self::Random => rand::thread_rng().gen::<f64>(),
            Self::Fixed(r) => *r,
        }
    }
}

impl Default for Jitter {
    fn default() -> Self {
        if cfg!(test) {
            Self::Fixed(0.0)
        } else {
            Self::Random
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankOptions {
    pub jitter: Jitter,
    pub limit: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            jitter: Jitter::default(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl RankOptions {
    pub fn deterministic() -> Self {
        Self {
            jitter: Jitter::Fixed(0.0),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// A ranked facility with its disambiguated display category.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub facility: Facility,
    pub score: f64,
    pub display_category: String,
}

/// Keyword score without jitter.
pub fn score(facility: &Facility, keywords: &[String]) -> f64 {
    let haystack = format!("{} {} {}", facility.name, facility.category, facility.municipality).to_lowercase();
    let name = facility.name.to_lowercase();

    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| k.chars().count() >= MIN_KEYWORD_CHARS)
        .map(|k| {
            if !haystack.contains(&k) {
                0.0
            } else if name.contains(&k) {
                TEXT_MATCH_POINTS + NAME_MATCH_POINTS
            } else {
                TEXT_MATCH_POINTS
            }
        })
        .sum()
}

/// Score, threshold, sort and cap.
pub fn rank(facilities: &[Facility], keywords: &[String], opts: &RankOptions) -> Vec<SearchHit> {
    let mut scored: Vec<(&Facility, f64)> = facilities
        .iter()
        .map(|f| (f, score(f, keywords) + opts.jitter.sample()))
        .filter(|(_, s)| *s > SCORE_THRESHOLD)
        .collect();

    // Stable sort keeps dataset order among exact ties.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(opts.limit);

    scored
        .into_iter()
        .map(|(f, s)| SearchHit {
            display_category: display_category(&f.name, &f.category),
            facility: f.clone(),
            score: s,
        })
        .collect()
}

/// Category shown for a hit. Name hints win over the raw activity type
/// because the dataset files playrooms and archives under their host building.
pub fn display_category(name: &str, raw_category: &str) -> String {
    let name = name.to_lowercase();
    if name.contains("ludoteca") || name.contains("playroom") {
        "Ludoteca".into()
    } else if name.contains("archivo") || name.contains("archive") {
        "Archivo Histórico".into()
    } else if name.contains("biblioteca") || name.contains("library") {
        "Biblioteca".into()
    } else if raw_category.is_empty() {
        "Centro".into()
    } else {
        raw_category.to_string()
    }
}

/// Lowercased whitespace split, the fallback when no extractor is available.
pub fn naive_keywords(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Words longer than four characters, used to broaden an empty search.
pub fn broad_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 4)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility(name: &str, category: &str, municipality: &str) -> Facility {
        Facility {
            name: name.into(),
            category: category.into(),
            municipality: municipality.into(),
            street: String::new(),
            street_number: String::new(),
            phone: None,
            website: None,
            lat: 28.4,
            lon: -16.3,
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_score_formula() {
        let f = facility("Biblioteca Central", "biblioteca ludoteca", "Santa Cruz de Tenerife");
        // "biblioteca": text + name; "santa": text only; "museo": none; "de": too short
        let s = score(&f, &kw(&["biblioteca", "santa", "museo", "de"]));
        assert_eq!(s, 10.0 + 5.0 + 10.0);
    }

    #[test]
    fn test_keywords_are_trimmed_and_lowercased() {
        let f = facility("Museo de la Naturaleza", "museos salas de arte", "Santa Cruz");
        assert_eq!(score(&f, &kw(&["  MUSEO "])), 15.0);
    }

    #[test]
    fn test_fixed_jitter_added() {
        let f = vec![facility("Teatro Leal", "centro cultural", "La Laguna")];
        let opts = RankOptions { jitter: Jitter::Fixed(0.25), limit: 5 };
        let hits = rank(&f, &kw(&["teatro"]), &opts);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 15.25).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_never_returned() {
        let f = vec![facility("Teatro Leal", "centro cultural", "La Laguna")];
        let opts = RankOptions { jitter: Jitter::Fixed(0.99), limit: 5 };
        assert!(rank(&f, &kw(&["universidad"]), &opts).is_empty());
    }

    #[test]
    fn test_random_jitter_stays_below_match_gap() {
        let f = vec![facility("Teatro Leal", "centro cultural", "La Laguna")];
        let opts = RankOptions { jitter: Jitter::Random, limit: 5 };
        for _ in 0..50 {
            assert!(rank(&f, &kw(&["nothing"]), &opts).is_empty());
            let hits = rank(&f, &kw(&["teatro"]), &opts);
            assert!(hits[0].score >= 15.0 && hits[0].score < 16.0);
        }
    }

    #[test]
    fn test_capped_and_sorted() {
        let mut f: Vec<Facility> = (0..8)
            .map(|i| facility(&format!("Centro {}", i), "centro cultural", "Arona"))
            .collect();
        f.push(facility("Centro Cultural de Arona", "centro cultural", "Arona"));
        let hits = rank(&f, &kw(&["cultural", "arona"]), &RankOptions::deterministic());
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].facility.name, "Centro Cultural de Arona");
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_display_category_priority() {
        assert_eq!(display_category("Ludoteca de la Biblioteca Municipal", "biblioteca ludoteca"), "Ludoteca");
        assert_eq!(display_category("Archivo y Biblioteca Insular", "x"), "Archivo Histórico");
        assert_eq!(display_category("Biblioteca de Adeje", "biblioteca ludoteca"), "Biblioteca");
        assert_eq!(display_category("Casa de la Cultura", "centro cultural"), "centro cultural");
        assert_eq!(display_category("Casa de la Cultura", ""), "Centro");
    }

    #[test]
    fn test_fallback_keyword_helpers() {
        assert_eq!(naive_keywords("Museos  en La Laguna"), kw(&["museos", "en", "la", "laguna"]));
        assert_eq!(broad_keywords("Quiero ver bibliotecas de Arona"), kw(&["quiero", "bibliotecas", "arona"]));
    }
}
