//! Category normalization: free-form synonyms → canonical activity types.
//!
//! Canonical keys are the dataset's own `actividad_tipo` spellings, so a
//! normalized query can be compared against raw categories directly.

pub const MUSEUMS: &str = "museos salas de arte";
pub const LIBRARIES: &str = "biblioteca ludoteca";
pub const NURSERIES: &str = "guarderias centros infantiles";

struct SynonymGroup {
    key: &'static str,
    display: &'static str,
    terms: &'static [&'static str],
}

// Every canonical key contains one of its own terms, which keeps
// `normalize` idempotent.
const GROUPS: &[SynonymGroup] = &[
    SynonymGroup {
        key: MUSEUMS,
        display: "Museos y Salas de arte",
        terms: &["museo", "museum", "sala de arte", "salas de arte", "art hall"],
    },
    SynonymGroup {
        key: LIBRARIES,
        display: "Biblioteca y Ludoteca",
        terms: &["biblioteca", "ludoteca", "library", "playroom"],
    },
    SynonymGroup {
        key: NURSERIES,
        display: "Guarderías y Centros infantiles",
        terms: &["guarderia", "guardería", "centro infantil", "centros infantiles", "nursery", "childcare"],
    },
];

const CONNECTORS: &[&str] = &["de", "del", "la", "las", "el", "los", "en", "y", "a"];

/// Map text to its canonical category key, or return it unchanged.
pub fn normalize(text: &str) -> String {
    let t = text.trim().to_lowercase();
    GROUPS
        .iter()
        .find(|g| g.terms.iter().any(|term| t.contains(term)))
        .map(|g| g.key.to_string())
        .unwrap_or_else(|| text.to_string())
}

/// Human-readable rendering of a category.
///
/// Canonical keys have fixed spellings; anything else is title-cased with
/// connector words left lowercase after the first word.
pub fn display_name(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    if let Some(group) = GROUPS.iter().find(|g| g.key == text) {
        return group.display.to_string();
    }

    text.to_lowercase()
        .split(' ')
        .enumerate()
        .map(|(i, word)| {
            if i != 0 && CONNECTORS.contains(&word) {
                word.to_string()
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
