//! Layer browsing: heuristic layer membership and filtering.
//!
//! Precedence: activity override > favorites > heuristic layers.
//! Museum, theater, library and cultural layers may overlap; `other` holds
//! whatever none of them claims. `classify` picks a single primary layer
//! (museum, theater, library, cultural, other) for display.

use crate::dataset::Facility;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Favorites,
    Other,
    Museum,
    Theater,
    Library,
    Cultural,
    All,
}

impl Layer {
    pub const BROWSABLE: [Layer; 6] = [
        Layer::Favorites,
        Layer::Other,
        Layer::Museum,
        Layer::Theater,
        Layer::Library,
        Layer::Cultural,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::Other => "other",
            Self::Museum => "museum",
            Self::Theater => "theater",
            Self::Library => "library",
            Self::Cultural => "cultural",
            Self::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Favorites => "Mis Favoritos",
            Self::Other => "Centros Educativos",
            Self::Museum => "Museos y Salas de Arte",
            Self::Theater => "Teatros",
            Self::Library => "Bibliotecas y Ludotecas",
            Self::Cultural => "Centros Culturales",
            Self::All => "Todos",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "favorites" | "favoritos" => Ok(Self::Favorites),
            "other" | "otros" | "general" => Ok(Self::Other),
            "museum" | "museo" | "museos" => Ok(Self::Museum),
            "theater" | "theatre" | "teatro" | "teatros" => Ok(Self::Theater),
            "library" | "biblioteca" | "bibliotecas" => Ok(Self::Library),
            "cultural" => Ok(Self::Cultural),
            "all" | "todos" => Ok(Self::All),
            other => Err(format!(
                "Unknown layer '{}'. Use favorites, other, museum, theater, library, cultural or all.",
                other
            )),
        }
    }
}

fn is_museum(category: &str, name: &str) -> bool {
    category.contains("museo") || name.contains("museo")
}

fn is_theater(name: &str) -> bool {
    name.contains("teatro") || name.contains("auditorio")
}

fn is_library(category: &str) -> bool {
    category.contains("biblioteca") || category.contains("ludoteca")
}

fn is_cultural(category: &str) -> bool {
    category.contains("cultural")
}

/// Whether `facility` belongs to a heuristic layer. `Favorites` and `All`
/// are not heuristic and never match here.
pub fn is_member(layer: Layer, facility: &Facility) -> bool {
    let category = facility.category.to_lowercase();
    let name = facility.name.to_lowercase();
    match layer {
        Layer::Museum => is_museum(&category, &name),
        Layer::Theater => is_theater(&name),
        Layer::Library => is_library(&category),
        Layer::Cultural => is_cultural(&category),
        Layer::Other => {
            !(is_museum(&category, &name) || is_theater(&name) || is_library(&category) || is_cultural(&category))
        }
        Layer::Favorites | Layer::All => false,
    }
}

/// Primary heuristic layer of a facility, used for marker styling.
/// Never returns `Favorites` or `All`.
pub fn classify(facility: &Facility) -> Layer {
    let category = facility.category.to_lowercase();
    let name = facility.name.to_lowercase();

    if is_museum(&category, &name) {
        Layer::Museum
    } else if is_theater(&name) {
        Layer::Theater
    } else if is_library(&category) {
        Layer::Library
    } else if is_cultural(&category) {
        Layer::Cultural
    } else {
        Layer::Other
    }
}

/// What the browser is currently looking at.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerQuery {
    pub layer: Layer,
    /// Exact raw-category match that bypasses every layer rule.
    pub activity_override: Option<String>,
}

impl LayerQuery {
    pub fn layer(layer: Layer) -> Self {
        Self { layer, activity_override: None }
    }

    pub fn with_override(mut self, activity: impl Into<String>) -> Self {
        self.activity_override = Some(activity.into());
        self
    }
}

/// Facilities visible under `query`.
pub fn filter<'a, S: AsRef<str>>(
    query: &LayerQuery,
    facilities: &'a [Facility],
    favorites: &[S],
) -> Vec<&'a Facility> {
    if let Some(ref activity) = query.activity_override {
        return facilities.iter().filter(|f| f.category == *activity).collect();
    }

    match query.layer {
        Layer::Favorites => facilities
            .iter()
            .filter(|f| {
                let name = f.name.trim();
                favorites.iter().any(|fav| fav.as_ref().trim() == name)
            })
            .collect(),
        Layer::All => facilities.iter().collect(),
        layer => facilities.iter().filter(|f| is_member(layer, f)).collect(),
    }
}
