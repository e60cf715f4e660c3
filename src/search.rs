//! Map search box: resolve a typed query to an activity type or to names.
//!
//! An activity hit yields the official `actividad_tipo`, which callers feed
//! back into the layer filter as the activity override.

use crate::category::normalize;
use crate::dataset::Facility;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuickSearch<'a> {
    Empty,
    Activity {
        official_name: String,
        facilities: Vec<&'a Facility>,
    },
    Names {
        facilities: Vec<&'a Facility>,
    },
    NotFound {
        query: String,
    },
}

pub fn quick_search<'a>(facilities: &'a [Facility], query: &str) -> QuickSearch<'a> {
    let clean = query.trim().to_lowercase();
    if clean.is_empty() {
        return QuickSearch::Empty;
    }

    let normalized = normalize(&clean).to_lowercase();
    let activity: Vec<&Facility> = facilities
        .iter()
        .filter(|f| {
            let category = f.category.to_lowercase();
            category == normalized || category.contains(&clean)
        })
        .collect();

    // Short queries only count as an activity when they are unambiguous enough.
    if !activity.is_empty() && (clean.chars().count() > 3 || activity.len() > 1) {
        return QuickSearch::Activity {
            official_name: activity[0].category.clone(),
            facilities: activity,
        };
    }

    let by_name: Vec<&Facility> = facilities
        .iter()
        .filter(|f| f.name.to_lowercase().contains(&clean))
        .collect();

    if by_name.is_empty() {
        QuickSearch::NotFound { query: query.to_string() }
    } else {
        QuickSearch::Names { facilities: by_name }
    }
}
