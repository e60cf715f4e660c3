//! Island-wide facility counts by class.

use crate::dataset::Facility;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IslandStats {
    pub libraries: usize,
    pub museums: usize,
    pub education: usize,
    pub cultural: usize,
    pub total: usize,
}

impl IslandStats {
    /// Each facility counts towards its first matching class; unmatched ones
    /// only count towards `total`.
    pub fn compute(facilities: &[Facility]) -> Self {
        let mut stats = Self { total: facilities.len(), ..Self::default() };
        for f in facilities {
            let category = f.category.to_lowercase();
            if category.contains("biblioteca") {
                stats.libraries += 1;
            } else if category.contains("museo") {
                stats.museums += 1;
            } else if category.contains("enseñanza") || category.contains("guarderias") {
                stats.education += 1;
            } else if category.contains("cultural") {
                stats.cultural += 1;
            }
        }
        stats
    }
}
