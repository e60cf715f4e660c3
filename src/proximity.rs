//! Nearest transit stops to a point.
//!
//! Tram and bus datasets are fetched concurrently; a failed fetch only
//! removes that network's stops from the result.

use crate::dataset::{Coordinate, DatasetLoader, StopRecord, TransitKind, TransitStop};
use std::cmp::Ordering;
use tracing::{debug, warn};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const NEAREST_STOPS: usize = 4;

/// Great-circle distance in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Distances from `reference` to every stop, ascending, capped at `limit`.
pub fn nearest(reference: Coordinate, stops: &[StopRecord], limit: usize) -> Vec<TransitStop> {
    let mut ranked: Vec<TransitStop> = stops
        .iter()
        .map(|s| TransitStop {
            name: s.name.clone(),
            url: s.url.clone(),
            kind: s.kind,
            distance_km: haversine_km(reference, Coordinate::new(s.lat, s.lon)),
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_km.partial_cmp(&b.distance_km).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

/// Looks up stops from the two transit catalogs.
#[derive(Clone)]
pub struct ProximityFinder {
    loader: DatasetLoader,
    tram_dataset: String,
    bus_dataset: String,
}

impl ProximityFinder {
    pub fn new(loader: DatasetLoader, tram_dataset: impl Into<String>, bus_dataset: impl Into<String>) -> Self {
        Self {
            loader,
            tram_dataset: tram_dataset.into(),
            bus_dataset: bus_dataset.into(),
        }
    }

    /// The four stops closest to `reference` across both networks.
    pub async fn nearest_stops(&self, reference: Coordinate) -> Vec<TransitStop> {
        let (trams, buses) = tokio::join!(
            self.loader.load_stops(&self.tram_dataset, TransitKind::Tram),
            self.loader.load_stops(&self.bus_dataset, TransitKind::Bus),
        );

        if trams.is_empty() || buses.is_empty() {
            warn!(trams = trams.len(), buses = buses.len(), "transit lookup is partial");
        }

        let mut stops = trams;
        stops.extend(buses);
        let found = nearest(reference, &stops, NEAREST_STOPS);
        debug!(candidates = stops.len(), returned = found.len(), "nearest stops");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StaticFetcher;
    use approx::assert_abs_diff_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const CATALOG: &str = "https://catalog.test/package_show";

    fn stop(name: &str, kind: TransitKind, lat: f64, lon: f64) -> StopRecord {
        StopRecord { name: name.into(), url: "#".into(), kind, lat, lon }
    }

    #[test]
    fn test_haversine_identity() {
        let p = Coordinate::new(28.4636, -16.2518);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let pairs = [
            (Coordinate::new(28.4636, -16.2518), Coordinate::new(28.4853, -16.3201)),
            (Coordinate::new(-33.86, 151.21), Coordinate::new(51.50, -0.12)),
            (Coordinate::new(0.0, 179.9), Coordinate::new(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert_abs_diff_eq!(haversine_km(a, b), haversine_km(b, a), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude ≈ 111.19 km on a 6371 km sphere.
        let d = haversine_km(Coordinate::new(28.0, -16.5), Coordinate::new(29.0, -16.5));
        assert_abs_diff_eq!(d, 111.195, epsilon = 0.01);
    }

    #[test]
    fn test_nearest_merges_and_caps() {
        let here = Coordinate::new(28.46, -16.25);
        let stops = vec![
            stop("far bus", TransitKind::Bus, 28.60, -16.25),
            stop("near tram", TransitKind::Tram, 28.461, -16.25),
            stop("mid bus", TransitKind::Bus, 28.47, -16.25),
            stop("mid tram", TransitKind::Tram, 28.48, -16.25),
            stop("farther tram", TransitKind::Tram, 28.50, -16.25),
        ];
        let got = nearest(here, &stops, NEAREST_STOPS);
        let names: Vec<&str> = got.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["near tram", "mid bus", "mid tram", "farther tram"]);
        assert_eq!(got[1].kind, TransitKind::Bus);
    }

    fn network(id: &str, stops: Value) -> StaticFetcher {
        let resource = format!("https://data.test/{}.geojson", id);
        StaticFetcher::new()
            .with(
                format!("{}?id={}", CATALOG, id),
                json!({ "result": { "resources": [{ "format": "GeoJSON", "url": resource }] } }),
            )
            .with(resource, json!({ "features": stops }))
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_network() {
        // Only the bus catalog answers.
        let fetcher = network(
            "bus",
            json!([
                { "geometry": { "coordinates": [-16.25, 28.47] }, "properties": { "parada_nombre": "Intercambiador", "parada_url": "https://bus.test/1" } },
                { "geometry": { "coordinates": [-16.25, 28.49] }, "properties": { "parada_nombre": "La Paz" } }
            ]),
        );
        let finder = ProximityFinder::new(DatasetLoader::new(CATALOG, Arc::new(fetcher)), "tram", "bus");
        let got = finder.nearest_stops(Coordinate::new(28.46, -16.25)).await;
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|s| s.kind == TransitKind::Bus));
        assert_eq!(got[0].name, "Intercambiador");
        assert_eq!(got[0].url, "https://bus.test/1");
        assert_eq!(got[1].url, "#");
    }

    #[tokio::test]
    async fn test_both_failing_is_empty() {
        let finder = ProximityFinder::new(DatasetLoader::new(CATALOG, Arc::new(StaticFetcher::new())), "tram", "bus");
        assert!(finder.nearest_stops(Coordinate::new(28.46, -16.25)).await.is_empty());
    }
}
