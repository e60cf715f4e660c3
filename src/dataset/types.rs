//! Core types for the dataset subsystem.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One feature of a point FeatureCollection, before any typing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub geometry: Option<RawGeometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGeometry {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl RawFeature {
    /// GeoJSON stores `[lon, lat]`; anything other than a pair is rejected.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self.geometry.as_ref()?.coordinates.as_slice() {
            [lon, lat] => Some(Coordinate::new(*lat, *lon)),
            _ => None,
        }
    }

    /// A property as text. Numbers are rendered, null and missing give `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Like [`RawFeature::text`] but treats blank strings as missing.
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.text(key).filter(|s| !s.trim().is_empty())
    }
}

/// An educational or cultural facility. Identity is the display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    /// Raw `actividad_tipo` from the dataset.
    pub category: String,
    pub municipality: String,
    pub street: String,
    pub street_number: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl Facility {
    /// Build a facility from a raw feature. Features without a point are skipped.
    pub fn from_feature(feature: &RawFeature) -> Option<Self> {
        let at = feature.coordinate()?;
        Some(Self {
            name: feature.text("nombre").unwrap_or_default(),
            category: feature.text("actividad_tipo").unwrap_or_default(),
            municipality: feature.text("municipio_nombre").unwrap_or_default(),
            street: feature.text("direccion_nombre_via").unwrap_or_default(),
            street_number: feature.text("direccion_numero").unwrap_or_default(),
            phone: feature.non_empty("telefono"),
            website: feature.non_empty("web"),
            lat: at.lat,
            lon: at.lon,
        })
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// Derived key over name and position.
    ///
    /// Facilities are identified by display name everywhere else (favorites,
    /// selection), so two facilities sharing a name are indistinguishable
    /// there. This key tells them apart without changing that behavior.
    pub fn stable_key(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(self.name.as_bytes());
        hasher.write(&self.lat.to_bits().to_le_bytes());
        hasher.write(&self.lon.to_bits().to_le_bytes());
        hasher.finish()
    }
}

/// Which transit network a stop belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitKind {
    Tram,
    Bus,
}

impl fmt::Display for TransitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tram => write!(f, "tram"),
            Self::Bus => write!(f, "bus"),
        }
    }
}

/// A transit stop as loaded, before any distance is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopRecord {
    pub name: String,
    pub url: String,
    pub kind: TransitKind,
    pub lat: f64,
    pub lon: f64,
}

impl StopRecord {
    pub fn from_feature(feature: &RawFeature, kind: TransitKind) -> Option<Self> {
        let at = feature.coordinate()?;
        Some(Self {
            name: feature.non_empty("parada_nombre").unwrap_or_else(|| "Parada".into()),
            url: feature.non_empty("parada_url").unwrap_or_else(|| "#".into()),
            kind,
            lat: at.lat,
            lon: at.lon,
        })
    }
}

/// A stop annotated with its distance to some reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitStop {
    pub name: String,
    pub url: String,
    pub kind: TransitKind,
    pub distance_km: f64,
}

/// Dataset fetch errors. Never surfaced past [`super::DatasetLoader::load`].
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("dataset '{0}' has no geojson resource")]
    NoGeoJsonResource(String),
}
