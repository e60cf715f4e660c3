//! Catalog resolution and GeoJSON download.
//!
//! Flow:  descriptor (`package_show?id=`) → first `geojson` resource → FeatureCollection.
//! Every failure degrades to an empty list at [`DatasetLoader::load`].

use super::types::{DatasetError, Facility, RawFeature, StopRecord, TransitKind};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "GeoLearn/0.1 (discovery-engine)";

/// Blocking JSON fetch. Implementations must be shareable across threads.
pub trait HttpFetch: Send + Sync {
    fn get_json(&self, url: &str) -> Result<Value, DatasetError>;
}

/// Production fetcher backed by a `ureq` agent.
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }
}

impl HttpFetch for UreqFetcher {
    fn get_json(&self, url: &str) -> Result<Value, DatasetError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| DatasetError::Network(e.to_string()))?;

        response
            .into_json()
            .map_err(|e| DatasetError::InvalidResponse(e.to_string()))
    }
}

/// In-memory fetcher serving canned documents by exact URL.
#[derive(Default, Clone)]
pub struct StaticFetcher {
    documents: HashMap<String, Value>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: Value) -> Self {
        self.documents.insert(url.into(), body);
        self
    }
}

impl HttpFetch for StaticFetcher {
    fn get_json(&self, url: &str) -> Result<Value, DatasetError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| DatasetError::Network(format!("no route to {}", url)))
    }
}

// ─── Catalog documents ──────────────────────────────────────────

#[derive(Deserialize)]
struct CatalogDescriptor {
    result: CatalogPackage,
}

#[derive(Deserialize)]
struct CatalogPackage {
    #[serde(default)]
    resources: Vec<ResourceDescriptor>,
}

#[derive(Deserialize)]
struct ResourceDescriptor {
    #[serde(default)]
    format: String,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

// ─── Loader ─────────────────────────────────────────────────────

/// Resolves catalog identifiers to GeoJSON resources and downloads them.
#[derive(Clone)]
pub struct DatasetLoader {
    catalog_url: String,
    fetcher: Arc<dyn HttpFetch>,
}

impl DatasetLoader {
    pub fn new(catalog_url: impl Into<String>, fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            catalog_url: catalog_url.into(),
            fetcher,
        }
    }

    /// URL of the descriptor document for a dataset id.
    pub fn descriptor_url(&self, dataset_id: &str) -> String {
        format!("{}?id={}", self.catalog_url, urlencod(dataset_id))
    }

    /// Find the download URL of the first resource declared as `geojson`.
    pub fn resolve_resource_url(&self, dataset_id: &str) -> Result<String, DatasetError> {
        let descriptor = self.fetcher.get_json(&self.descriptor_url(dataset_id))?;
        let descriptor: CatalogDescriptor = serde_json::from_value(descriptor)
            .map_err(|e| DatasetError::InvalidResponse(e.to_string()))?;

        descriptor
            .result
            .resources
            .into_iter()
            .find(|r| r.format.eq_ignore_ascii_case("geojson"))
            .map(|r| r.url)
            .ok_or_else(|| DatasetError::NoGeoJsonResource(dataset_id.to_string()))
    }

    /// Blocking resolve + download + parse.
    pub fn try_load(&self, dataset_id: &str) -> Result<Vec<RawFeature>, DatasetError> {
        let url = self.resolve_resource_url(dataset_id)?;
        debug!(dataset = dataset_id, %url, "resolved geojson resource");

        let body = self.fetcher.get_json(&url)?;
        let collection: FeatureCollection = serde_json::from_value(body)
            .map_err(|e| DatasetError::InvalidResponse(e.to_string()))?;
        Ok(collection.features)
    }

    /// Load a dataset's raw features. Never fails: errors are logged and an
    /// empty list is returned.
    pub async fn load(&self, dataset_id: &str) -> Vec<RawFeature> {
        let loader = self.clone();
        let id = dataset_id.to_string();
        let outcome = tokio::task::spawn_blocking(move || loader.try_load(&id)).await;

        match outcome {
            Ok(Ok(features)) => {
                debug!(dataset = dataset_id, count = features.len(), "dataset loaded");
                features
            }
            Ok(Err(e)) => {
                warn!(dataset = dataset_id, error = %e, "dataset unavailable, using empty list");
                Vec::new()
            }
            Err(e) => {
                warn!(dataset = dataset_id, error = %e, "dataset task failed, using empty list");
                Vec::new()
            }
        }
    }

    pub async fn load_facilities(&self, dataset_id: &str) -> Vec<Facility> {
        let features = self.load(dataset_id).await;
        let total = features.len();
        let facilities: Vec<Facility> = features.iter().filter_map(Facility::from_feature).collect();
        if facilities.len() < total {
            debug!(dataset = dataset_id, skipped = total - facilities.len(), "features without a point");
        }
        facilities
    }

    pub async fn load_stops(&self, dataset_id: &str, kind: TransitKind) -> Vec<StopRecord> {
        self.load(dataset_id)
            .await
            .iter()
            .filter_map(|f| StopRecord::from_feature(f, kind))
            .collect()
    }
}

// ─── URL encoding (query values only) ───────────────────────────

fn urlencod(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}
