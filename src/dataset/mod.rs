//! Dataset subsystem: catalog resolution, GeoJSON download and typed records.
//!
//! The facility set is loaded once per session and shared read-only.

pub mod loader;
pub mod types;

pub use loader::{DatasetLoader, HttpFetch, StaticFetcher, UreqFetcher};
pub use types::{Coordinate, DatasetError, Facility, RawFeature, StopRecord, TransitKind, TransitStop};
