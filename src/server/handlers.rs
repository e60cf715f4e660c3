use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError};
use std::time::Instant;
use tracing::info;

use crate::dataset::{Coordinate, Facility, TransitStop};
use crate::layers::{self, Layer, LayerQuery};
use crate::ranking::{self, RankOptions, SearchHit};
use crate::search;
use crate::stats::IslandStats;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    let v = value.as_deref().unwrap_or("").trim();
    if v.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, format!("Missing '{}' parameter", name)));
    }
    Ok(v)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

// ─── GET /api/search ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn quick_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Response {
    let start = Instant::now();
    let q = params.q.unwrap_or_default();
    let result = search::quick_search(&state.facilities, &q);
    info!(q = %q, elapsed_ms = elapsed_ms(start), "GET /api/search");
    Json(result).into_response()
}

// ─── GET /api/rank ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RankQuery {
    /// Comma-separated keywords.
    pub keywords: Option<String>,
}

pub async fn rank(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RankQuery>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let start = Instant::now();
    let raw = required(&params.keywords, "keywords")?;
    let keywords: Vec<String> = raw.split(',').map(|k| k.trim().to_string()).collect();
    let hits = ranking::rank(&state.facilities, &keywords, &RankOptions::default());
    info!(keywords = raw, hits = hits.len(), elapsed_ms = elapsed_ms(start), "GET /api/rank");
    Ok(Json(hits))
}

// ─── GET /api/ask ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AskQuery {
    pub q: Option<String>,
    pub session: Option<String>,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AskQuery>,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let q = required(&params.q, "q")?.to_string();
    let session_id = params.session.as_deref().unwrap_or("default");

    let session = state.sessions.acquire(session_id, &state.assistant);
    let answer = session.submit(Arc::clone(&state.facilities), q.clone()).await;
    state.sessions.release(session);
    info!(q = %q, session = session_id, superseded = answer.is_none(), elapsed_ms = elapsed_ms(start), "GET /api/ask");

    match answer {
        Some(answer) => Ok(Json(answer).into_response()),
        None => Err(api_error(StatusCode::CONFLICT, "Superseded by a newer question")),
    }
}

// ─── GET /api/layers, /api/layer ─────────────────────────────────

#[derive(Serialize)]
pub struct LayerInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub count: usize,
}

pub async fn layer_list(State(state): State<Arc<AppState>>) -> Json<Vec<LayerInfo>> {
    let favorites = state.favorites.lock().unwrap_or_else(PoisonError::into_inner);
    let infos = Layer::BROWSABLE
        .iter()
        .map(|layer| LayerInfo {
            id: layer.id(),
            label: layer.label(),
            count: layers::filter(&LayerQuery::layer(*layer), &state.facilities, favorites.names()).len(),
        })
        .collect();
    Json(infos)
}

#[derive(Deserialize)]
pub struct LayerParams {
    pub layer: Option<String>,
    pub activity: Option<String>,
}

#[derive(Serialize)]
pub struct LayerResponse<'a> {
    pub layer: Layer,
    pub activity: Option<String>,
    pub count: usize,
    pub facilities: Vec<&'a Facility>,
}

pub async fn layer(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LayerParams>,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let layer: Layer = match params.layer.as_deref() {
        Some(id) => id.parse().map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e))?,
        None => Layer::Other,
    };
    let activity = params.activity.filter(|a| !a.is_empty());
    let query = LayerQuery {
        layer,
        activity_override: activity.clone(),
    };

    let favorites = state.favorites.lock().unwrap_or_else(PoisonError::into_inner);
    let visible = layers::filter(&query, &state.facilities, favorites.names());
    info!(%layer, ?activity, count = visible.len(), elapsed_ms = elapsed_ms(start), "GET /api/layer");

    Ok(Json(LayerResponse {
        layer,
        activity,
        count: visible.len(),
        facilities: visible,
    })
    .into_response())
}

// ─── GET /api/nearby ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<Vec<TransitStop>>, ApiError> {
    let start = Instant::now();
    let reference = if let (Some(lat), Some(lon)) = (params.lat, params.lon) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(api_error(StatusCode::BAD_REQUEST, "Invalid coordinates. Lat: -90..90, Lon: -180..180"));
        }
        Coordinate::new(lat, lon)
    } else if let Some(ref name) = params.name {
        find_by_name(&state.facilities, name)
            .map(Facility::coordinate)
            .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Facility not found: '{}'", name)))?
    } else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'name' or 'lat'+'lon' parameters"));
    };

    let stops = state.proximity.nearest_stops(reference).await;
    info!(lat = reference.lat, lon = reference.lon, stops = stops.len(), elapsed_ms = elapsed_ms(start), "GET /api/nearby");
    Ok(Json(stops))
}

fn find_by_name<'a>(facilities: &'a [Facility], name: &str) -> Option<&'a Facility> {
    let name = name.trim().to_lowercase();
    facilities.iter().find(|f| f.name.trim().to_lowercase() == name)
}

// ─── /api/favorites ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct FavoriteBody {
    pub name: String,
}

pub async fn favorites_list(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let favorites = state.favorites.lock().unwrap_or_else(PoisonError::into_inner);
    Json(favorites.names().to_vec())
}

pub async fn favorites_add(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FavoriteBody>,
) -> Result<Json<Vec<String>>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'name'"));
    }
    let mut favorites = state.favorites.lock().unwrap_or_else(PoisonError::into_inner);
    let added = favorites.add(&body.name);
    info!(name = %body.name, added, "POST /api/favorites");
    Ok(Json(favorites.names().to_vec()))
}

pub async fn favorites_remove(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FavoriteBody>,
) -> Json<Vec<String>> {
    let mut favorites = state.favorites.lock().unwrap_or_else(PoisonError::into_inner);
    let removed = favorites.remove(&body.name);
    info!(name = %body.name, removed, "DELETE /api/favorites");
    Json(favorites.names().to_vec())
}

// ─── GET /api/stats ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: IslandStats,
    pub loaded_at: String,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        stats: IslandStats::compute(&state.facilities),
        loaded_at: state.loaded_at.to_rfc3339(),
    })
}
