use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::AppResult;
use crate::services::fires::rules::{self, ConfidenceTier, RegionPreset, SourceInfo};
use crate::services::fires::{
    DetectionQuery, FireDetection, SourceError, SourceFetcher, StatisticsSnapshot,
};
use crate::state::AppState;

const NO_DETECTIONS_MESSAGE: &str = "No active fire detections for this area and time window";
const ALL_SOURCES_FAILED_MESSAGE: &str =
    "No fire data could be retrieved; every satellite source failed";

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct FiresQuery {
    /// Satellite source id or `ALL`.
    source: Option<String>,
    /// Day window, clamped to the configured maximum.
    days: Option<u32>,
    /// `minLon,minLat,maxLon,maxLat`.
    bbox: Option<String>,
    /// Region preset id; wins over `bbox`.
    region: Option<String>,
}

impl FiresQuery {
    fn resolve<F>(&self, state: &AppState<F>) -> AppResult<DetectionQuery> {
        Ok(DetectionQuery::resolve(
            self.source.as_deref(),
            self.days,
            self.bbox.as_deref(),
            self.region.as_deref(),
            &state.config.default_region,
            state.config.max_day_window,
        )?)
    }
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct FiresResponse {
    data: Vec<FireDetection>,
    count: usize,
    cached: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<SourceError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct FireStatsResponse {
    source: String,
    days: u32,
    area: String,
    bbox: String,
    cached: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<SourceError>,
    #[serde(flatten)]
    stats: StatisticsSnapshot,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct RegionsResponse {
    default_region: String,
    regions: Vec<RegionPreset>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct SourcesResponse {
    all: &'static str,
    sources: Vec<SourceInfo>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct CacheClearResponse {
    cleared: usize,
}

#[utoipa::path(
    get,
    path = "/api/fires",
    tag = "fires",
    params(FiresQuery),
    responses(
        (status = 200, description = "Merged fire detections, newest first", body = FiresResponse),
        (status = 400, description = "Unknown source or region, or malformed bbox"),
        (status = 500, description = "FIRMS map key not configured")
    )
)]
pub(crate) async fn list_fires<F>(
    State(state): State<AppState<F>>,
    Query(params): Query<FiresQuery>,
) -> AppResult<Json<FiresResponse>>
where
    F: SourceFetcher + Clone + 'static,
{
    let query = params.resolve(&state)?;
    let set = state.fires.detections(&query).await?;

    let message = if set.detections.is_empty() {
        Some(if set.is_total_failure() {
            ALL_SOURCES_FAILED_MESSAGE.to_string()
        } else {
            NO_DETECTIONS_MESSAGE.to_string()
        })
    } else {
        None
    };

    Ok(Json(FiresResponse {
        count: set.detections.len(),
        data: set.detections.as_ref().clone(),
        cached: set.cached,
        errors: set.errors,
        message,
    }))
}

#[utoipa::path(
    get,
    path = "/api/fires/stats",
    tag = "fires",
    params(FiresQuery),
    responses(
        (status = 200, description = "Aggregate statistics for the query", body = FireStatsResponse),
        (status = 400, description = "Unknown source or region, or malformed bbox"),
        (status = 500, description = "FIRMS map key not configured")
    )
)]
pub(crate) async fn fire_stats<F>(
    State(state): State<AppState<F>>,
    Query(params): Query<FiresQuery>,
) -> AppResult<Json<FireStatsResponse>>
where
    F: SourceFetcher + Clone + 'static,
{
    let query = params.resolve(&state)?;
    let report = state.fires.statistics(&query).await?;

    Ok(Json(FireStatsResponse {
        source: query.source.id().to_string(),
        days: query.day_window,
        area: query.area.label(),
        bbox: query.bbox.to_string(),
        cached: report.cached,
        errors: report.errors,
        stats: report.snapshot.as_ref().clone(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/sources",
    tag = "fires",
    responses((status = 200, description = "Satellite sources", body = SourcesResponse))
)]
pub(crate) async fn list_sources() -> Json<SourcesResponse> {
    Json(SourcesResponse {
        all: rules::ALL_SOURCES,
        sources: rules::SOURCES.to_vec(),
    })
}

#[utoipa::path(
    get,
    path = "/api/regions",
    tag = "fires",
    responses((status = 200, description = "Region presets", body = RegionsResponse))
)]
pub(crate) async fn list_regions<F>(State(state): State<AppState<F>>) -> Json<RegionsResponse>
where
    F: SourceFetcher + Clone + 'static,
{
    Json(RegionsResponse {
        default_region: state.config.default_region.clone(),
        regions: rules::REGIONS.to_vec(),
    })
}

#[utoipa::path(
    get,
    path = "/api/confidence-levels",
    tag = "fires",
    responses((status = 200, description = "Confidence tiers", body = Vec<ConfidenceTier>))
)]
pub(crate) async fn list_confidence_levels() -> Json<Vec<ConfidenceTier>> {
    Json(rules::CONFIDENCE_TIERS.to_vec())
}

#[utoipa::path(
    post,
    path = "/api/cache/clear",
    tag = "fires",
    responses((status = 200, description = "Cache entries removed", body = CacheClearResponse))
)]
pub(crate) async fn clear_cache<F>(State(state): State<AppState<F>>) -> Json<CacheClearResponse>
where
    F: SourceFetcher + Clone + 'static,
{
    let cleared = state.fires.clear_caches().await;
    tracing::info!(cleared, "fire caches cleared");
    Json(CacheClearResponse { cleared })
}

pub fn router<F>() -> Router<AppState<F>>
where
    F: SourceFetcher + Clone + 'static,
{
    Router::new()
        .route("/fires", get(list_fires::<F>))
        .route("/fires/stats", get(fire_stats::<F>))
        .route("/sources", get(list_sources))
        .route("/regions", get(list_regions::<F>))
        .route("/confidence-levels", get(list_confidence_levels))
        .route("/cache/clear", post(clear_cache::<F>))
}
