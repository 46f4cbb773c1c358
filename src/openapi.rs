//! OpenAPI document for the HTTP surface, served at `/api/openapi.json` and printed by
//! `--print-openapi`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{fires, health};
use crate::services::fires::rules::{ConfidenceTier, RegionPreset, Severity, SourceInfo};
use crate::services::fires::stats::{TrendDirection, TrendSummary};
use crate::services::fires::{FireDetection, SourceError, StatisticsSnapshot};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "firewatch-server",
        description = "Active fire detections from NASA FIRMS, merged across satellite sources."
    ),
    tags(
        (name = "fires", description = "Detections, statistics and lookup tables")
    ),
    paths(
        health::healthz_handler,
        fires::list_fires,
        fires::fire_stats,
        fires::list_sources,
        fires::list_regions,
        fires::list_confidence_levels,
        fires::clear_cache,
    ),
    components(schemas(
        health::HealthResponse,
        fires::FiresResponse,
        fires::FireStatsResponse,
        fires::RegionsResponse,
        fires::SourcesResponse,
        fires::CacheClearResponse,
        FireDetection,
        SourceError,
        StatisticsSnapshot,
        TrendSummary,
        TrendDirection,
        Severity,
        ConfidenceTier,
        SourceInfo,
        RegionPreset,
    ))
)]
pub struct ApiDoc;

pub fn openapi_json() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi_json())
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/openapi.json", get(openapi_handler))
}
