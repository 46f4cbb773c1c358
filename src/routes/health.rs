use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::services::fires::SourceFetcher;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// False when no FIRMS map key is configured; fire queries will fail.
    pub firms_configured: bool,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "OK", body = HealthResponse))
)]
pub(crate) async fn healthz_handler<F>(State(state): State<AppState<F>>) -> Json<HealthResponse>
where
    F: SourceFetcher + Clone + 'static,
{
    Json(HealthResponse {
        status: "ok".to_string(),
        firms_configured: state.fires.has_credential(),
    })
}

pub fn router<F>() -> Router<AppState<F>>
where
    F: SourceFetcher + Clone + 'static,
{
    Router::new().route("/healthz", get(healthz_handler::<F>))
}
