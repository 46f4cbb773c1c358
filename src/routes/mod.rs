pub mod fires;
pub mod health;

use axum::Router;

use crate::services::fires::SourceFetcher;
use crate::state::AppState;

pub fn router<F>(state: AppState<F>) -> Router
where
    F: SourceFetcher + Clone + 'static,
{
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(fires::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}
