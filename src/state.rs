use crate::config::FirewatchConfig;
use crate::services::fires::{FireService, FirmsClient};
use std::sync::Arc;

/// Shared handler state. Production runs over [`FirmsClient`]; tests swap in a scripted
/// fetcher.
#[derive(Clone)]
pub struct AppState<F = FirmsClient> {
    pub config: FirewatchConfig,
    pub fires: Arc<FireService<F>>,
}
