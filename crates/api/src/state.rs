use std::sync::Arc;

use hearth_core::localization::Translations;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is a pool handle or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: hearth_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Post-commit notifications are published here.
    pub event_bus: Arc<hearth_events::EventBus>,
    /// Catalogs for translating system entities.
    pub translations: Arc<Translations>,
}
