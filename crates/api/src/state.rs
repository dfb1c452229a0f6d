use std::sync::Arc;

use folio_engine::Engine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the config is behind `Arc` and the engine shares its
/// collaborators internally.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (JWT settings are read by the auth extractors).
    pub config: Arc<ServerConfig>,
    /// The wiki engine every handler delegates to.
    pub engine: Engine,
}
