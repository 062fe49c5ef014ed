use std::sync::Arc;

use sonaa_db::store::{ActorDirectory, ProjectStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the stores are injected so tests can swap in the
/// in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub projects: Arc<dyn ProjectStore>,
    /// User and role lookup used to resolve the acting user.
    pub directory: Arc<dyn ActorDirectory>,
    pub config: Arc<ServerConfig>,
}
