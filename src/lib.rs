pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::state::AppState;

/// Assembles the router for a given application state. Integration tests
/// build the state with fake collaborators and drive this directly.
pub fn create_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Wires the production collaborators: Postgres-backed stores and the
/// real completion gateway, injected rather than held as globals.
pub fn build_turn_service(
    db: Database,
    gateway: Arc<dyn services::gateway::CompletionGateway>,
) -> services::turns::TurnService {
    services::turns::TurnService::new(
        Arc::new(db::sessions::SqlSessionStore::new(db.clone())),
        Arc::new(db::scenes::SqlSceneProvider::new(db.clone())),
        Arc::new(db::history::SqlHistoryStore::new(db.clone())),
        Arc::new(db::learning::SqlLearningRecordSink::new(db)),
        gateway,
    )
}
