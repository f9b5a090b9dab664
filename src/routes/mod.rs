mod conversation;
mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/conversation/tutor", post(conversation::tutor_turn))
        .route("/api/conversation/partner", post(conversation::partner_turn))
        .route("/api/conversation/session", post(conversation::create_session))
        .with_state(state)
}
