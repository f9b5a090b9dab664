use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::sessions;
use crate::models::{FeedbackBundle, ProficiencyLevel};
use crate::response::AppError;
use crate::services::turns::{PartnerTurnRequest, TutorTurnRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Uuid,
    pub user_id: String,
    pub scene_id: i64,
    pub user_input: String,
    pub native_language: Option<String>,
    pub english_level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TutorTurnResponse {
    pub tutor_message: String,
    pub feedback: FeedbackBundle,
    pub needs_correction: bool,
}

#[derive(Debug, Serialize)]
pub struct PartnerTurnResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
    pub scene_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: Uuid,
    pub user_id: String,
    pub scene_id: i64,
    pub started_at: String,
}

pub async fn tutor_turn(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TutorTurnResponse>, AppError> {
    let outcome = state
        .turns()
        .process_tutor_turn(TutorTurnRequest {
            session_id: request.session_id,
            user_id: request.user_id,
            scene_id: request.scene_id,
            user_input: request.user_input,
            native_language: request.native_language,
        })
        .await?;

    Ok(Json(TutorTurnResponse {
        tutor_message: outcome.tutor_message,
        feedback: outcome.feedback,
        needs_correction: outcome.needs_correction,
    }))
}

pub async fn partner_turn(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<PartnerTurnResponse>, AppError> {
    let english_level = parse_level(request.english_level.as_deref())?;

    let outcome = state
        .turns()
        .process_partner_turn(PartnerTurnRequest {
            session_id: request.session_id,
            user_id: request.user_id,
            scene_id: request.scene_id,
            user_input: request.user_input,
            english_level,
        })
        .await?;

    Ok(Json(PartnerTurnResponse {
        message: outcome.message,
    }))
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::validation("user_id is required"));
    }

    let Some(db) = state.db() else {
        return Err(AppError::internal("database not available"));
    };

    let session = sessions::create_session(db, &request.user_id, request.scene_id)
        .await
        .map_err(|e| AppError::persistence(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            id: session.id,
            user_id: session.user_id,
            scene_id: session.scene_id,
            started_at: session
                .started_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    ))
}

fn parse_level(raw: Option<&str>) -> Result<Option<ProficiencyLevel>, AppError> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => ProficiencyLevel::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("unknown english_level: {s}"))),
    }
}
