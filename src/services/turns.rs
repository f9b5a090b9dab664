use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    FeedbackBundle, FeedbackItem, Message, MessageRole, ProficiencyLevel, SceneContext,
};
use crate::services::gateway::{CompletionGateway, GatewayError, TurnRole};
use crate::services::interpreter::{interpret_partner, interpret_tutor};
use crate::services::prompts::{compose_partner_prompt, compose_tutor_prompt};

const TUTOR_TEMPERATURE: f32 = 0.7;
const PARTNER_TEMPERATURE: f32 = 0.9;

/// Failure inside a store collaborator. Implementations map their native
/// error type into this.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("invalid turn input: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Scene catalog boundary. An unknown scene is `None`; a scene with no
/// content for the requested level yields empty vocabulary lists, never
/// an error.
#[async_trait]
pub trait SceneContextProvider: Send + Sync {
    async fn get(
        &self,
        scene_id: i64,
        level: ProficiencyLevel,
    ) -> Result<Option<SceneContext>, StoreError>;
}

/// Session catalog boundary, used to reject turns against sessions that
/// were never created.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn exists(&self, session_id: Uuid) -> Result<bool, StoreError>;
}

/// Append-only per-session transcript. Listing is chronological with a
/// stable insertion-order tie-break.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(
        &self,
        session_id: Uuid,
        role: MessageRole,
        text: &str,
    ) -> Result<Message, StoreError>;

    async fn list(&self, session_id: Uuid) -> Result<Vec<Message>, StoreError>;
}

/// Per-kind learning record writes; each item is independent.
#[async_trait]
pub trait LearningRecordSink: Send + Sync {
    async fn append(
        &self,
        session_id: Uuid,
        user_id: &str,
        item: &FeedbackItem,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct TutorTurnRequest {
    pub session_id: Uuid,
    pub user_id: String,
    pub scene_id: i64,
    pub user_input: String,
    pub native_language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PartnerTurnRequest {
    pub session_id: Uuid,
    pub user_id: String,
    pub scene_id: i64,
    pub user_input: String,
    pub english_level: Option<ProficiencyLevel>,
}

#[derive(Debug, Clone)]
pub struct TutorTurnOutcome {
    pub tutor_message: String,
    pub feedback: FeedbackBundle,
    pub needs_correction: bool,
}

#[derive(Debug, Clone)]
pub struct PartnerTurnOutcome {
    pub message: String,
}

/// Coordinates one conversation turn: record the user's utterance, build
/// context, generate, interpret, persist the assistant reply and derived
/// learning records.
pub struct TurnService {
    sessions: Arc<dyn SessionStore>,
    scenes: Arc<dyn SceneContextProvider>,
    history: Arc<dyn HistoryStore>,
    learning: Arc<dyn LearningRecordSink>,
    gateway: Arc<dyn CompletionGateway>,
}

impl TurnService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        scenes: Arc<dyn SceneContextProvider>,
        history: Arc<dyn HistoryStore>,
        learning: Arc<dyn LearningRecordSink>,
        gateway: Arc<dyn CompletionGateway>,
    ) -> Self {
        Self {
            sessions,
            scenes,
            history,
            learning,
            gateway,
        }
    }

    /// Rejects turns against sessions that were never created, before
    /// anything is written.
    async fn ensure_session(&self, session_id: Uuid) -> Result<(), TurnError> {
        if self.sessions.exists(session_id).await? {
            Ok(())
        } else {
            Err(TurnError::NotFound(format!("session {session_id} not found")))
        }
    }

    async fn scene_context(
        &self,
        scene_id: i64,
        level: ProficiencyLevel,
    ) -> Result<SceneContext, TurnError> {
        self.scenes
            .get(scene_id, level)
            .await?
            .ok_or_else(|| TurnError::NotFound(format!("scene {scene_id} not found")))
    }

    pub async fn process_tutor_turn(
        &self,
        request: TutorTurnRequest,
    ) -> Result<TutorTurnOutcome, TurnError> {
        validate_common(&request.user_id, &request.user_input)?;
        self.ensure_session(request.session_id).await?;

        // The user's utterance must be durably recorded before any model
        // call; a failure here aborts the turn with no gateway traffic.
        self.history
            .append(request.session_id, MessageRole::User, &request.user_input)
            .await?;

        let scene = self
            .scene_context(request.scene_id, ProficiencyLevel::default())
            .await?;
        let transcript = self.history.list(request.session_id).await?;

        let prompt =
            compose_tutor_prompt(&scene, &transcript, request.native_language.as_deref());
        let raw = self
            .gateway
            .complete(&prompt, &request.user_input, TUTOR_TEMPERATURE, TurnRole::Tutor)
            .await?;

        let interpreted = interpret_tutor(&raw);

        // A tutor turn's primary payload is feedback; a conversational
        // component is recorded only when one was produced.
        if !interpreted.tutor_message.is_empty() {
            self.history
                .append(
                    request.session_id,
                    MessageRole::Assistant,
                    &interpreted.tutor_message,
                )
                .await?;
        }

        self.record_learning_data(request.session_id, &request.user_id, &interpreted.feedback)
            .await;

        info!(
            session_id = %request.session_id,
            needs_correction = interpreted.needs_correction,
            "tutor turn completed"
        );

        Ok(TutorTurnOutcome {
            tutor_message: interpreted.tutor_message,
            feedback: interpreted.feedback,
            needs_correction: interpreted.needs_correction,
        })
    }

    pub async fn process_partner_turn(
        &self,
        request: PartnerTurnRequest,
    ) -> Result<PartnerTurnOutcome, TurnError> {
        validate_common(&request.user_id, &request.user_input)?;
        self.ensure_session(request.session_id).await?;

        self.history
            .append(request.session_id, MessageRole::User, &request.user_input)
            .await?;

        let level = request.english_level.unwrap_or_default();
        let scene = self.scene_context(request.scene_id, level).await?;
        let transcript = self.history.list(request.session_id).await?;

        let prompt = compose_partner_prompt(&scene, level, &transcript);
        let raw = self
            .gateway
            .complete(
                &prompt,
                &request.user_input,
                PARTNER_TEMPERATURE,
                TurnRole::Partner,
            )
            .await?;

        let message = interpret_partner(&raw);
        if message.is_empty() {
            // A blank completion would violate the non-empty assistant
            // message invariant; surface it as a provider fault.
            return Err(GatewayError::Provider("empty completion".to_string()).into());
        }

        self.history
            .append(request.session_id, MessageRole::Assistant, &message)
            .await?;

        info!(session_id = %request.session_id, "partner turn completed");

        Ok(PartnerTurnOutcome { message })
    }

    /// Best-effort: each item is written independently and a failure is
    /// logged without affecting the turn result.
    async fn record_learning_data(
        &self,
        session_id: Uuid,
        user_id: &str,
        feedback: &FeedbackBundle,
    ) {
        for item in feedback.items() {
            if let Err(err) = self.learning.append(session_id, user_id, &item).await {
                warn!(
                    session_id = %session_id,
                    kind = item.kind(),
                    error = %err,
                    "failed to persist learning record"
                );
            }
        }
    }
}

fn validate_common(user_id: &str, user_input: &str) -> Result<(), TurnError> {
    if user_id.trim().is_empty() {
        return Err(TurnError::Validation("user_id is required".to_string()));
    }
    if user_input.trim().is_empty() {
        return Err(TurnError::Validation("user_input is required".to_string()));
    }
    Ok(())
}
