use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::Database;
use crate::models::ConversationSession;
use crate::services::turns::{SessionStore, StoreError};

/// Starts a new practice session for a user and scene.
pub async fn create_session(
    db: &Database,
    user_id: &str,
    scene_id: i64,
) -> Result<ConversationSession, sqlx::Error> {
    let id = Uuid::new_v4();
    let started_at = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO "conversation_sessions" ("id", "user_id", "scene_id", "started_at")
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(scene_id)
    .bind(started_at)
    .execute(db.pool())
    .await?;

    Ok(ConversationSession {
        id,
        user_id: user_id.to_string(),
        scene_id,
        started_at,
        ended_at: None,
    })
}

/// Session existence lookups for turn handling.
#[derive(Clone)]
pub struct SqlSessionStore {
    db: Database,
}

impl SqlSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn exists(&self, session_id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS "one"
            FROM "conversation_sessions"
            WHERE "id" = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.is_some())
    }
}
