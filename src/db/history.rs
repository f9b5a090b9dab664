use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Message, MessageRole};
use crate::services::turns::{HistoryStore, StoreError};

/// Postgres-backed transcript store. Listing orders by timestamp with a
/// serial-id tie-break so same-millisecond writes keep insertion order.
#[derive(Clone)]
pub struct SqlHistoryStore {
    db: Database,
}

impl SqlHistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryStore for SqlHistoryStore {
    async fn append(
        &self,
        session_id: Uuid,
        role: MessageRole,
        text: &str,
    ) -> Result<Message, StoreError> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO "messages" ("session_id", "role", "text", "timestamp")
            VALUES ($1, $2, $3, $4)
            RETURNING "id"
            "#,
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(text)
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;

        Ok(Message {
            id: row.try_get("id")?,
            session_id,
            role,
            text: text.to_string(),
            timestamp: now,
        })
    }

    async fn list(&self, session_id: Uuid) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT "id", "role", "text", "timestamp"
            FROM "messages"
            WHERE "session_id" = $1
            ORDER BY "timestamp" ASC, "id" ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                let role_str: String = row.try_get("role")?;
                let role = MessageRole::from_str(&role_str)
                    .ok_or_else(|| StoreError(format!("unknown message role: {role_str}")))?;
                Ok(Message {
                    id: row.try_get("id")?,
                    session_id,
                    role,
                    text: row.try_get("text")?,
                    timestamp: row.try_get::<DateTime<Utc>, _>("timestamp")?,
                })
            })
            .collect()
    }
}
