use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::Database;
use crate::models::FeedbackItem;
use crate::services::turns::{LearningRecordSink, StoreError};

/// Append-only learning record writes, one table per feedback kind.
/// No cross-kind transaction: each append stands alone.
#[derive(Clone)]
pub struct SqlLearningRecordSink {
    db: Database,
}

impl SqlLearningRecordSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LearningRecordSink for SqlLearningRecordSink {
    async fn append(
        &self,
        session_id: Uuid,
        user_id: &str,
        item: &FeedbackItem,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        match item {
            FeedbackItem::UnfamiliarWord { word, context } => {
                sqlx::query(
                    r#"
                    INSERT INTO "unfamiliar_words" ("session_id", "user_id", "word", "context", "timestamp")
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(session_id)
                .bind(user_id)
                .bind(word)
                .bind(context)
                .bind(now)
                .execute(self.db.pool())
                .await?;
            }
            FeedbackItem::GrammarCorrection {
                incorrect,
                corrected,
                explanation,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO "wrong_grammar" ("session_id", "user_id", "wrong_text", "correct_text", "explanation", "timestamp")
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(session_id)
                .bind(user_id)
                .bind(incorrect)
                .bind(corrected)
                .bind(explanation)
                .bind(now)
                .execute(self.db.pool())
                .await?;
            }
            FeedbackItem::WordSuggestion {
                original,
                suggested,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO "best_fit_words" ("session_id", "user_id", "original_word", "suggested_word", "timestamp")
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(session_id)
                .bind(user_id)
                .bind(original)
                .bind(suggested)
                .bind(now)
                .execute(self.db.pool())
                .await?;
            }
            FeedbackItem::ExpressionSuggestion {
                original,
                suggested,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO "better_expressions" ("session_id", "user_id", "original_text", "suggested_text", "timestamp")
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(session_id)
                .bind(user_id)
                .bind(original)
                .bind(suggested)
                .bind(now)
                .execute(self.db.pool())
                .await?;
            }
        }

        Ok(())
    }
}
