use async_trait::async_trait;
use sqlx::Row;

use crate::db::Database;
use crate::models::{ProficiencyLevel, SceneContext};
use crate::services::turns::{SceneContextProvider, StoreError};

/// Scene catalog reads. Level-specific content is optional: a scene with
/// no row for the requested level yields empty lists.
#[derive(Clone)]
pub struct SqlSceneProvider {
    db: Database,
}

impl SqlSceneProvider {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Splits the comma-separated content columns into trimmed, non-empty terms.
fn split_terms(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[async_trait]
impl SceneContextProvider for SqlSceneProvider {
    async fn get(
        &self,
        scene_id: i64,
        level: ProficiencyLevel,
    ) -> Result<Option<SceneContext>, StoreError> {
        let Some(scene_row) = sqlx::query(
            r#"
            SELECT "name", "context"
            FROM "scenes"
            WHERE "id" = $1
            "#,
        )
        .bind(scene_id)
        .fetch_optional(self.db.pool())
        .await?
        else {
            return Ok(None);
        };

        let level_row = sqlx::query(
            r#"
            SELECT "vocabulary", "key_phrases", "questions"
            FROM "scene_levels"
            WHERE "scene_id" = $1 AND "english_level" = $2
            "#,
        )
        .bind(scene_id)
        .bind(level.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        let (vocabulary, phrases, questions) = match level_row {
            Some(row) => (
                split_terms(row.try_get("vocabulary")?),
                split_terms(row.try_get("key_phrases")?),
                split_terms(row.try_get("questions")?),
            ),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        Ok(Some(SceneContext {
            title: scene_row.try_get("name")?,
            setting: scene_row
                .try_get::<Option<String>, _>("context")?
                .unwrap_or_default(),
            vocabulary,
            phrases,
            questions,
        }))
    }
}
