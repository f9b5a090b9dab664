use std::sync::Arc;
use std::time::Instant;

use crate::db::Database;
use crate::services::turns::TurnService;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    db: Option<Database>,
    turns: Arc<TurnService>,
}

impl AppState {
    pub fn new(db: Option<Database>, turns: Arc<TurnService>) -> Self {
        Self {
            started_at: Instant::now(),
            db,
            turns,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn db(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    pub fn turns(&self) -> Arc<TurnService> {
        Arc::clone(&self.turns)
    }
}
