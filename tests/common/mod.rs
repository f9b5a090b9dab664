#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use lingomia_backend::models::{
    FeedbackItem, Message, MessageRole, ProficiencyLevel, SceneContext,
};
use lingomia_backend::services::gateway::{CompletionGateway, GatewayError, TurnRole};
use lingomia_backend::services::turns::{
    HistoryStore, LearningRecordSink, SceneContextProvider, SessionStore, StoreError, TurnService,
};
use lingomia_backend::state::AppState;

pub fn cafe_scene() -> SceneContext {
    SceneContext {
        title: "At the Cafe".into(),
        setting: "A small cafe at lunchtime.".into(),
        vocabulary: vec!["latte".into(), "pastry".into()],
        phrases: vec!["for here or to go".into()],
        questions: vec!["What would you like to order?".into()],
    }
}

pub struct FakeSceneProvider {
    scene: SceneContext,
    missing: AtomicBool,
}

impl FakeSceneProvider {
    pub fn new() -> Self {
        Self {
            scene: cafe_scene(),
            missing: AtomicBool::new(false),
        }
    }

    pub fn mark_missing(&self) {
        self.missing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SceneContextProvider for FakeSceneProvider {
    async fn get(
        &self,
        _scene_id: i64,
        _level: ProficiencyLevel,
    ) -> Result<Option<SceneContext>, StoreError> {
        if self.missing.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(self.scene.clone()))
    }
}

/// Session lookup fake. Sessions exist unless a test marks them missing.
pub struct FakeSessionStore {
    missing: AtomicBool,
}

impl FakeSessionStore {
    pub fn new() -> Self {
        Self {
            missing: AtomicBool::new(false),
        }
    }

    pub fn mark_missing(&self) {
        self.missing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for FakeSessionStore {
    async fn exists(&self, _session_id: Uuid) -> Result<bool, StoreError> {
        Ok(!self.missing.load(Ordering::SeqCst))
    }
}

/// In-memory transcript honoring the store contract: listing sorts by
/// timestamp with insertion-order (id) tie-break.
pub struct MemoryHistoryStore {
    messages: Mutex<Vec<Message>>,
    next_id: AtomicUsize,
    fail_appends: AtomicBool,
    /// When set, every append uses this timestamp, forcing ties.
    fixed_timestamp: Option<DateTime<Utc>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            fail_appends: AtomicBool::new(false),
            fixed_timestamp: None,
        }
    }

    pub fn with_fixed_timestamp() -> Self {
        Self {
            fixed_timestamp: Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()),
            ..Self::new()
        }
    }

    pub fn fail_next_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    /// Reverses the backing storage so `list` has to prove it re-orders.
    pub fn scramble(&self) {
        self.messages.lock().unwrap().reverse();
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(
        &self,
        session_id: Uuid,
        role: MessageRole,
        text: &str,
    ) -> Result<Message, StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError("history store unavailable".into()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let message = Message {
            id,
            session_id,
            role,
            text: text.to_string(),
            timestamp: self.fixed_timestamp.unwrap_or_else(Utc::now),
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn list(&self, session_id: Uuid) -> Result<Vec<Message>, StoreError> {
        let mut messages: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.timestamp, m.id));
        Ok(messages)
    }
}

pub struct CountingSink {
    pub appended: Mutex<Vec<FeedbackItem>>,
    fail: AtomicBool,
}

impl CountingSink {
    pub fn new() -> Self {
        Self {
            appended: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.appended.lock().unwrap().len()
    }
}

#[async_trait]
impl LearningRecordSink for CountingSink {
    async fn append(
        &self,
        _session_id: Uuid,
        _user_id: &str,
        item: &FeedbackItem,
    ) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError("learning sink unavailable".into()));
        }
        self.appended.lock().unwrap().push(item.clone());
        Ok(())
    }
}

/// Gateway fake returning a scripted result and counting invocations.
pub struct ScriptedGateway {
    pub calls: AtomicUsize,
    pub last_system_prompt: Mutex<Option<String>>,
    response: Result<String, fn() -> GatewayError>,
}

impl ScriptedGateway {
    pub fn returning(raw: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_system_prompt: Mutex::new(None),
            response: Ok(raw.to_string()),
        }
    }

    pub fn failing(make_error: fn() -> GatewayError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_system_prompt: Mutex::new(None),
            response: Err(make_error),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        _user_message: &str,
        _temperature: f32,
        _role: TurnRole,
    ) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_system_prompt.lock().unwrap() = Some(system_prompt.to_string());
        match &self.response {
            Ok(raw) => Ok(raw.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}

pub struct Harness {
    pub sessions: Arc<FakeSessionStore>,
    pub scenes: Arc<FakeSceneProvider>,
    pub history: Arc<MemoryHistoryStore>,
    pub sink: Arc<CountingSink>,
    pub gateway: Arc<ScriptedGateway>,
    pub service: TurnService,
}

pub fn harness(gateway: ScriptedGateway) -> Harness {
    harness_with_history(gateway, MemoryHistoryStore::new())
}

pub fn harness_with_history(gateway: ScriptedGateway, history: MemoryHistoryStore) -> Harness {
    let sessions = Arc::new(FakeSessionStore::new());
    let scenes = Arc::new(FakeSceneProvider::new());
    let history = Arc::new(history);
    let sink = Arc::new(CountingSink::new());
    let gateway = Arc::new(gateway);
    let service = TurnService::new(
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        Arc::clone(&scenes) as Arc<dyn SceneContextProvider>,
        Arc::clone(&history) as Arc<dyn HistoryStore>,
        Arc::clone(&sink) as Arc<dyn LearningRecordSink>,
        Arc::clone(&gateway) as Arc<dyn CompletionGateway>,
    );

    Harness {
        sessions,
        scenes,
        history,
        sink,
        gateway,
        service,
    }
}

pub fn app_from_harness(h: Harness) -> axum::Router {
    let state = AppState::new(None, Arc::new(h.service));
    lingomia_backend::create_app(state)
}

pub fn app_with_gateway(gateway: ScriptedGateway) -> axum::Router {
    app_from_harness(harness(gateway))
}
