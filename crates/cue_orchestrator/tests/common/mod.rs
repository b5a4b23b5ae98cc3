#![allow(dead_code)]

use async_trait::async_trait;
use cue_core::{
    AfterDuration, Collection, Cue, Definition, Filter, Interaction, MemoryStore, Record, Store,
    StoreError,
};
use cue_orchestrator::{Orchestrator, OrchestratorConfig, Output, Plugin, PluginError, PluginResult};
use mockall::mock;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Q1 (stateful) → Q2 → Q3, the shape most tests run against.
pub fn definition() -> Definition {
    Definition::new(
        "show",
        vec![
            Cue::new("Q1").stateful().with_label("Opening"),
            Cue::new("Q2").interactive(),
            Cue::new("Q3"),
        ],
    )
    .with_handle(|id| format!("{}_test", id))
}

/// Q1 advances to Q2 after one second.
pub fn timed_definition(after: AfterDuration) -> Definition {
    Definition::new(
        "timed",
        vec![
            Cue::new("Q1").with_duration(1.0, after),
            Cue::new("Q2"),
        ],
    )
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

pub fn orchestrator_with(
    definition: Definition,
    store: Arc<MemoryStore>,
    config: OrchestratorConfig,
) -> Orchestrator {
    Orchestrator::new(definition, store, config)
}

pub async fn open_sessions(store: &MemoryStore, definition: &str) -> usize {
    store
        .snapshot(Collection::Sessions)
        .await
        .into_iter()
        .filter(|session| {
            session["definition"] == json!(definition) && session["ended"] == json!(false)
        })
        .count()
}

/// Memory store whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> cue_core::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("write rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn find_item(&self, collection: Collection, filter: &Filter) -> cue_core::Result<Option<Record>> {
        self.inner.find_item(collection, filter).await
    }

    async fn add_item(&self, collection: Collection, record: Record) -> cue_core::Result<Record> {
        self.check()?;
        self.inner.add_item(collection, record).await
    }

    async fn update_item(
        &self,
        collection: Collection,
        id: &str,
        patch: Record,
    ) -> cue_core::Result<Option<Record>> {
        self.check()?;
        self.inner.update_item(collection, id, patch).await
    }

    async fn delete_item(&self, collection: Collection, id: &str) -> cue_core::Result<bool> {
        self.check()?;
        self.inner.delete_item(collection, id).await
    }

    async fn delete_items(&self, collection: Collection, filter: &Filter) -> cue_core::Result<usize> {
        self.check()?;
        self.inner.delete_items(collection, filter).await
    }

    async fn get_items(&self, collection: Collection, filter: &Filter) -> cue_core::Result<Vec<Record>> {
        self.inner.get_items(collection, filter).await
    }
}

/// Output that remembers every call it receives.
#[derive(Default)]
pub struct RecordingOutput {
    calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingOutput {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, kind: &str, payload: Value) {
        self.calls
            .lock()
            .unwrap()
            .push((kind.to_string(), payload));
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.calls().into_iter().map(|(kind, _)| kind).collect()
    }

    /// Payloads of every `command(name, ...)` broadcast with that name.
    pub fn commands(&self, name: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(kind, payload)| kind == "command" && payload["name"] == json!(name))
            .map(|(_, payload)| payload["args"].clone())
            .collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.calls().iter().filter(|(k, _)| k == kind).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Plugin for RecordingOutput {
    fn name(&self) -> &str {
        "recording"
    }

    async fn init(&self) -> PluginResult<()> {
        self.record("init", Value::Null);
        Ok(())
    }

    async fn start(&self) -> PluginResult<()> {
        self.record("start", Value::Null);
        Ok(())
    }

    async fn stop(&self) -> PluginResult<()> {
        self.record("stop", Value::Null);
        Ok(())
    }

    async fn destroy(&self) -> PluginResult<()> {
        self.record("destroy", Value::Null);
        Ok(())
    }
}

#[async_trait]
impl Output for RecordingOutput {
    async fn cue(&self, cue: &Cue, data: Option<&Value>) -> PluginResult<()> {
        self.record("cue", json!({ "id": cue.id, "data": data }));
        Ok(())
    }

    async fn cues(&self, cues: &[Cue]) -> PluginResult<()> {
        let ids: Vec<&str> = cues.iter().map(|cue| cue.id.as_str()).collect();
        self.record("cues", json!(ids));
        Ok(())
    }

    async fn interact(&self, data: &Value, id: &str) -> PluginResult<()> {
        self.record("interact", json!({ "id": id, "data": data }));
        Ok(())
    }

    async fn interaction(&self, interaction: &Interaction) -> PluginResult<()> {
        self.record("interaction", serde_json::to_value(interaction).unwrap());
        Ok(())
    }

    async fn uninteraction(&self, id: &str) -> PluginResult<()> {
        self.record("uninteraction", json!(id));
        Ok(())
    }

    async fn uninteractions(&self, ids: &[String]) -> PluginResult<()> {
        self.record("uninteractions", json!(ids));
        Ok(())
    }

    async fn command(&self, name: &str, args: &[Value]) -> PluginResult<()> {
        self.record("command", json!({ "name": name, "args": args }));
        Ok(())
    }
}

/// Output whose every handler fails.
pub struct FailingOutput;

#[async_trait]
impl Plugin for FailingOutput {
    fn name(&self) -> &str {
        "failing"
    }

    async fn start(&self) -> PluginResult<()> {
        Err(PluginError::failed("cannot start"))
    }
}

#[async_trait]
impl Output for FailingOutput {
    async fn cue(&self, _cue: &Cue, _data: Option<&Value>) -> PluginResult<()> {
        Err(PluginError::failed("cannot cue"))
    }

    async fn command(&self, _name: &str, _args: &[Value]) -> PluginResult<()> {
        Err(PluginError::failed("cannot broadcast"))
    }
}

mock! {
    pub Store {}

    #[async_trait]
    impl Store for Store {
        async fn init(&self) -> cue_core::Result<()>;
        async fn destroy(&self) -> cue_core::Result<()>;
        async fn find_item(&self, collection: Collection, filter: &Filter) -> cue_core::Result<Option<Record>>;
        async fn add_item(&self, collection: Collection, record: Record) -> cue_core::Result<Record>;
        async fn add_items(&self, collection: Collection, records: Vec<Record>) -> cue_core::Result<Vec<Record>>;
        async fn update_item(&self, collection: Collection, id: &str, patch: Record) -> cue_core::Result<Option<Record>>;
        async fn delete_item(&self, collection: Collection, id: &str) -> cue_core::Result<bool>;
        async fn delete_items(&self, collection: Collection, filter: &Filter) -> cue_core::Result<usize>;
        async fn get_items(&self, collection: Collection, filter: &Filter) -> cue_core::Result<Vec<Record>>;
    }
}
