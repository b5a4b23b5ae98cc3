//! The orchestrator
//!
//! A cloneable handle over shared state. Every transition and every
//! session mutation runs under one async lock, so a session is never
//! written by two operations at once. Readers use the published
//! [`Snapshot`] instead of the lock, which keeps accessors usable from
//! output handlers while a transition is in flight.

mod outputs;
mod session;
mod transitions;

use cue_core::{Cue, Definition, Interaction, MemoryStore, Session, Store};
use cue_state::{State, StateMachine};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{broadcast, mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::command::{
    builtin, pipeline, CommandFuture, CommandRegistry, PipelineOutcome, RegistryError,
};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::events::OrchestratorEvent;
use crate::plugin::{Command, CommandSender, Input, Output};
use crate::timer::CueTimer;

/// The cue currently on stage and the payload it was cued with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveCue {
    pub cue: Cue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Read-only view of the orchestrator, replaced wholesale after every
/// change.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub state: State,
    pub session: Option<Session>,
    pub current_cue: Option<ActiveCue>,
    pub cues: Vec<Cue>,
}

/// State guarded by the transition lock.
pub(crate) struct Runtime {
    fsm: StateMachine,
    session: Option<Session>,
    current_cue: Option<ActiveCue>,
    cues: Vec<Cue>,
    timer: Option<CueTimer>,
    timer_generation: u64,
}

impl Runtime {
    fn new(cues: Vec<Cue>) -> Self {
        Self {
            fsm: StateMachine::new(),
            session: None,
            current_cue: None,
            cues,
            timer: None,
            timer_generation: 0,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.fsm.state(),
            session: self.session.clone(),
            current_cue: self.current_cue.clone(),
            cues: self.cues.clone(),
        }
    }
}

struct Inner {
    definition: Definition,
    store: Arc<dyn Store>,
    config: OrchestratorConfig,
    registry: CommandRegistry,
    runtime: Mutex<Runtime>,
    snapshot: watch::Sender<Snapshot>,
    inputs: RwLock<Vec<Arc<dyn Input>>>,
    outputs: RwLock<Vec<Arc<dyn Output>>>,
    events: broadcast::Sender<OrchestratorEvent>,
    commands: mpsc::UnboundedSender<Command>,
    pending_commands: StdMutex<Option<mpsc::UnboundedReceiver<Command>>>,
    command_loop: StdMutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let handle = self
            .command_loop
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("definition", &self.inner.definition.id)
            .field("state", &self.state())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(definition: Definition, store: Arc<dyn Store>, config: OrchestratorConfig) -> Self {
        let registry = CommandRegistry::new();
        if let Err(error) = builtin::register(&registry) {
            tracing::error!(error = %error, "Failed to register built-in commands");
        }

        let runtime = Runtime::new(definition.cues.clone());
        let (snapshot, _) = watch::channel(runtime.snapshot());
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (commands, pending) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(Inner {
                definition,
                store,
                config,
                registry,
                runtime: Mutex::new(runtime),
                snapshot,
                inputs: RwLock::new(Vec::new()),
                outputs: RwLock::new(Vec::new()),
                events,
                commands,
                pending_commands: StdMutex::new(Some(pending)),
                command_loop: StdMutex::new(None),
            }),
        }
    }

    /// An orchestrator backed by a fresh [`MemoryStore`] and default config.
    pub fn in_memory(definition: Definition) -> Self {
        Self::new(
            definition,
            Arc::new(MemoryStore::new()),
            OrchestratorConfig::default(),
        )
    }

    pub fn definition(&self) -> &Definition {
        &self.inner.definition
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    pub(crate) fn registry(&self) -> &CommandRegistry {
        &self.inner.registry
    }

    // ========== Adapters ==========

    /// Attach an input and hand it a sender for the command channel.
    pub async fn add_input(&self, input: Arc<dyn Input>) {
        input.bind(self.command_sender());
        tracing::debug!(input = input.name(), "Input attached");
        self.inner.inputs.write().await.push(input);
    }

    pub async fn remove_input(&self, input: &Arc<dyn Input>) -> bool {
        let mut inputs = self.inner.inputs.write().await;
        let before = inputs.len();
        inputs.retain(|candidate| !Arc::ptr_eq(candidate, input));
        before != inputs.len()
    }

    pub async fn add_output(&self, output: Arc<dyn Output>) {
        tracing::debug!(output = output.name(), "Output attached");
        self.inner.outputs.write().await.push(output);
    }

    pub async fn remove_output(&self, output: &Arc<dyn Output>) -> bool {
        let mut outputs = self.inner.outputs.write().await;
        let before = outputs.len();
        outputs.retain(|candidate| !Arc::ptr_eq(candidate, output));
        before != outputs.len()
    }

    pub(crate) async fn inputs(&self) -> Vec<Arc<dyn Input>> {
        self.inner.inputs.read().await.clone()
    }

    pub(crate) async fn outputs(&self) -> Vec<Arc<dyn Output>> {
        self.inner.outputs.read().await.clone()
    }

    // ========== Commands ==========

    /// A sender feeding the orchestrator's command loop. Commands are
    /// processed once the orchestrator has been initialized.
    pub fn command_sender(&self) -> CommandSender {
        CommandSender::new(self.inner.commands.clone())
    }

    /// Register an extra command handler next to the built-in ones.
    pub fn register_command<F>(
        &self,
        name: &str,
        handler: F,
    ) -> std::result::Result<(), RegistryError>
    where
        F: Fn(Orchestrator, Vec<Value>) -> CommandFuture + Send + Sync + 'static,
    {
        self.inner.registry.register(name, handler)
    }

    /// Run one raw command through the pipeline and wait for it.
    pub async fn handle_command(&self, name: &str, args: Vec<Value>) -> Vec<PipelineOutcome> {
        pipeline::run(self, Command::new(name, args)).await
    }

    fn ensure_command_loop(&self) {
        let mut slot = self
            .inner
            .command_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let receiver = self
            .inner
            .pending_commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut receiver) = receiver else {
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        *slot = Some(tokio::spawn(async move {
            while let Some(command) = receiver.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let orchestrator = Orchestrator { inner };
                pipeline::run(&orchestrator, command).await;
            }
            tracing::debug!("Command loop finished");
        }));
    }

    // ========== Observation ==========

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.inner.events.subscribe()
    }

    /// Receiver notified with every new [`Snapshot`].
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn state(&self) -> State {
        self.inner.snapshot.borrow().state
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.snapshot.borrow().session.clone()
    }

    pub fn current_cue(&self) -> Option<ActiveCue> {
        self.inner.snapshot.borrow().current_cue.clone()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.inner.snapshot.borrow().cues.clone()
    }

    pub fn get_cue(&self, id: &str) -> Option<Cue> {
        self.inner
            .snapshot
            .borrow()
            .cues
            .iter()
            .find(|cue| cue.id == id)
            .cloned()
    }

    fn publish(&self, runtime: &Runtime) {
        self.inner.snapshot.send_replace(runtime.snapshot());
    }

    fn emit(&self, event: OrchestratorEvent) {
        // No subscriber is not an error.
        let _ = self.inner.events.send(event);
    }

    // ========== Operations ==========

    /// Bring up the store and every attached adapter.
    pub async fn init(&self) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.init_locked(&mut runtime).await
    }

    /// Tear everything down. Valid from any state.
    pub async fn destroy(&self) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.destroy_locked(&mut runtime).await
    }

    /// Initialize if needed, open the session and resume its stored state.
    pub async fn start(&self) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.start_locked(&mut runtime).await
    }

    pub async fn stop(&self) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.stop_locked(&mut runtime).await
    }

    /// Cue `id` from the current cue list. `Ok(false)` for an unknown id.
    pub async fn cue(&self, id: &str, data: Option<Value>) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.cue_locked(&mut runtime, id, data).await
    }

    pub async fn uncue(&self) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.uncue_locked(&mut runtime).await
    }

    pub async fn end(&self) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.end_locked(&mut runtime).await
    }

    pub async fn restart(&self) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.destroy_locked(&mut runtime).await?;
        self.start_locked(&mut runtime).await
    }

    /// Record an interaction, generating its id when `id` is `None`.
    pub async fn interact(&self, data: Value, id: Option<String>) -> Result<Interaction> {
        self.interact_as(data, id, None).await
    }

    /// Record an interaction on behalf of a user.
    pub async fn interact_as(
        &self,
        data: Value,
        id: Option<String>,
        user_id: Option<String>,
    ) -> Result<Interaction> {
        let mut runtime = self.inner.runtime.lock().await;
        self.interact_locked(&mut runtime, data, id, user_id).await
    }

    /// Delete an interaction by its external id. `Ok(false)` when unknown.
    pub async fn uninteract(&self, id: &str) -> Result<bool> {
        let runtime = self.inner.runtime.lock().await;
        self.uninteract_locked(&runtime, id).await
    }

    /// Drop every interaction of the session and clear its cue.
    pub async fn reset(&self) -> Result<bool> {
        let mut runtime = self.inner.runtime.lock().await;
        self.reset_locked(&mut runtime).await
    }

    /// Merge `cues` in front of the current list and persist the result as
    /// the session's cue set. Returns the merged list.
    pub async fn define(&self, cues: Vec<Cue>) -> Result<Vec<Cue>> {
        let mut runtime = self.inner.runtime.lock().await;
        self.define_locked(&mut runtime, cues).await
    }

    // ========== Queries ==========

    fn session_id(&self) -> Result<String> {
        self.inner
            .snapshot
            .borrow()
            .session
            .as_ref()
            .map(|session| session.id.clone())
            .ok_or(OrchestratorError::NoSession)
    }

    pub async fn get_interactions(&self) -> Result<Vec<Interaction>> {
        let filter = Interaction::session_filter(&self.session_id()?);
        self.find_interactions(filter).await
    }

    pub async fn get_interactions_by_cue(&self, cue_id: &str) -> Result<Vec<Interaction>> {
        let filter = Interaction::session_filter(&self.session_id()?).eq("cueId", cue_id);
        self.find_interactions(filter).await
    }

    pub async fn get_interactions_by_user(&self, user_id: &str) -> Result<Vec<Interaction>> {
        let filter = Interaction::session_filter(&self.session_id()?).eq("userId", user_id);
        self.find_interactions(filter).await
    }
}
