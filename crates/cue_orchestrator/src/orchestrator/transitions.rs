//! Transition hooks
//!
//! Every operation follows the same shape: resolve the transition against
//! the table, run its before hook, commit, then run the after step. A
//! failing before hook vetoes the transition and leaves the state as it
//! was. All functions here expect the transition lock to be held.

use cue_core::{merge_cues, next_cue, AfterDuration, Collection, Cue, Interaction, Session};
use cue_state::{State, StateTransition, TransitionKind};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::outputs::Lifecycle;
use super::{ActiveCue, Orchestrator, Runtime};
use crate::config::InteractionScope;
use crate::error::{OrchestratorError, Result};
use crate::events::OrchestratorEvent;
use crate::timer::CueTimer;

impl Orchestrator {
    fn resolve(&self, runtime: &Runtime, kind: TransitionKind) -> Option<StateTransition> {
        match runtime.fsm.lookup(kind) {
            Ok(transition) => Some(transition),
            Err(error) => {
                tracing::warn!(error = %error, "Ignoring invalid transition");
                None
            }
        }
    }

    fn veto(&self, transition: StateTransition, error: OrchestratorError) -> Result<bool> {
        if error.is_fatal() {
            return Err(error);
        }

        tracing::warn!(
            transition = %transition.kind,
            from = %transition.from,
            error = %error,
            "Transition vetoed"
        );
        Ok(false)
    }

    async fn commit(&self, runtime: &mut Runtime, transition: StateTransition) -> bool {
        if !runtime.fsm.commit(transition) {
            return false;
        }

        tracing::info!(
            transition = %transition.kind,
            from = %transition.from,
            to = %transition.to,
            "State changed"
        );
        self.publish(runtime);
        self.emit(OrchestratorEvent::from(transition));

        if transition.kind.is_broadcast() {
            self.broadcast_command("state", &[json!(transition)]).await;
        }

        true
    }

    // ========== Timer ==========

    fn cancel_timer(&self, runtime: &mut Runtime) {
        if let Some(timer) = runtime.timer.take() {
            timer.cancel();
        }
    }

    fn arm_timer(&self, runtime: &mut Runtime, cue: &Cue) {
        let Some(duration) = cue.timer_duration() else {
            return;
        };

        runtime.timer_generation += 1;
        let generation = runtime.timer_generation;
        let weak = Arc::downgrade(&self.inner);

        runtime.timer = Some(CueTimer::start(&cue.id, generation, duration, move || async move {
            if let Some(inner) = weak.upgrade() {
                Orchestrator { inner }.on_cue_elapsed(generation).await;
            }
        }));
    }

    async fn on_cue_elapsed(&self, generation: u64) {
        let mut runtime = self.inner.runtime.lock().await;

        match &runtime.timer {
            Some(timer) if timer.is_current(generation) => {
                tracing::debug!(cue = timer.cue_id(), generation, "Cue duration elapsed");
            }
            _ => {
                tracing::debug!(generation, "Ignoring stale cue timer");
                return;
            }
        }
        self.cancel_timer(&mut runtime);

        let Some(active) = runtime.current_cue.clone() else {
            return;
        };

        let next = match active.cue.after_duration {
            AfterDuration::Next => {
                next_cue(&runtime.cues, &active.cue.id).map(|cue| cue.id.clone())
            }
            AfterDuration::Uncue => None,
        };

        let result = match next {
            Some(id) => self.cue_locked(&mut runtime, &id, None).await,
            None => self.uncue_locked(&mut runtime).await,
        };
        if let Err(error) = result {
            tracing::warn!(cue = %active.cue.id, error = %error, "Cue duration policy failed");
        }
    }

    // ========== init / destroy ==========

    pub(super) async fn init_locked(&self, runtime: &mut Runtime) -> Result<bool> {
        // A second init waits on the lock behind the first and finds it done.
        if runtime.fsm.is_settled_at(TransitionKind::Init) {
            return Ok(true);
        }

        let Some(transition) = self.resolve(runtime, TransitionKind::Init) else {
            return Ok(false);
        };

        if let Err(error) = self.before_init(runtime).await {
            return self.veto(transition, error);
        }

        self.commit(runtime, transition).await;
        self.emit(OrchestratorEvent::Initialized);
        Ok(true)
    }

    async fn before_init(&self, runtime: &mut Runtime) -> Result<()> {
        self.inner
            .store
            .init()
            .await
            .map_err(OrchestratorError::StoreInit)?;

        self.lifecycle(Lifecycle::Init).await;
        self.ensure_command_loop();

        runtime.cues = self.inner.definition.cues.clone();
        self.publish(runtime);
        Ok(())
    }

    pub(super) async fn destroy_locked(&self, runtime: &mut Runtime) -> Result<bool> {
        let Some(transition) = self.resolve(runtime, TransitionKind::Destroy) else {
            return Ok(false);
        };

        self.cancel_timer(runtime);
        self.lifecycle(Lifecycle::Destroy).await;

        if let Err(error) = self.inner.store.destroy().await {
            tracing::warn!(error = %error, "Store teardown failed");
        }

        runtime.session = None;
        runtime.current_cue = None;
        runtime.cues = self.inner.definition.cues.clone();
        self.publish(runtime);

        self.commit(runtime, transition).await;
        self.emit(OrchestratorEvent::Destroyed);
        Ok(true)
    }

    // ========== start / stop ==========

    pub(super) async fn start_locked(&self, runtime: &mut Runtime) -> Result<bool> {
        if runtime.fsm.is(State::None) && !self.init_locked(runtime).await? {
            return Ok(false);
        }

        let Some(transition) = self.resolve(runtime, TransitionKind::Start) else {
            return Ok(false);
        };

        if let Err(error) = self.before_start(runtime).await {
            return self.veto(transition, error);
        }

        self.commit(runtime, transition).await;
        self.after_start(runtime).await?;
        Ok(true)
    }

    async fn before_start(&self, runtime: &mut Runtime) -> Result<()> {
        let session = self.ensure_session().await?;

        let stored = self.load_cue_set(&session.id).await?;
        if !stored.is_empty() {
            tracing::debug!(
                session_id = %session.id,
                count = stored.len(),
                "Loaded stored cue set"
            );
            runtime.cues = stored;
        }

        runtime.session = Some(session);
        runtime.current_cue = None;
        self.publish(runtime);

        self.lifecycle(Lifecycle::Start).await;
        Ok(())
    }

    async fn after_start(&self, runtime: &mut Runtime) -> Result<()> {
        let Some(session) = runtime.session.clone() else {
            return Ok(());
        };

        if !session.started {
            if let Err(error) = self.update_session(runtime, Session::started_patch()).await {
                tracing::warn!(
                    session_id = %session.id,
                    error = %error,
                    "Failed to mark session started"
                );
            }
        }

        self.emit(OrchestratorEvent::Started {
            session: runtime.session.clone().unwrap_or(session),
        });

        let Some(session) = runtime.session.clone() else {
            return Ok(());
        };

        if session.ended {
            tracing::info!(session_id = %session.id, "Recovering ended session");
            self.end_locked(runtime).await?;
        } else if let Some(cue_id) = session.cue {
            tracing::info!(session_id = %session.id, cue = %cue_id, "Recovering cue");
            if !self.cue_locked(runtime, &cue_id, session.data).await? {
                tracing::warn!(cue = %cue_id, "Stored cue could not be restored");
            }
        }

        Ok(())
    }

    pub(super) async fn stop_locked(&self, runtime: &mut Runtime) -> Result<bool> {
        let Some(transition) = self.resolve(runtime, TransitionKind::Stop) else {
            return Ok(false);
        };

        self.cancel_timer(runtime);
        self.broadcast_command("stop", &[]).await;
        self.lifecycle(Lifecycle::Stop).await;

        runtime.current_cue = None;
        self.publish(runtime);

        self.commit(runtime, transition).await;
        self.emit(OrchestratorEvent::Stopped);
        Ok(true)
    }

    // ========== cue / uncue / end ==========

    pub(super) async fn cue_locked(
        &self,
        runtime: &mut Runtime,
        id: &str,
        data: Option<Value>,
    ) -> Result<bool> {
        let Some(transition) = self.resolve(runtime, TransitionKind::Cue) else {
            return Ok(false);
        };

        let Some(cue) = runtime.cues.iter().find(|cue| cue.id == id).cloned() else {
            tracing::warn!(cue = id, "Unknown cue");
            return Ok(false);
        };

        if let Err(error) = self.before_cue(runtime, &cue, data.as_ref()).await {
            return self.veto(transition, error);
        }

        self.commit(runtime, transition).await;
        self.emit(OrchestratorEvent::Cued {
            cue: cue.clone(),
            data,
        });
        self.arm_timer(runtime, &cue);
        Ok(true)
    }

    async fn before_cue(
        &self,
        runtime: &mut Runtime,
        cue: &Cue,
        data: Option<&Value>,
    ) -> Result<()> {
        if cue.stateful {
            self.update_session(runtime, Session::cue_patch(Some(&cue.id), data))
                .await?;
        }

        // The previous cue keeps its timer until the new one is persisted.
        self.cancel_timer(runtime);
        runtime.current_cue = Some(ActiveCue {
            cue: cue.clone(),
            data: data.cloned(),
        });
        self.publish(runtime);

        self.broadcast_cue(cue, data).await;
        Ok(())
    }

    pub(super) async fn uncue_locked(&self, runtime: &mut Runtime) -> Result<bool> {
        let Some(transition) = self.resolve(runtime, TransitionKind::Uncue) else {
            return Ok(false);
        };

        if let Err(error) = self.before_uncue(runtime).await {
            return self.veto(transition, error);
        }

        self.commit(runtime, transition).await;
        self.emit(OrchestratorEvent::Uncued);
        Ok(true)
    }

    async fn before_uncue(&self, runtime: &mut Runtime) -> Result<()> {
        self.update_session(runtime, Session::cue_patch(None, None))
            .await?;

        self.cancel_timer(runtime);
        runtime.current_cue = None;
        self.publish(runtime);

        self.broadcast_command("uncue", &[]).await;
        Ok(())
    }

    pub(super) async fn end_locked(&self, runtime: &mut Runtime) -> Result<bool> {
        let Some(transition) = self.resolve(runtime, TransitionKind::End) else {
            return Ok(false);
        };

        if let Err(error) = self.before_end(runtime).await {
            return self.veto(transition, error);
        }

        self.commit(runtime, transition).await;
        self.emit(OrchestratorEvent::Ended);
        Ok(true)
    }

    async fn before_end(&self, runtime: &mut Runtime) -> Result<()> {
        self.update_session(runtime, Session::ended_patch()).await?;

        self.cancel_timer(runtime);
        runtime.session = None;
        runtime.current_cue = None;
        self.publish(runtime);

        self.broadcast_command("end", &[]).await;
        Ok(())
    }

    // ========== interactions ==========

    pub(super) async fn interact_locked(
        &self,
        runtime: &mut Runtime,
        data: Value,
        id: Option<String>,
        user_id: Option<String>,
    ) -> Result<Interaction> {
        let session_id = self.runtime_session_id(runtime)?;
        let external_id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let cue_id = runtime.current_cue.as_ref().map(|active| active.cue.id.clone());

        self.broadcast_interact(&data, &external_id).await;

        let filter = match (self.config().interaction_scope, user_id.as_deref()) {
            (InteractionScope::CueUser, Some(user)) => {
                Interaction::cue_user_filter(&session_id, cue_id.as_deref(), user)
            }
            _ => Interaction::external_filter(&session_id, &external_id),
        };
        let record = Interaction::new_record(
            &session_id,
            &external_id,
            cue_id.as_deref(),
            user_id.as_deref(),
            data,
        );

        let interaction = self.upsert_interaction(&filter, record).await?;
        tracing::debug!(
            session_id = %session_id,
            interaction = %interaction.external_id,
            "Interaction recorded"
        );

        self.broadcast_interaction(&interaction).await;
        self.emit(OrchestratorEvent::Interaction {
            interaction: interaction.clone(),
        });
        Ok(interaction)
    }

    pub(super) async fn uninteract_locked(&self, runtime: &Runtime, id: &str) -> Result<bool> {
        let session_id = self.runtime_session_id(runtime)?;
        let store = &self.inner.store;

        let filter = Interaction::external_filter(&session_id, id);
        let deleted = store
            .delete_items(Collection::Interactions, &filter)
            .await?;
        if deleted == 0 {
            tracing::debug!(interaction = id, "Unknown interaction");
            return Ok(false);
        }

        self.broadcast_uninteraction(id).await;
        self.emit(OrchestratorEvent::Uninteraction { id: id.to_string() });
        Ok(true)
    }

    pub(super) async fn reset_locked(&self, runtime: &mut Runtime) -> Result<bool> {
        let session_id = self.runtime_session_id(runtime)?;
        let filter = Interaction::session_filter(&session_id);

        let ids: Vec<String> = self
            .find_interactions(filter.clone())
            .await?
            .into_iter()
            .map(|interaction| interaction.external_id)
            .collect();

        self.inner
            .store
            .delete_items(Collection::Interactions, &filter)
            .await?;
        if !ids.is_empty() {
            self.broadcast_uninteractions(&ids).await;
        }

        self.update_session(runtime, Session::reset_patch()).await?;

        if matches!(runtime.fsm.state(), State::Idle | State::Cued) {
            self.uncue_locked(runtime).await?;
        } else {
            self.cancel_timer(runtime);
            runtime.current_cue = None;
            self.publish(runtime);
        }

        self.broadcast_command("reset", &[]).await;

        if let Some(session) = runtime.session.clone() {
            tracing::info!(session_id = %session.id, cleared = ids.len(), "Session reset");
            self.emit(OrchestratorEvent::Reset { session });
        }
        Ok(true)
    }

    // ========== cue set ==========

    pub(super) async fn define_locked(
        &self,
        runtime: &mut Runtime,
        cues: Vec<Cue>,
    ) -> Result<Vec<Cue>> {
        let session_id = self.runtime_session_id(runtime)?;

        let merged = merge_cues(cues, &runtime.cues);
        self.save_cue_set(&session_id, &merged).await?;

        runtime.cues = merged.clone();
        self.publish(runtime);
        tracing::info!(session_id = %session_id, count = merged.len(), "Cue set defined");

        self.broadcast_cues(&merged).await;
        self.emit(OrchestratorEvent::CuesDefined {
            cues: merged.clone(),
        });
        Ok(merged)
    }
}
