//! Store access for sessions, cue sets and interactions

use cue_core::{
    from_record, parse_input_id, parse_output_id, record_id, to_record, Collection, Cue, Filter,
    Interaction, Record, Session, StoreError,
};
use serde_json::Value;

use super::{Orchestrator, Runtime};
use crate::error::{OrchestratorError, Result};

const POSITION: &str = "position";

impl Orchestrator {
    /// Find the session to run, creating it when there is none.
    ///
    /// The open session of the definition wins. Otherwise the session
    /// registered under today's handle is reused, ended or not, so an ended
    /// show stays ended across restarts.
    pub(super) async fn ensure_session(&self) -> Result<Session> {
        let store = &self.inner.store;
        let definition = &self.inner.definition.id;

        if let Some(record) = store
            .find_item(Collection::Sessions, &Session::open_filter(definition))
            .await?
        {
            let session = Session::from_record(record)?;
            tracing::debug!(session_id = %session.id, "Resuming open session");
            return Ok(session);
        }

        let handle = self.inner.definition.handle();
        if let Some(record) = store
            .find_item(
                Collection::Sessions,
                &Session::handle_filter(definition, &handle),
            )
            .await?
        {
            let session = Session::from_record(record)?;
            tracing::debug!(session_id = %session.id, handle = %handle, "Session found by handle");
            return Ok(session);
        }

        let record = store
            .add_item(
                Collection::Sessions,
                Session::new_record(definition, &handle),
            )
            .await?;
        let session = Session::from_record(record)?;
        tracing::info!(session_id = %session.id, handle = %handle, "Session created");
        Ok(session)
    }

    pub(super) fn runtime_session_id(&self, runtime: &Runtime) -> Result<String> {
        runtime
            .session
            .as_ref()
            .map(|session| session.id.clone())
            .ok_or(OrchestratorError::NoSession)
    }

    /// Patch the session record and replace the in-memory session with
    /// what the store returned.
    pub(super) async fn update_session(&self, runtime: &mut Runtime, patch: Record) -> Result<()> {
        let id = self.runtime_session_id(runtime)?;
        let record = self
            .inner
            .store
            .update_item(Collection::Sessions, &id, patch)
            .await?
            .ok_or_else(|| StoreError::not_found(Collection::Sessions.as_str(), &id))?;

        runtime.session = Some(Session::from_record(record)?);
        self.publish(runtime);
        Ok(())
    }

    /// The cue set stored for the session, in definition order.
    pub(super) async fn load_cue_set(&self, session_id: &str) -> Result<Vec<Cue>> {
        let mut records = self
            .inner
            .store
            .get_items(Collection::Cues, &Filter::new().eq("sessionId", session_id))
            .await?;

        records.sort_by_key(|record| record.get(POSITION).and_then(Value::as_u64));

        records
            .into_iter()
            .map(|record| {
                let value = parse_output_id(Value::Object(record));
                Ok(serde_json::from_value(value).map_err(StoreError::from)?)
            })
            .collect()
    }

    /// Replace the stored cue set of the session.
    pub(super) async fn save_cue_set(&self, session_id: &str, cues: &[Cue]) -> Result<()> {
        let store = &self.inner.store;
        let filter = Filter::new().eq("sessionId", session_id);

        let mut records = Vec::with_capacity(cues.len());
        for (position, cue) in cues.iter().enumerate() {
            let Value::Object(mut record) = parse_input_id(Value::Object(to_record(cue)?)) else {
                return Err(StoreError::InvalidRecord(format!("cue '{}'", cue.id)).into());
            };
            record.insert("sessionId".to_string(), Value::from(session_id));
            record.insert(POSITION.to_string(), Value::from(position));
            records.push(record);
        }

        store.delete_items(Collection::Cues, &filter).await?;
        store.add_items(Collection::Cues, records).await?;
        Ok(())
    }

    /// Insert or overwrite an interaction under `filter`.
    pub(super) async fn upsert_interaction(
        &self,
        filter: &Filter,
        record: Record,
    ) -> Result<Interaction> {
        let store = &self.inner.store;

        let saved = match store.find_item(Collection::Interactions, filter).await? {
            Some(existing) => {
                let id = record_id(&existing).ok_or_else(|| {
                    StoreError::InvalidRecord("stored interaction has no id".to_string())
                })?;
                store
                    .update_item(Collection::Interactions, &id, record)
                    .await?
                    .ok_or_else(|| StoreError::not_found(Collection::Interactions.as_str(), &id))?
            }
            None => store.add_item(Collection::Interactions, record).await?,
        };

        Ok(Interaction::from_record(saved)?)
    }

    pub(super) async fn find_interactions(&self, filter: Filter) -> Result<Vec<Interaction>> {
        let records = self
            .inner
            .store
            .get_items(Collection::Interactions, &filter)
            .await?;

        records
            .into_iter()
            .map(|record| Ok(from_record(record)?))
            .collect()
    }
}
