use async_trait::async_trait;
use cue_core::{Cue, Interaction};
use serde_json::Value;

use crate::error::PluginResult;
use crate::plugin::{Output, Plugin};

/// Output that writes every broadcast to the `tracing` log.
#[derive(Debug, Clone)]
pub struct LogOutput {
    name: String,
}

impl Default for LogOutput {
    fn default() -> Self {
        Self::new("log")
    }
}

impl LogOutput {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Plugin for LogOutput {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PluginResult<()> {
        tracing::info!(output = %self.name, "Output started");
        Ok(())
    }

    async fn stop(&self) -> PluginResult<()> {
        tracing::info!(output = %self.name, "Output stopped");
        Ok(())
    }
}

#[async_trait]
impl Output for LogOutput {
    async fn cue(&self, cue: &Cue, data: Option<&Value>) -> PluginResult<()> {
        tracing::info!(
            output = %self.name,
            cue = %cue.id,
            label = cue.label.as_deref().unwrap_or(""),
            data = ?data,
            "cue"
        );
        Ok(())
    }

    async fn cues(&self, cues: &[Cue]) -> PluginResult<()> {
        let ids: Vec<&str> = cues.iter().map(|cue| cue.id.as_str()).collect();
        tracing::info!(output = %self.name, cues = ?ids, "cues");
        Ok(())
    }

    async fn interact(&self, data: &Value, id: &str) -> PluginResult<()> {
        tracing::debug!(output = %self.name, id, data = %data, "interact");
        Ok(())
    }

    async fn interaction(&self, interaction: &Interaction) -> PluginResult<()> {
        tracing::info!(
            output = %self.name,
            id = %interaction.external_id,
            cue = ?interaction.cue_id,
            user = ?interaction.user_id,
            data = %interaction.data,
            "interaction"
        );
        Ok(())
    }

    async fn uninteraction(&self, id: &str) -> PluginResult<()> {
        tracing::info!(output = %self.name, id, "uninteraction");
        Ok(())
    }

    async fn uninteractions(&self, ids: &[String]) -> PluginResult<()> {
        tracing::info!(output = %self.name, count = ids.len(), "uninteractions");
        Ok(())
    }

    async fn command(&self, name: &str, args: &[Value]) -> PluginResult<()> {
        tracing::info!(output = %self.name, command = name, args = ?args, "command");
        Ok(())
    }
}
