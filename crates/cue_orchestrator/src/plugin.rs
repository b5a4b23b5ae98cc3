//! Input and Output contracts
//!
//! Adapters translate an external protocol into orchestrator commands
//! ([`Input`]) or orchestrator broadcasts into an external protocol
//! ([`Output`]). Every hook has a no-op default, so an adapter implements
//! only what it handles.

use async_trait::async_trait;
use cue_core::{Cue, Interaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{PluginError, PluginResult};

/// A raw `(name, args...)` command emitted by an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Handle inputs use to feed the orchestrator's command channel.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    pub fn send_command(&self, command: Command) -> PluginResult<()> {
        self.tx.send(command).map_err(|_| PluginError::Closed)
    }

    pub fn send(&self, name: impl Into<String>, args: Vec<Value>) -> PluginResult<()> {
        self.send_command(Command::new(name, args))
    }

    pub fn cue(&self, id: impl Into<String>, data: Option<Value>) -> PluginResult<()> {
        let mut args = vec![Value::String(id.into())];
        args.extend(data);
        self.send("cue", args)
    }

    pub fn interact(&self, data: Value, id: Option<String>) -> PluginResult<()> {
        let mut args = vec![data];
        args.extend(id.map(Value::String));
        self.send("interact", args)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Lifecycle shared by inputs and outputs.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn init(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn start(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn stop(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn destroy(&self) -> PluginResult<()> {
        Ok(())
    }
}

pub trait Input: Plugin {
    /// Called once when the input is attached.
    fn bind(&self, commands: CommandSender);
}

/// Receiver of orchestrator broadcasts.
///
/// Handlers run while the orchestrator holds its transition lock. They may
/// queue commands through a [`CommandSender`] but must not await
/// orchestrator operations directly.
#[async_trait]
pub trait Output: Plugin {
    async fn cue(&self, _cue: &Cue, _data: Option<&Value>) -> PluginResult<()> {
        Ok(())
    }

    async fn cues(&self, _cues: &[Cue]) -> PluginResult<()> {
        Ok(())
    }

    /// Transient notice sent before an interaction is persisted.
    async fn interact(&self, _data: &Value, _id: &str) -> PluginResult<()> {
        Ok(())
    }

    async fn interaction(&self, _interaction: &Interaction) -> PluginResult<()> {
        Ok(())
    }

    async fn uninteraction(&self, _id: &str) -> PluginResult<()> {
        Ok(())
    }

    async fn uninteractions(&self, _ids: &[String]) -> PluginResult<()> {
        Ok(())
    }

    async fn command(&self, _name: &str, _args: &[Value]) -> PluginResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sender_helpers_build_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = CommandSender::new(tx);

        sender.cue("Q1", Some(json!({ "x": 1 }))).unwrap();
        sender.interact(json!({ "v": 1 }), None).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            Command::new("cue", vec![json!("Q1"), json!({ "x": 1 })])
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Command::new("interact", vec![json!({ "v": 1 })])
        );
    }

    #[test]
    fn test_sender_reports_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = CommandSender::new(tx);
        drop(rx);

        assert!(sender.is_closed());
        assert!(matches!(sender.send("start", vec![]), Err(PluginError::Closed)));
    }

    #[test]
    fn test_command_deserializes_without_args() {
        let command: Command = serde_json::from_value(json!({ "name": "start" })).unwrap();
        assert_eq!(command, Command::new("start", vec![]));
    }
}
