use serde_json::Value;
use std::sync::{Mutex, PoisonError};

use crate::error::{PluginError, PluginResult};
use crate::plugin::{CommandSender, Input, Plugin};

/// Input driven from code: whatever is passed to [`ChannelInput::emit`]
/// enters the orchestrator's pipeline.
#[derive(Debug)]
pub struct ChannelInput {
    name: String,
    sender: Mutex<Option<CommandSender>>,
}

impl ChannelInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sender: Mutex::new(None),
        }
    }

    /// Queue a command. Fails until the input is attached.
    pub fn emit(&self, name: impl Into<String>, args: Vec<Value>) -> PluginResult<()> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(PluginError::Closed)?;
        sender.send(name, args)
    }

    pub fn is_bound(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Plugin for ChannelInput {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Input for ChannelInput {
    fn bind(&self, commands: CommandSender) {
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = Some(commands);
    }
}
