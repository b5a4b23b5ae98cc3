//! Orchestrator states

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle states of an orchestrator.
///
/// A cue is never a state of its own: which cue is active lives in the
/// session, the machine only knows that *some* cue is active.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Nothing is brought up yet (also the state after `destroy`).
    #[default]
    None,

    /// Store, inputs and outputs are initialized.
    Initialized,

    /// A session is open and no cue is active.
    Idle,

    /// A session is open and a cue is active.
    Cued,

    /// Inputs and outputs are stopped; the session stays open.
    Stopped,

    /// The session has ended.
    Ended,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Initialized => "initialized",
            Self::Idle => "idle",
            Self::Cued => "cued",
            Self::Stopped => "stopped",
            Self::Ended => "ended",
        }
    }

    /// Whether a session is open and accepting cues.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Idle | Self::Cued)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
