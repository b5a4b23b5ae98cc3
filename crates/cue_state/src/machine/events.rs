//! Transition kinds - the named moves of the state machine

use serde::{Deserialize, Serialize};
use std::fmt;

use super::states::State;

/// The states a transition may start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromStates {
    /// Legal from every state, including `None`.
    Any,
    /// Legal only from the listed states.
    Only(&'static [State]),
}

impl FromStates {
    pub fn contains(&self, state: State) -> bool {
        match self {
            Self::Any => true,
            Self::Only(states) => states.contains(&state),
        }
    }
}

/// Defines the transitions that can be requested on the FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Init,
    Destroy,
    Start,
    Stop,
    Cue,
    Uncue,
    End,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 7] = [
        Self::Init,
        Self::Destroy,
        Self::Start,
        Self::Stop,
        Self::Cue,
        Self::Uncue,
        Self::End,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Destroy => "destroy",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Cue => "cue",
            Self::Uncue => "uncue",
            Self::End => "end",
        }
    }

    /// Source states of the transition table.
    pub fn from_states(&self) -> FromStates {
        match self {
            Self::Init => FromStates::Only(&[State::None]),
            Self::Destroy => FromStates::Any,
            Self::Start => FromStates::Only(&[State::Initialized, State::Stopped, State::Ended]),
            Self::Stop | Self::Cue | Self::Uncue | Self::End => {
                FromStates::Only(&[State::Idle, State::Cued])
            }
        }
    }

    /// Target state of the transition table.
    pub fn target(&self) -> State {
        match self {
            Self::Init => State::Initialized,
            Self::Destroy => State::None,
            Self::Start => State::Idle,
            Self::Stop => State::Stopped,
            Self::Cue => State::Cued,
            Self::Uncue => State::Idle,
            Self::End => State::Ended,
        }
    }

    /// Whether committing this transition should be announced to outputs.
    ///
    /// `init` runs before outputs are attached, so it stays silent.
    pub fn is_broadcast(&self) -> bool {
        !matches!(self, Self::Init)
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
