//! State machine module
//!
//! Contains the FSM implementation for the orchestrator lifecycle.

mod events;
mod states;
mod transitions;

pub use events::{FromStates, TransitionKind};
pub use states::State;
pub use transitions::{StateMachine, StateTransition, TransitionError};
