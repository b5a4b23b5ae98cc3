//! Show model: definitions, cues, sessions and interactions.

mod cue;
mod definition;
mod interaction;
mod session;

pub use cue::{merge_cues, next_cue, AfterDuration, Cue};
pub use definition::{default_handle, Definition, HandleGenerator};
pub use interaction::Interaction;
pub use session::Session;
