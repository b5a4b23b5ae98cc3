use chrono::Local;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use super::cue::Cue;

/// Produces the session handle for a definition id.
pub type HandleGenerator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One handle per definition and calendar day: `{id}_{YYYY_MM_DD}`.
pub fn default_handle(definition_id: &str) -> String {
    format!("{}_{}", definition_id, Local::now().format("%Y_%m_%d"))
}

fn default_handle_generator() -> HandleGenerator {
    Arc::new(default_handle)
}

/// Static description of a show.
#[derive(Clone, Deserialize)]
pub struct Definition {
    pub id: String,

    #[serde(default)]
    pub cues: Vec<Cue>,

    #[serde(skip, default = "default_handle_generator")]
    handle: HandleGenerator,
}

impl Definition {
    pub fn new(id: impl Into<String>, cues: Vec<Cue>) -> Self {
        Self {
            id: id.into(),
            cues,
            handle: default_handle_generator(),
        }
    }

    /// Replace the session handle generator.
    pub fn with_handle<F>(mut self, handle: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.handle = Arc::new(handle);
        self
    }

    /// The handle of the session this definition should run in now.
    pub fn handle(&self) -> String {
        (self.handle)(&self.id)
    }

    pub fn find_cue(&self, id: &str) -> Option<&Cue> {
        self.cues.iter().find(|cue| cue.id == id)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("id", &self.id)
            .field("cues", &self.cues)
            .finish_non_exhaustive()
    }
}
