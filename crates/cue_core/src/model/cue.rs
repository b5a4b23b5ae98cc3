use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// What happens when a cue's duration elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterDuration {
    /// Cue the following cue of the list, or uncue when there is none.
    Next,
    /// Clear the active cue.
    #[default]
    Uncue,
}

/// A named step of the show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub cue_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Whether the audience is expected to respond while this cue is active.
    #[serde(default)]
    pub interactive: bool,

    /// Stateful cues are written to the session so a restart resumes them.
    #[serde(default)]
    pub stateful: bool,

    /// Seconds before `after_duration` applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(default)]
    pub after_duration: AfterDuration,

    /// Free-form template payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Cue {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cue_type: None,
            label: None,
            group: None,
            interactive: false,
            stateful: false,
            duration: None,
            after_duration: AfterDuration::default(),
            data: None,
        }
    }

    pub fn with_type(mut self, cue_type: impl Into<String>) -> Self {
        self.cue_type = Some(cue_type.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn stateful(mut self) -> Self {
        self.stateful = true;
        self
    }

    pub fn with_duration(mut self, seconds: f64, after: AfterDuration) -> Self {
        self.duration = Some(seconds);
        self.after_duration = after;
        self
    }

    /// The duration as a [`Duration`], ignoring negative or non-finite values.
    pub fn timer_duration(&self) -> Option<Duration> {
        self.duration
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }
}

/// Merge `incoming` cues in front of `existing` ones, keeping the first
/// occurrence of every id.
pub fn merge_cues(incoming: Vec<Cue>, existing: &[Cue]) -> Vec<Cue> {
    let mut seen = HashSet::new();
    incoming
        .into_iter()
        .chain(existing.iter().cloned())
        .filter(|cue| seen.insert(cue.id.clone()))
        .collect()
}

/// The cue that follows `id` in `cues`.
pub fn next_cue<'a>(cues: &'a [Cue], id: &str) -> Option<&'a Cue> {
    let index = cues.iter().position(|cue| cue.id == id)?;
    cues.get(index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cue_deserializes_wire_names() {
        let cue: Cue = serde_json::from_value(json!({
            "id": "Q1",
            "type": "question",
            "stateful": true,
            "duration": 1.5,
            "afterDuration": "next"
        }))
        .unwrap();

        assert_eq!(cue.cue_type.as_deref(), Some("question"));
        assert!(cue.stateful);
        assert!(!cue.interactive);
        assert_eq!(cue.after_duration, AfterDuration::Next);
        assert_eq!(cue.timer_duration(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_after_duration_defaults_to_uncue() {
        let cue: Cue = serde_json::from_value(json!({ "id": "Q1" })).unwrap();
        assert_eq!(cue.after_duration, AfterDuration::Uncue);
        assert_eq!(cue.timer_duration(), None);
    }

    #[test]
    fn test_negative_duration_has_no_timer() {
        let cue = Cue::new("Q1").with_duration(-1.0, AfterDuration::Uncue);
        assert_eq!(cue.timer_duration(), None);
    }

    #[test]
    fn test_merge_new_cues_take_precedence() {
        let existing = vec![
            Cue::new("A").with_label("old a"),
            Cue::new("B").with_label("old b"),
        ];
        let incoming = vec![Cue::new("C"), Cue::new("A").with_label("new a")];

        let merged = merge_cues(incoming, &existing);

        let ids: Vec<&str> = merged.iter().map(|cue| cue.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
        assert_eq!(merged[1].label.as_deref(), Some("new a"));
    }

    #[test]
    fn test_merge_dedupes_within_incoming() {
        let merged = merge_cues(
            vec![Cue::new("A").with_label("first"), Cue::new("A").with_label("second")],
            &[],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].label.as_deref(), Some("first"));
    }

    #[test]
    fn test_next_cue() {
        let cues = vec![Cue::new("Q1"), Cue::new("Q2")];
        assert_eq!(next_cue(&cues, "Q1").map(|c| c.id.as_str()), Some("Q2"));
        assert!(next_cue(&cues, "Q2").is_none());
        assert!(next_cue(&cues, "missing").is_none());
    }
}
