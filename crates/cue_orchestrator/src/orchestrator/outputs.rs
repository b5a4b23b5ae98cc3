use cue_core::{Cue, Interaction};
use serde_json::Value;

use super::Orchestrator;
use crate::fanout::settle_all;

#[derive(Debug, Clone, Copy)]
pub(super) enum Lifecycle {
    Init,
    Start,
    Stop,
    Destroy,
}

impl Lifecycle {
    fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Init => "init",
            Lifecycle::Start => "start",
            Lifecycle::Stop => "stop",
            Lifecycle::Destroy => "destroy",
        }
    }
}

impl Orchestrator {
    /// Run a lifecycle stage on every input, then on every output.
    pub(super) async fn lifecycle(&self, stage: Lifecycle) {
        let action = stage.as_str();

        let inputs = self.inputs().await;
        settle_all(
            &inputs,
            action,
            inputs.iter().map(|input| match stage {
                Lifecycle::Init => input.init(),
                Lifecycle::Start => input.start(),
                Lifecycle::Stop => input.stop(),
                Lifecycle::Destroy => input.destroy(),
            })
            .collect(),
        )
        .await;

        let outputs = self.outputs().await;
        settle_all(
            &outputs,
            action,
            outputs.iter().map(|output| match stage {
                Lifecycle::Init => output.init(),
                Lifecycle::Start => output.start(),
                Lifecycle::Stop => output.stop(),
                Lifecycle::Destroy => output.destroy(),
            })
            .collect(),
        )
        .await;
    }

    pub(super) async fn broadcast_cue(&self, cue: &Cue, data: Option<&Value>) {
        let outputs = self.outputs().await;
        let calls: Vec<_> = outputs.iter().map(|o| o.cue(cue, data)).collect();
        settle_all(&outputs, "cue", calls).await;
    }

    pub(super) async fn broadcast_cues(&self, cues: &[Cue]) {
        let outputs = self.outputs().await;
        settle_all(&outputs, "cues", outputs.iter().map(|o| o.cues(cues)).collect()).await;
    }

    pub(super) async fn broadcast_interact(&self, data: &Value, id: &str) {
        let outputs = self.outputs().await;
        let calls: Vec<_> = outputs.iter().map(|o| o.interact(data, id)).collect();
        settle_all(&outputs, "interact", calls).await;
    }

    pub(super) async fn broadcast_interaction(&self, interaction: &Interaction) {
        let outputs = self.outputs().await;
        settle_all(
            &outputs,
            "interaction",
            outputs.iter().map(|o| o.interaction(interaction)).collect(),
        )
        .await;
    }

    pub(super) async fn broadcast_uninteraction(&self, id: &str) {
        let outputs = self.outputs().await;
        settle_all(
            &outputs,
            "uninteraction",
            outputs.iter().map(|o| o.uninteraction(id)).collect(),
        )
        .await;
    }

    pub(super) async fn broadcast_uninteractions(&self, ids: &[String]) {
        let outputs = self.outputs().await;
        settle_all(
            &outputs,
            "uninteractions",
            outputs.iter().map(|o| o.uninteractions(ids)).collect(),
        )
        .await;
    }

    pub(super) async fn broadcast_command(&self, name: &str, args: &[Value]) {
        let outputs = self.outputs().await;
        tracing::debug!(command = name, outputs = outputs.len(), "Broadcasting command");
        let calls: Vec<_> = outputs.iter().map(|o| o.command(name, args)).collect();
        settle_all(&outputs, name, calls).await;
    }
}
