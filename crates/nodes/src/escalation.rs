//! Stage that stops a refinement loop once the research passes evaluation.

use async_trait::async_trait;
use pipeline::{
    escalation, Escalation, SharedState, Stage, StageFailure, StageName, StageOutput, StateKey,
};
use tracing::info;

/// Reads the latest evaluation and signals escalation on a pass grade.
///
/// Writes nothing and keeps no state between invocations.
pub struct EscalationChecker {
    name: StageName,
    evaluation_key: StateKey,
}

impl EscalationChecker {
    pub fn new(name: StageName, evaluation_key: StateKey) -> Self {
        Self {
            name,
            evaluation_key,
        }
    }
}

#[async_trait]
impl Stage for EscalationChecker {
    fn name(&self) -> &StageName {
        &self.name
    }

    async fn execute(&self, state: &SharedState) -> Result<StageOutput, StageFailure> {
        let decision = escalation::check(state, &self.evaluation_key);
        match decision {
            Escalation::Escalate => info!("Research evaluation passed; escalating to stop loop"),
            Escalation::Continue => {
                info!("Research evaluation failed or not found; loop will continue")
            }
        }
        Ok(StageOutput::signal(decision))
    }
}
