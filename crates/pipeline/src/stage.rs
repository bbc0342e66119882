//! The port through which the core invokes worker stages.
//!
//! A stage reads the shared state, does its work (prompting a model, running
//! searches, anything else) and returns a [`StageOutput`]. It never writes the
//! state itself: the executor commits the output under the stage node's
//! output key once `execute` has returned successfully.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{GroundingEvent, SharedState, StageFailure, StageName};

/// Whether a step asks the enclosing loop to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Escalation {
    /// Carry on with the next step.
    #[default]
    Continue,
    /// Terminate the enclosing refinement loop successfully.
    Escalate,
}

impl Escalation {
    pub fn is_escalate(self) -> bool {
        self == Escalation::Escalate
    }
}

/// Everything one stage invocation hands back to the executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutput {
    /// Value to store under the node's output key. Ignored when the node has
    /// no output key.
    pub value: Option<Value>,

    /// Grounding metadata produced during this invocation, in order.
    pub events: Vec<GroundingEvent>,

    pub escalation: Escalation,
}

impl StageOutput {
    /// Output carrying only a value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Output carrying nothing but an escalation decision.
    pub fn signal(escalation: Escalation) -> Self {
        Self {
            escalation,
            ..Self::default()
        }
    }

    /// Appends grounding events to this output.
    pub fn with_events(mut self, events: impl IntoIterator<Item = GroundingEvent>) -> Self {
        self.events.extend(events);
        self
    }
}

/// A unit of work the core invokes through one uniform contract.
///
/// Implementations may run their own work concurrently; the core only sees
/// the aggregate [`StageOutput`].
#[async_trait]
pub trait Stage: Send + Sync {
    /// Name used in spans, the run journal, and error reports.
    fn name(&self) -> &StageName;

    /// Runs the stage against a read-only view of the run's state.
    async fn execute(&self, state: &SharedState) -> Result<StageOutput, StageFailure>;
}
