//! The common contract of everything the executor can run.
//!
//! Stage nodes, refinement loops and sequencers all implement [`Step`], so a
//! loop or a sequencer can hold any mix of the three and nest arbitrarily.

use async_trait::async_trait;
use pipeline::{
    Escalation, PipelineError, PipelineRunId, SharedState, StageName, StateKey, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Mutable context of one pipeline run.
///
/// Created empty at run start and dropped at run end. Steps run strictly one
/// after another, each receiving the run by `&mut`.
#[derive(Debug)]
pub struct PipelineRun {
    pub id: PipelineRunId,
    pub started_at: Timestamp,
    pub state: SharedState,
    pub journal: RunJournal,
    /// 1-based iteration of the innermost refinement loop currently running.
    pub(crate) iteration: Option<u32>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            id: PipelineRunId::new_random(),
            started_at: Timestamp::now(),
            state: SharedState::new(),
            journal: RunJournal::default(),
            iteration: None,
        }
    }
}

/// Ordered record of what a run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunJournal {
    /// One entry per completed stage invocation.
    pub stages: Vec<StageRecord>,
    /// One entry per refinement loop that finished.
    pub loops: Vec<LoopRecord>,
}

impl RunJournal {
    /// Number of completed invocations of the stage called `name`.
    pub fn invocations_of(&self, name: &str) -> usize {
        self.stages
            .iter()
            .filter(|record| record.stage.as_str() == name)
            .count()
    }
}

/// A completed stage invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageName,
    /// Loop iteration the stage ran in, if any.
    pub iteration: Option<u32>,
    pub started_at: Timestamp,
    pub duration_ms: u64,
    /// Key the output was committed under, if one was written.
    pub wrote: Option<StateKey>,
    pub new_sources: usize,
    pub claims_appended: usize,
    pub escalation: Escalation,
}

/// How a refinement loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LoopOutcome {
    /// A sub-step signalled escalation.
    Escalated { by: StageName },
    /// The iteration budget ran out. Not a failure.
    Exhausted,
}

/// A finished refinement loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopRecord {
    pub name: StageName,
    /// Iterations started, including the one that escalated.
    pub iterations: u32,
    pub outcome: LoopOutcome,
}

/// A node of the pipeline graph.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &StageName;

    /// Runs the step to completion against `run`.
    ///
    /// Returns whether the step asks an enclosing loop to stop. Any error
    /// aborts the whole run.
    async fn run(&self, run: &mut PipelineRun) -> Result<Escalation, PipelineError>;
}
