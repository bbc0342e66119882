//! Offline worker stages that play back recorded responses.
//!
//! A [`Transcript`] records, per stage name, the responses that stage gave in
//! a past run, plus the initial state the run started from. Replaying it runs
//! the real orchestration (sequencing, refinement loop, evidence registry,
//! citation rendering) without any model or search backend.
//!
//! ```json
//! {
//!   "initial_state": { "research_plan": "..." },
//!   "stages": {
//!     "section_researcher": [
//!       { "output": "findings", "groundingMetadata": { "groundingChunks": [] } }
//!     ]
//!   }
//! }
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    GroundingEvent, PipelineError, SharedState, Stage, StageFailure, StageName, StageOutput,
    StateKey,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::research::{
    ResearchWorkers, ENHANCED_SEARCH_EXECUTOR, REPORT_COMPOSER, RESEARCH_EVALUATOR,
    SECTION_PLANNER, SECTION_RESEARCHER,
};

/// One recorded stage invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedResponse {
    /// Value the stage produced.
    #[serde(default)]
    pub output: Option<Value>,

    /// Grounding metadata attached to the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingEvent>,

    /// When set, the invocation fails with this message instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// A stage that returns its scripted responses in order, one per call.
///
/// Fails once the script is exhausted.
pub struct ScriptedStage {
    name: StageName,
    script: Mutex<VecDeque<ScriptedResponse>>,
}

impl ScriptedStage {
    pub fn new(name: StageName, script: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self {
            name,
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    /// Number of responses not yet played.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl Stage for ScriptedStage {
    fn name(&self) -> &StageName {
        &self.name
    }

    async fn execute(&self, _state: &SharedState) -> Result<StageOutput, StageFailure> {
        let response = self.script.lock().await.pop_front().ok_or_else(|| {
            StageFailure::new(format!("no scripted response left for '{}'", self.name))
        })?;

        if let Some(message) = response.failure {
            return Err(StageFailure::new(message));
        }

        debug!(
            grounded = response.grounding_metadata.is_some(),
            "Replaying scripted response"
        );
        Ok(StageOutput {
            value: response.output,
            events: response.grounding_metadata.into_iter().collect(),
            ..StageOutput::default()
        })
    }
}

/// Recorded responses for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Values present in shared state before the first stage runs.
    #[serde(default)]
    pub initial_state: BTreeMap<String, Value>,

    /// Responses per stage name, in invocation order.
    #[serde(default)]
    pub stages: BTreeMap<String, Vec<ScriptedResponse>>,
}

impl Transcript {
    /// Parses a transcript from JSON text.
    pub fn from_json(text: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(text)
            .map_err(|err| PipelineError::configuration(format!("invalid transcript: {err}")))
    }

    /// A scripted stage named `name` playing this transcript's responses for
    /// it. A stage with no recorded responses fails on its first call.
    pub fn stage(&self, name: &'static str) -> ScriptedStage {
        let script = self.stages.get(name).cloned().unwrap_or_default();
        ScriptedStage::new(StageName::from_static(name), script)
    }

    /// Worker stages for the default research graph.
    pub fn research_workers(&self) -> ResearchWorkers {
        ResearchWorkers {
            section_planner: Arc::new(self.stage(SECTION_PLANNER)),
            section_researcher: Arc::new(self.stage(SECTION_RESEARCHER)),
            research_evaluator: Arc::new(self.stage(RESEARCH_EVALUATOR)),
            enhanced_search_executor: Arc::new(self.stage(ENHANCED_SEARCH_EXECUTOR)),
            report_composer: Arc::new(self.stage(REPORT_COMPOSER)),
        }
    }

    /// The recorded initial state as typed entries.
    pub fn initial_state(&self) -> Result<Vec<(StateKey, Value)>, PipelineError> {
        self.initial_state
            .iter()
            .map(|(key, value)| {
                StateKey::new(key.clone())
                    .map(|key| (key, value.clone()))
                    .ok_or_else(|| PipelineError::configuration("initial state has an empty key"))
            })
            .collect()
    }
}
