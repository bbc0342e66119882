//! Owns one pipeline run from empty state to delivered artefacts.

use std::time::Instant;

use pipeline::{
    keys, EvaluationResult, EvidenceSource, PipelineError, PipelineRunId, StateKey, Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, info_span, warn, Instrument};

use crate::{PipelineRun, RunJournal, Step};

/// What an external caller may depend on after a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifacts {
    pub run_id: PipelineRunId,
    pub started_at: Timestamp,
    /// The rendered report, if the graph produced one.
    pub final_report: Option<String>,
    /// The last evaluation written during the run.
    pub evaluation: Option<EvaluationResult>,
    /// Sources in short-id order.
    pub sources: Vec<EvidenceSource>,
    /// Every state value at the end of the run, plus `url_to_short_id` and
    /// `sources`, as produced by [`pipeline::SharedState::export`].
    pub state: Value,
    pub journal: RunJournal,
}

impl RunArtifacts {
    /// URL to short id, as a JSON object.
    pub fn url_to_short_id(&self) -> &Value {
        &self.state[keys::URL_TO_SHORT_ID]
    }
}

/// Drives a root [`Step`] over a fresh [`PipelineRun`].
pub struct PipelineExecutor {
    root: Box<dyn Step>,
}

impl PipelineExecutor {
    /// Creates an executor; artefacts are read from the research graph's
    /// `final_report_with_citations` and `research_evaluation` keys.
    pub fn new(root: impl Step + 'static) -> Self {
        Self {
            root: Box::new(root),
        }
    }

    /// Runs the graph once over state seeded with `initial`.
    ///
    /// The run's state is dropped when this returns; use
    /// [`PipelineExecutor::execute_in`] to keep it.
    pub async fn execute<I>(&self, initial: I) -> Result<RunArtifacts, PipelineError>
    where
        I: IntoIterator<Item = (StateKey, Value)>,
    {
        let mut run = PipelineRun::new();
        for (key, value) in initial {
            run.state.insert(key, value);
        }
        self.execute_in(&mut run).await?;
        Ok(self.artifacts(run))
    }

    /// Runs the graph against a caller-owned run.
    ///
    /// On error, `run.state` holds exactly the outputs of the stages that
    /// completed before the failure.
    pub async fn execute_in(&self, run: &mut PipelineRun) -> Result<(), PipelineError> {
        let span = info_span!("pipeline_run", run_id = %run.id, pipeline = %self.root.name());

        async {
            let clock = Instant::now();
            info!(started_at = %run.started_at, "Pipeline run started");

            match self.root.run(run).await {
                Ok(_) => {
                    info!(
                        duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
                        stages = run.journal.stages.len(),
                        sources = run.state.evidence().len(),
                        "Pipeline run finished"
                    );
                    Ok(())
                }
                Err(err) => {
                    error!(error = %err, stages_completed = run.journal.stages.len(), "Pipeline run aborted");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Collects the caller-facing artefacts out of a finished run.
    pub fn artifacts(&self, run: PipelineRun) -> RunArtifacts {
        let report_key = StateKey::from_static(keys::FINAL_REPORT_WITH_CITATIONS);
        let evaluation_key = StateKey::from_static(keys::RESEARCH_EVALUATION);

        let final_report = run.state.get_str(&report_key).map(str::to_string);
        let evaluation = match run.state.get_as::<EvaluationResult>(&evaluation_key) {
            Some(Ok(evaluation)) => Some(evaluation),
            Some(Err(err)) => {
                warn!(error = %err, "Latest evaluation is unreadable; omitted from artefacts");
                None
            }
            None => None,
        };

        RunArtifacts {
            run_id: run.id,
            started_at: run.started_at,
            final_report,
            evaluation,
            sources: run.state.evidence().sources().cloned().collect(),
            state: run.state.export(),
            journal: run.journal,
        }
    }
}
