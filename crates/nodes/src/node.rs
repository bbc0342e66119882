//! Wraps a [`Stage`] so the executor can run it and commit its output.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use pipeline::{Escalation, PipelineError, Stage, StageName, StageOutput, StateKey, Timestamp};
use tracing::{debug, error, info, info_span, Instrument};

use crate::{PipelineRun, StageRecord, Step};

/// An atomic step: one stage plus the state key its output is committed to.
///
/// The node is the only place a stage's output reaches the shared state. The
/// output value and grounding events are committed together after `execute`
/// returns `Ok`; a failing stage writes nothing.
pub struct StageNode {
    stage: Arc<dyn Stage>,
    output_key: Option<StateKey>,
}

impl StageNode {
    /// A node whose output value is stored under `output_key`.
    pub fn writing(stage: Arc<dyn Stage>, output_key: StateKey) -> Self {
        Self {
            stage,
            output_key: Some(output_key),
        }
    }

    /// A node that stores no value. Grounding events it emits are still
    /// ingested.
    pub fn silent(stage: Arc<dyn Stage>) -> Self {
        Self {
            stage,
            output_key: None,
        }
    }
}

#[async_trait]
impl Step for StageNode {
    fn name(&self) -> &StageName {
        self.stage.name()
    }

    async fn run(&self, run: &mut PipelineRun) -> Result<Escalation, PipelineError> {
        let span = info_span!(
            "stage",
            stage = %self.stage.name(),
            run_id = %run.id,
            iteration = run.iteration,
        );

        async move {
            let started_at = Timestamp::now();
            let clock = Instant::now();

            let output = self.stage.execute(&run.state).await.map_err(|source| {
                error!(error = %source, "Stage failed; aborting run");
                PipelineError::StageFailed {
                    stage: self.stage.name().clone(),
                    source,
                }
            })?;

            let StageOutput {
                value,
                events,
                escalation,
            } = output;

            let write = match (&self.output_key, value) {
                (Some(key), Some(value)) => Some((key.clone(), value)),
                (None, Some(_)) => {
                    debug!("Stage returned a value but has no output key; discarded");
                    None
                }
                (_, None) => None,
            };
            let wrote = write.as_ref().map(|(key, _)| key.clone());
            let summary = run.state.commit(write, &events);
            let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

            info!(
                duration_ms,
                wrote = wrote.as_ref().map(|key| key.as_str()),
                new_sources = summary.new_sources,
                claims_appended = summary.claims_appended,
                escalate = escalation.is_escalate(),
                "Stage completed"
            );

            run.journal.stages.push(StageRecord {
                stage: self.stage.name().clone(),
                iteration: run.iteration,
                started_at,
                duration_ms,
                wrote,
                new_sources: summary.new_sources,
                claims_appended: summary.claims_appended,
                escalation,
            });

            Ok(escalation)
        }
        .instrument(span)
        .await
    }
}
