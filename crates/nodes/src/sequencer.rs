//! Runs a fixed list of steps once each, top to bottom.

use async_trait::async_trait;
use pipeline::{Escalation, PipelineError, StageName};
use tracing::{debug, info};

use crate::{PipelineRun, Step};

/// Ordered composition of steps with no retry or loop logic of its own.
///
/// Every step commits its output before the next one starts, which is how
/// later steps see earlier results. The first error aborts the sequence.
///
/// A child's escalation does not cut the sequence short; it is passed upward
/// once every step has run, so a sequencer nested in a refinement loop can
/// still end that loop.
pub struct Sequencer {
    name: StageName,
    steps: Vec<Box<dyn Step>>,
}

impl Sequencer {
    pub fn new(name: StageName, steps: Vec<Box<dyn Step>>) -> Self {
        Self { name, steps }
    }

    /// Appends a step.
    pub fn then(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }
}

#[async_trait]
impl Step for Sequencer {
    fn name(&self) -> &StageName {
        &self.name
    }

    async fn run(&self, run: &mut PipelineRun) -> Result<Escalation, PipelineError> {
        let total = self.steps.len();
        let mut escalation = Escalation::Continue;

        for (position, step) in self.steps.iter().enumerate() {
            info!(sequence = %self.name, step = %step.name(), position = position + 1, total, "Running step");
            if step.run(run).await?.is_escalate() {
                debug!(sequence = %self.name, step = %step.name(), "Step escalated; finishing sequence");
                escalation = Escalation::Escalate;
            }
        }

        Ok(escalation)
    }
}
