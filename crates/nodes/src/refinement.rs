//! Bounded refinement loop.
//!
//! Repeats an ordered list of sub-steps, conventionally
//! `{evaluator, escalation checker, refiner}`, until one of them escalates or
//! the iteration budget is used up. Running out of budget is graceful: the
//! loop ends normally and later steps work with whatever evaluation is in the
//! shared state.

use async_trait::async_trait;
use pipeline::{Escalation, IterationBudget, PipelineError, StageName};
use tracing::{info, warn};

use crate::{LoopOutcome, LoopRecord, PipelineRun, Step};

pub struct RefinementLoop {
    name: StageName,
    budget: IterationBudget,
    steps: Vec<Box<dyn Step>>,
}

impl RefinementLoop {
    /// Builds a loop over `steps`, run in order once per iteration.
    ///
    /// Fails with a configuration error if `steps` is empty.
    pub fn new(
        name: StageName,
        budget: IterationBudget,
        steps: Vec<Box<dyn Step>>,
    ) -> Result<Self, PipelineError> {
        if steps.is_empty() {
            return Err(PipelineError::configuration(format!(
                "refinement loop '{name}' has no steps"
            )));
        }
        Ok(Self {
            name,
            budget,
            steps,
        })
    }

    async fn iterate(&self, run: &mut PipelineRun) -> Result<LoopRecord, PipelineError> {
        let max = self.budget.get();

        for iteration in 1..=max {
            run.iteration = Some(iteration);
            info!(refinement_loop = %self.name, iteration, max, "Starting refinement iteration");

            for step in &self.steps {
                if step.run(run).await?.is_escalate() {
                    // Later steps of this iteration would only prepare a pass
                    // that never comes.
                    info!(
                        refinement_loop = %self.name,
                        iteration,
                        escalated_by = %step.name(),
                        "Escalation received; leaving loop"
                    );
                    return Ok(LoopRecord {
                        name: self.name.clone(),
                        iterations: iteration,
                        outcome: LoopOutcome::Escalated {
                            by: step.name().clone(),
                        },
                    });
                }
            }
        }

        warn!(
            refinement_loop = %self.name,
            iterations = max,
            "Iteration budget exhausted without escalation; continuing with the last evaluation"
        );
        Ok(LoopRecord {
            name: self.name.clone(),
            iterations: max,
            outcome: LoopOutcome::Exhausted,
        })
    }
}

#[async_trait]
impl Step for RefinementLoop {
    fn name(&self) -> &StageName {
        &self.name
    }

    async fn run(&self, run: &mut PipelineRun) -> Result<Escalation, PipelineError> {
        let enclosing = run.iteration;
        let result = self.iterate(run).await;
        run.iteration = enclosing;

        run.journal.loops.push(result?);
        // The escalation was meant for this loop; it does not travel further.
        Ok(Escalation::Continue)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{name, FailingStage, FixedStage, GradingStage};
    use crate::{EscalationChecker, StageNode};
    use pipeline::{Grade, StateKey};
    use serde_json::json;

    const EVALUATION: &str = "research_evaluation";
    const FINDINGS: &str = "section_research_findings";

    fn refinement_loop(max: u32, grades: Vec<Grade>) -> RefinementLoop {
        let evaluator = StageNode::writing(
            Arc::new(GradingStage::new("evaluator", grades)),
            StateKey::from_static(EVALUATION),
        );
        let checker = StageNode::silent(Arc::new(EscalationChecker::new(
            name("checker"),
            StateKey::from_static(EVALUATION),
        )));
        let refiner = StageNode::writing(
            Arc::new(FixedStage::new("refiner", json!("refined")).with_source("https://r.com")),
            StateKey::from_static(FINDINGS),
        );
        RefinementLoop::new(
            name("loop"),
            IterationBudget::new(max).unwrap(),
            vec![Box::new(evaluator), Box::new(checker), Box::new(refiner)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn never_passing_evaluator_exhausts_budget() {
        let refinement = refinement_loop(3, vec![Grade::Fail]);
        let mut run = PipelineRun::new();

        let escalation = refinement.run(&mut run).await.unwrap();

        assert_eq!(escalation, Escalation::Continue);
        assert_eq!(run.journal.invocations_of("evaluator"), 3);
        assert_eq!(run.journal.invocations_of("checker"), 3);
        assert_eq!(run.journal.invocations_of("refiner"), 3);
        assert_eq!(
            run.journal.loops,
            vec![LoopRecord {
                name: name("loop"),
                iterations: 3,
                outcome: LoopOutcome::Exhausted,
            }]
        );
        // The last evaluation survives for downstream stages.
        let evaluation = run.state.get(&StateKey::from_static(EVALUATION)).unwrap();
        assert_eq!(evaluation["comment"], json!("evaluation 3"));
    }

    #[tokio::test]
    async fn pass_on_second_iteration_skips_refiner_and_stops() {
        let refinement = refinement_loop(3, vec![Grade::Fail, Grade::Pass]);
        let mut run = PipelineRun::new();

        refinement.run(&mut run).await.unwrap();

        assert_eq!(run.journal.invocations_of("evaluator"), 2);
        assert_eq!(run.journal.invocations_of("checker"), 2);
        assert_eq!(run.journal.invocations_of("refiner"), 1);
        assert_eq!(
            run.journal.loops[0].outcome,
            LoopOutcome::Escalated { by: name("checker") }
        );
        assert_eq!(run.journal.loops[0].iterations, 2);

        let iterations: Vec<_> = run
            .journal
            .stages
            .iter()
            .map(|record| (record.stage.to_string(), record.iteration))
            .collect();
        assert_eq!(
            iterations,
            vec![
                ("evaluator".to_string(), Some(1)),
                ("checker".to_string(), Some(1)),
                ("refiner".to_string(), Some(1)),
                ("evaluator".to_string(), Some(2)),
                ("checker".to_string(), Some(2)),
            ]
        );
    }

    #[tokio::test]
    async fn pass_on_first_iteration_never_refines() {
        let refinement = refinement_loop(5, vec![Grade::Pass]);
        let mut run = PipelineRun::new();

        refinement.run(&mut run).await.unwrap();

        assert_eq!(run.journal.invocations_of("refiner"), 0);
        assert_eq!(run.journal.loops[0].iterations, 1);
        assert!(run.state.evidence().is_empty());
    }

    #[tokio::test]
    async fn refiner_evidence_accumulates_across_iterations() {
        let refinement = refinement_loop(2, vec![Grade::Fail]);
        let mut run = PipelineRun::new();

        refinement.run(&mut run).await.unwrap();

        // Same URL both iterations: one source, two claims.
        assert_eq!(run.state.evidence().len(), 1);
        let source = run.state.evidence().sources().next().unwrap();
        assert_eq!(source.supported_claims.len(), 2);
    }

    #[tokio::test]
    async fn sub_step_failure_aborts_loop() {
        let evaluator = StageNode::writing(
            Arc::new(FailingStage::new("evaluator", "critic offline")),
            StateKey::from_static(EVALUATION),
        );
        let refinement = RefinementLoop::new(
            name("loop"),
            IterationBudget::new(3).unwrap(),
            vec![Box::new(evaluator)],
        )
        .unwrap();
        let mut run = PipelineRun::new();

        let err = refinement.run(&mut run).await.unwrap_err();

        assert!(matches!(err, PipelineError::StageFailed { .. }));
        assert!(run.journal.loops.is_empty());
        assert_eq!(run.iteration, None);
    }

    #[test]
    fn empty_loop_is_rejected() {
        let result = RefinementLoop::new(name("loop"), IterationBudget::new(1).unwrap(), Vec::new());
        assert!(matches!(result, Err(PipelineError::ConfigurationError { .. })));
    }
}
