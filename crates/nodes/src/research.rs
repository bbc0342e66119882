//! The default research graph.
//!
//! ```text
//! research_pipeline
//! ├── section_planner                  -> report_sections
//! ├── section_researcher               -> section_research_findings
//! ├── iterative_refinement_loop (max_search_iterations)
//! │   ├── research_evaluator           -> research_evaluation
//! │   ├── escalation_checker
//! │   └── enhanced_search_executor     -> section_research_findings
//! ├── report_composer_with_citations   -> final_cited_report
//! └── citation_renderer                -> final_report_with_citations
//! ```
//!
//! The five worker stages are supplied by the caller; the escalation checker
//! and citation renderer are built here. `research_plan` is expected in the
//! initial state.

use std::sync::Arc;

use pipeline::{keys, IterationBudget, PipelineError, Stage, StageName, StateKey};

use crate::{CitationRenderer, EscalationChecker, RefinementLoop, Sequencer, StageNode};

pub const RESEARCH_PIPELINE: &str = "research_pipeline";
pub const SECTION_PLANNER: &str = "section_planner";
pub const SECTION_RESEARCHER: &str = "section_researcher";
pub const REFINEMENT_LOOP: &str = "iterative_refinement_loop";
pub const RESEARCH_EVALUATOR: &str = "research_evaluator";
pub const ESCALATION_CHECKER: &str = "escalation_checker";
pub const ENHANCED_SEARCH_EXECUTOR: &str = "enhanced_search_executor";
pub const REPORT_COMPOSER: &str = "report_composer_with_citations";
pub const CITATION_RENDERER: &str = "citation_renderer";

/// Caller-supplied worker stages of the research graph.
pub struct ResearchWorkers {
    /// Turns the plan into a report outline.
    pub section_planner: Arc<dyn Stage>,
    /// Researches the plan; its grounding feeds the evidence registry.
    pub section_researcher: Arc<dyn Stage>,
    /// Grades the findings; must output an `EvaluationResult`.
    pub research_evaluator: Arc<dyn Stage>,
    /// Runs the evaluator's follow-up queries and rewrites the findings.
    pub enhanced_search_executor: Arc<dyn Stage>,
    /// Writes the report with `<cite source="src-N" />` markers.
    pub report_composer: Arc<dyn Stage>,
}

/// Assembles the research graph around `workers`.
pub fn research_pipeline(
    workers: ResearchWorkers,
    max_search_iterations: IterationBudget,
) -> Result<Sequencer, PipelineError> {
    let evaluation_key = StateKey::from_static(keys::RESEARCH_EVALUATION);
    let findings_key = StateKey::from_static(keys::SECTION_RESEARCH_FINDINGS);

    let refinement = RefinementLoop::new(
        StageName::from_static(REFINEMENT_LOOP),
        max_search_iterations,
        vec![
            Box::new(StageNode::writing(
                workers.research_evaluator,
                evaluation_key.clone(),
            )),
            Box::new(StageNode::silent(Arc::new(EscalationChecker::new(
                StageName::from_static(ESCALATION_CHECKER),
                evaluation_key,
            )))),
            Box::new(StageNode::writing(
                workers.enhanced_search_executor,
                findings_key.clone(),
            )),
        ],
    )?;

    let renderer = CitationRenderer::new(
        StageName::from_static(CITATION_RENDERER),
        StateKey::from_static(keys::FINAL_CITED_REPORT),
    );

    Ok(Sequencer::new(StageName::from_static(RESEARCH_PIPELINE), Vec::new())
        .then(StageNode::writing(
            workers.section_planner,
            StateKey::from_static(keys::REPORT_SECTIONS),
        ))
        .then(StageNode::writing(workers.section_researcher, findings_key))
        .then(refinement)
        .then(StageNode::writing(
            workers.report_composer,
            StateKey::from_static(keys::FINAL_CITED_REPORT),
        ))
        .then(StageNode::writing(
            Arc::new(renderer),
            StateKey::from_static(keys::FINAL_REPORT_WITH_CITATIONS),
        )))
}
