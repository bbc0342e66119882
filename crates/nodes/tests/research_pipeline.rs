//! End-to-end runs of the default research graph over recorded transcripts.

use nodes::research::{
    CITATION_RENDERER, ENHANCED_SEARCH_EXECUTOR, ESCALATION_CHECKER, REFINEMENT_LOOP,
    REPORT_COMPOSER, RESEARCH_EVALUATOR, SECTION_PLANNER, SECTION_RESEARCHER,
};
use nodes::{research_pipeline, LoopOutcome, PipelineExecutor, PipelineRun, Transcript};
use pipeline::{keys, Grade, IterationBudget, PipelineError, StateKey};
use serde_json::{json, Value};

const COMPOSED: &str = "Digital spend rose 12% <cite source=\"src-1\" /> . \
Loyalty matters <cite source='src-2'/>; CAC fell <cite source=\"src-3\" />. \
Unverified claim <cite source=\"src-9\" />.";

fn researcher_response() -> Value {
    json!({
        "output": "findings v1",
        "groundingMetadata": {
            "groundingChunks": [
                {"web": {"uri": "https://www.mckinsey.com/insights", "title": "McKinsey Insights", "domain": "mckinsey.com"}},
                {"web": {"uri": "https://hbr.org/loyalty", "title": "hbr.org", "domain": "hbr.org"}}
            ],
            "groundingSupports": [
                {"segment": {"text": "Digital spend rose 12%"}, "confidenceScores": [0.92], "groundingChunkIndices": [0]},
                {"segment": {"text": "Loyalty drives margin"}, "confidenceScores": [0.8, 0.7], "groundingChunkIndices": [0, 1]}
            ]
        }
    })
}

fn refiner_response(output: &str) -> Value {
    json!({
        "output": output,
        "groundingMetadata": {
            "groundingChunks": [
                {"web": {"uri": "https://www.gartner.com/cac", "title": "Gartner", "domain": "gartner.com"}},
                {"web": {"uri": "https://www.mckinsey.com/insights", "title": "McKinsey Insights", "domain": "mckinsey.com"}}
            ],
            "groundingSupports": [
                {"segment": {"text": "CAC fell"}, "confidenceScores": [0.66], "groundingChunkIndices": [0, 1]}
            ]
        }
    })
}

fn evaluation(grade: &str) -> Value {
    json!({
        "output": {
            "grade": grade,
            "comment": format!("graded {grade}"),
            "follow_up_queries": if grade == "fail" { json!([{"search_query": "customer acquisition cost trends"}]) } else { Value::Null }
        }
    })
}

fn transcript(evaluations: &[&str], refinements: usize, composer: Value) -> Transcript {
    let refiner: Vec<Value> = (1..=refinements)
        .map(|n| refiner_response(&format!("findings v{}", n + 1)))
        .collect();
    let evaluator: Vec<Value> = evaluations.iter().map(|grade| evaluation(grade)).collect();

    let mut stages = serde_json::Map::new();
    stages.insert(SECTION_PLANNER.into(), json!([{"output": "# Market Assessment"}]));
    stages.insert(SECTION_RESEARCHER.into(), json!([researcher_response()]));
    stages.insert(RESEARCH_EVALUATOR.into(), Value::Array(evaluator));
    stages.insert(ENHANCED_SEARCH_EXECUTOR.into(), Value::Array(refiner));
    stages.insert(REPORT_COMPOSER.into(), json!([composer]));

    Transcript::from_json(
        &json!({
            "initial_state": {"research_plan": "[ANALYSIS] Assess the marketing funnel"},
            "stages": stages
        })
        .to_string(),
    )
    .unwrap()
}

fn executor(transcript: &Transcript, max_iterations: u32) -> PipelineExecutor {
    let graph = research_pipeline(
        transcript.research_workers(),
        IterationBudget::new(max_iterations).unwrap(),
    )
    .unwrap();
    PipelineExecutor::new(graph)
}

#[tokio::test]
async fn passing_on_second_evaluation_delivers_cited_report() {
    let transcript = transcript(&["fail", "pass"], 1, json!({"output": COMPOSED}));

    let artifacts = executor(&transcript, 3)
        .execute(transcript.initial_state().unwrap())
        .await
        .unwrap();

    assert_eq!(
        artifacts.final_report.as_deref(),
        Some(
            "Digital spend rose 12% [McKinsey Insights](https://www.mckinsey.com/insights). \
Loyalty matters [hbr.org](https://hbr.org/loyalty); CAC fell [Gartner](https://www.gartner.com/cac). \
Unverified claim."
        )
    );

    assert_eq!(
        artifacts.url_to_short_id(),
        &json!({
            "https://www.mckinsey.com/insights": "src-1",
            "https://hbr.org/loyalty": "src-2",
            "https://www.gartner.com/cac": "src-3"
        })
    );

    let mckinsey = &artifacts.sources[0];
    let claims: Vec<_> = mckinsey
        .supported_claims
        .iter()
        .map(|claim| (claim.text_segment.as_str(), claim.confidence.as_f64()))
        .collect();
    assert_eq!(
        claims,
        vec![
            ("Digital spend rose 12%", 0.92),
            ("Loyalty drives margin", 0.8),
            ("CAC fell", 0.5),
        ]
    );
    assert_eq!(artifacts.sources[1].supported_claims[0].confidence.as_f64(), 0.7);
    assert_eq!(artifacts.sources[2].supported_claims[0].confidence.as_f64(), 0.66);

    assert_eq!(artifacts.evaluation.as_ref().map(|e| e.grade), Some(Grade::Pass));

    let order: Vec<_> = artifacts
        .journal
        .stages
        .iter()
        .map(|record| record.stage.to_string())
        .collect();
    assert_eq!(
        order,
        vec![
            SECTION_PLANNER,
            SECTION_RESEARCHER,
            RESEARCH_EVALUATOR,
            ESCALATION_CHECKER,
            ENHANCED_SEARCH_EXECUTOR,
            RESEARCH_EVALUATOR,
            ESCALATION_CHECKER,
            REPORT_COMPOSER,
            CITATION_RENDERER,
        ]
    );

    let refinement = &artifacts.journal.loops[0];
    assert_eq!(refinement.name.as_str(), REFINEMENT_LOOP);
    assert_eq!(refinement.iterations, 2);
    assert_eq!(
        refinement.outcome,
        LoopOutcome::Escalated {
            by: pipeline::StageName::from_static(ESCALATION_CHECKER)
        }
    );
}

#[tokio::test]
async fn exhausted_budget_still_finishes_the_report() {
    let transcript = transcript(
        &["fail", "fail"],
        2,
        json!({"output": "Summary <cite source=\"src-3\" />."}),
    );

    let artifacts = executor(&transcript, 2)
        .execute(transcript.initial_state().unwrap())
        .await
        .unwrap();

    assert_eq!(artifacts.journal.loops[0].outcome, LoopOutcome::Exhausted);
    assert_eq!(artifacts.journal.invocations_of(ENHANCED_SEARCH_EXECUTOR), 2);
    assert_eq!(
        artifacts.evaluation.as_ref().map(|e| e.grade),
        Some(Grade::Fail)
    );
    assert_eq!(
        artifacts.final_report.as_deref(),
        Some("Summary [Gartner](https://www.gartner.com/cac).")
    );
    // Two refinement passes over the same URLs: no new ids, more claims.
    assert_eq!(artifacts.sources.len(), 3);
    assert_eq!(artifacts.sources[2].supported_claims.len(), 2);
}

#[tokio::test]
async fn composer_failure_aborts_with_earlier_outputs_intact() {
    let transcript = transcript(&["pass"], 0, json!({"failure": "model overloaded"}));
    let executor = executor(&transcript, 3);
    let mut run = PipelineRun::new();
    for (key, value) in transcript.initial_state().unwrap() {
        run.state.insert(key, value);
    }

    let err = executor.execute_in(&mut run).await.unwrap_err();

    match err {
        PipelineError::StageFailed { stage, source } => {
            assert_eq!(stage.as_str(), REPORT_COMPOSER);
            assert_eq!(source.message, "model overloaded");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        run.state
            .get_str(&StateKey::from_static(keys::SECTION_RESEARCH_FINDINGS)),
        Some("findings v1")
    );
    assert!(run
        .state
        .contains(&StateKey::from_static(keys::RESEARCH_EVALUATION)));
    assert!(!run
        .state
        .contains(&StateKey::from_static(keys::FINAL_CITED_REPORT)));
    assert!(!run
        .state
        .contains(&StateKey::from_static(keys::FINAL_REPORT_WITH_CITATIONS)));
    assert_eq!(run.state.evidence().len(), 2);
}
