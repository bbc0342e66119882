//! Stage doubles shared by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pipeline::{
    EvaluationResult, Grade, GroundingEvent, SharedState, Stage, StageFailure, StageName,
    StageOutput,
};
use serde_json::{json, Value};

pub(crate) fn name(value: &'static str) -> StageName {
    StageName::from_static(value)
}

pub(crate) fn web_event(url: &str) -> GroundingEvent {
    serde_json::from_value(json!({
        "groundingChunks": [{"web": {"uri": url, "title": url, "domain": "example.com"}}],
        "groundingSupports": [{"segment": {"text": "supported"}, "groundingChunkIndices": [0]}]
    }))
    .expect("fixture event deserialises")
}

/// Returns the same value (and events) on every call.
pub(crate) struct FixedStage {
    name: StageName,
    value: Value,
    events: Vec<GroundingEvent>,
}

impl FixedStage {
    pub(crate) fn new(stage: &'static str, value: Value) -> Self {
        Self {
            name: name(stage),
            value,
            events: Vec::new(),
        }
    }

    pub(crate) fn with_source(mut self, url: &str) -> Self {
        self.events.push(web_event(url));
        self
    }
}

#[async_trait]
impl Stage for FixedStage {
    fn name(&self) -> &StageName {
        &self.name
    }

    async fn execute(&self, _state: &SharedState) -> Result<StageOutput, StageFailure> {
        Ok(StageOutput::value(self.value.clone()).with_events(self.events.clone()))
    }
}

/// Always raises.
pub(crate) struct FailingStage {
    name: StageName,
    message: String,
}

impl FailingStage {
    pub(crate) fn new(stage: &'static str, message: &str) -> Self {
        Self {
            name: name(stage),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &StageName {
        &self.name
    }

    async fn execute(&self, _state: &SharedState) -> Result<StageOutput, StageFailure> {
        Err(StageFailure::new(self.message.clone()))
    }
}

/// Grades the research according to a fixed schedule; the last grade
/// repeats once the schedule runs out.
pub(crate) struct GradingStage {
    name: StageName,
    schedule: Vec<Grade>,
    calls: AtomicUsize,
}

impl GradingStage {
    pub(crate) fn new(stage: &'static str, schedule: Vec<Grade>) -> Self {
        Self {
            name: name(stage),
            schedule,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Stage for GradingStage {
    fn name(&self) -> &StageName {
        &self.name
    }

    async fn execute(&self, _state: &SharedState) -> Result<StageOutput, StageFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let grade = self
            .schedule
            .get(call)
            .or_else(|| self.schedule.last())
            .copied()
            .unwrap_or(Grade::Fail);
        let evaluation = EvaluationResult {
            grade,
            comment: format!("evaluation {}", call + 1),
            follow_up_queries: None,
        };
        let value = serde_json::to_value(evaluation).map_err(|e| StageFailure::new(e.to_string()))?;
        Ok(StageOutput::value(value))
    }
}
