//! Final stage: resolve citation markers in the composed report.

use async_trait::async_trait;
use pipeline::{
    render_citations_with_report, SharedState, Stage, StageFailure, StageName, StageOutput,
    StateKey,
};
use tracing::{info, warn};

/// Renders the text under `input_key` against the run's evidence registry.
///
/// A missing report renders as the empty string, so a run whose composer
/// produced nothing still finishes with a (blank) deliverable.
pub struct CitationRenderer {
    name: StageName,
    input_key: StateKey,
}

impl CitationRenderer {
    pub fn new(name: StageName, input_key: StateKey) -> Self {
        Self { name, input_key }
    }
}

#[async_trait]
impl Stage for CitationRenderer {
    fn name(&self) -> &StageName {
        &self.name
    }

    async fn execute(&self, state: &SharedState) -> Result<StageOutput, StageFailure> {
        let text = state.get_str(&self.input_key).unwrap_or_else(|| {
            warn!(key = %self.input_key, "No report text to render");
            ""
        });

        let (rendered, report) = render_citations_with_report(text, state.evidence());
        info!(
            resolved = report.resolved,
            elided = report.elided.len(),
            sources = state.evidence().len(),
            "Rendered citations"
        );
        Ok(StageOutput::value(rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::web_event;
    use serde_json::json;

    #[tokio::test]
    async fn renders_report_from_state() {
        let mut state = SharedState::new();
        state.commit(
            Some((StateKey::from_static("draft"), json!("Growth <cite source=\"src-1\" />."))),
            &[web_event("https://a.com")],
        );
        let renderer = CitationRenderer::new(
            StageName::from_static("citation_renderer"),
            StateKey::from_static("draft"),
        );

        let output = renderer.execute(&state).await.unwrap();

        assert_eq!(
            output.value,
            Some(json!("Growth [https://a.com](https://a.com)."))
        );
    }

    #[tokio::test]
    async fn missing_report_renders_empty() {
        let renderer = CitationRenderer::new(
            StageName::from_static("citation_renderer"),
            StateKey::from_static("draft"),
        );
        let output = renderer.execute(&SharedState::new()).await.unwrap();
        assert_eq!(output.value, Some(json!("")));
    }
}
