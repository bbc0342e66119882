//! Decides whether a refinement loop has done enough.

use tracing::warn;

use crate::{Escalation, EvaluationResult, SharedState, StateKey};

/// Returns [`Escalation::Escalate`] iff the evaluation stored under `key`
/// exists and grades the research as passing.
///
/// An entry that is not a valid [`EvaluationResult`] counts as missing.
pub fn check(state: &SharedState, key: &StateKey) -> Escalation {
    match state.get_as::<EvaluationResult>(key) {
        Some(Ok(evaluation)) if evaluation.is_pass() => Escalation::Escalate,
        Some(Ok(_)) | None => Escalation::Continue,
        Some(Err(err)) => {
            warn!(key = %key, error = %err, "Evaluation is not readable; treating as missing");
            Escalation::Continue
        }
    }
}
