//! Shared value types for the Groundwork pipeline domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. confidences are in `[0.0, 1.0]`,
//! iteration budgets are at least one) and participate in domain computations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Score types
// ---------------------------------------------------------------------------

/// Confidence that a source supports a claim, in the range `[0.0, 1.0]`.
///
/// Read positionally from a grounding support's `confidenceScores`. When the
/// score is missing or unusable, [`Confidence::DEFAULT`] is recorded instead.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Confidence recorded when no usable score accompanies a chunk reference.
    pub const DEFAULT: Confidence = Confidence(0.5);

    /// Creates a [`Confidence`], returning `None` if `value` is outside
    /// the valid range `[0.0, 1.0]`.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the confidence as an `f64` in `[0.0, 1.0]`.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("confidence {value} is outside [0, 1]"))
    }
}

impl From<Confidence> for f64 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

/// Maximum number of iterations a refinement loop may run.
///
/// Always at least one: a loop that may never run is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IterationBudget(u32);

impl IterationBudget {
    /// Creates an [`IterationBudget`], returning `None` for zero.
    #[must_use]
    pub fn new(limit: u32) -> Option<Self> {
        (limit > 0).then_some(Self(limit))
    }

    /// Returns the iteration limit.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for IterationBudget {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "iteration budget must be at least 1".to_string())
    }
}

impl From<IterationBudget> for u32 {
    fn from(value: IterationBudget) -> Self {
        value.0
    }
}

impl std::fmt::Display for IterationBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Verdict the evaluator stage hands down for the current research set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// The research is sufficient; the refinement loop may stop.
    Pass,
    /// The research needs another refinement pass.
    Fail,
}

/// One targeted follow-up query proposed by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The query text, ready to hand to a search tool.
    pub search_query: String,
}

/// Structured output of the evaluator stage.
///
/// Produced once per loop iteration and stored under
/// [`crate::keys::RESEARCH_EVALUATION`], replacing the previous iteration's
/// result. Never accumulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Pass or fail.
    pub grade: Grade,

    /// Explanation of the verdict.
    pub comment: String,

    /// Queries the refiner should run to close gaps. Expected to be empty or
    /// absent when `grade` is [`Grade::Pass`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_queries: Option<Vec<SearchQuery>>,
}

impl EvaluationResult {
    /// Returns `true` if the evaluator graded the research as sufficient.
    pub fn is_pass(&self) -> bool {
        self.grade == Grade::Pass
    }

    /// Iterates the follow-up query strings, if any.
    pub fn follow_up_queries(&self) -> impl Iterator<Item = &str> {
        self.follow_up_queries
            .iter()
            .flatten()
            .map(|q| q.search_query.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
