//! Core orchestration domain for Groundwork.
//!
//! This crate holds the bookkeeping a research run relies on: the evidence
//! registry that deduplicates cited sources across every stage invocation, the
//! renderer that turns inline citation markers into links, the run-wide shared
//! state, and the [`Stage`] port worker stages implement. Step composition
//! (sequencing and bounded refinement loops) lives in the `nodes` crate.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a stage must return; infrastructure decides *how* the
//! text and grounding metadata are produced.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ShortId`, `StageName`, `StateKey`, `PipelineRunId`) |
//! | [`types`] | Value types (`Confidence`, `IterationBudget`, `EvaluationResult`, `Timestamp`) |
//! | [`grounding`] | Wire shape of grounding metadata |
//! | [`evidence`] | The evidence registry |
//! | [`citations`] | Citation marker rendering |
//! | [`state`] | Run-wide shared state |
//! | [`keys`] | State keys of the default research graph |
//! | [`stage`] | The `Stage` port |
//! | [`escalation`] | The loop-termination predicate |
//! | [`errors`] | Stage and pipeline errors |

pub mod citations;
pub mod errors;
pub mod escalation;
pub mod evidence;
pub mod grounding;
pub mod identifiers;
pub mod keys;
pub mod stage;
pub mod state;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use citations::{render_citations, render_citations_with_report, RenderReport};
pub use errors::{PipelineError, StageFailure};
pub use evidence::{Claim, EvidenceRegistry, EvidenceSource, IngestSummary};
pub use grounding::{GroundingChunk, GroundingEvent, GroundingSupport, Segment, WebReference};
pub use identifiers::{ParseShortIdError, PipelineRunId, ShortId, StageName, StateKey};
pub use stage::{Escalation, Stage, StageOutput};
pub use state::SharedState;
pub use types::{Confidence, EvaluationResult, Grade, IterationBudget, SearchQuery, Timestamp};
