//! Groundwork step composition and execution.
//!
//! This crate turns [`pipeline::Stage`] implementations into a runnable graph:
//! [`StageNode`] commits one stage's output, [`RefinementLoop`] repeats
//! sub-steps under an iteration budget, [`Sequencer`] runs steps once each in
//! order, and [`PipelineExecutor`] owns a run from empty state to delivered
//! artefacts. All of them share the [`Step`] contract and nest freely.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Nodes sequence calls between business logic in the
//! [`pipeline`] crate and the worker stages supplied by the caller. They
//! contain no domain rules of their own: escalation, ingestion and citation
//! rendering are all delegated to [`pipeline`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`step`] | `Step` trait, `PipelineRun`, run journal |
//! | [`node`] | `StageNode` |
//! | [`escalation`] | `EscalationChecker` stage |
//! | [`refinement`] | `RefinementLoop` |
//! | [`sequencer`] | `Sequencer` |
//! | [`finalize`] | `CitationRenderer` stage |
//! | [`executor`] | `PipelineExecutor`, `RunArtifacts` |
//! | [`research`] | The default research graph |
//! | [`replay`] | Scripted stages and transcripts |

pub mod escalation;
pub mod executor;
pub mod finalize;
pub mod node;
pub mod refinement;
pub mod replay;
pub mod research;
pub mod sequencer;
pub mod step;

#[cfg(test)]
pub(crate) mod testing;

pub use escalation::EscalationChecker;
pub use executor::{PipelineExecutor, RunArtifacts};
pub use finalize::CitationRenderer;
pub use node::StageNode;
pub use refinement::RefinementLoop;
pub use replay::{ScriptedResponse, ScriptedStage, Transcript};
pub use research::{research_pipeline, ResearchWorkers};
pub use sequencer::Sequencer;
pub use step::{LoopOutcome, LoopRecord, PipelineRun, RunJournal, StageRecord, Step};
