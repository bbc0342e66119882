//! State keys used by the default research graph.
//!
//! | Key | Written by |
//! |-----|------------|
//! | [`RESEARCH_PLAN`] | caller (initial input) |
//! | [`REPORT_SECTIONS`] | section planner |
//! | [`SECTION_RESEARCH_FINDINGS`] | section researcher, then the refiner |
//! | [`RESEARCH_EVALUATION`] | research evaluator, once per loop iteration |
//! | [`FINAL_CITED_REPORT`] | report composer |
//! | [`FINAL_REPORT_WITH_CITATIONS`] | citation renderer |
//!
//! [`URL_TO_SHORT_ID`] and [`SOURCES`] are not value keys; they name the
//! evidence registry's views in [`crate::SharedState::export`].

pub const RESEARCH_PLAN: &str = "research_plan";
pub const REPORT_SECTIONS: &str = "report_sections";
pub const SECTION_RESEARCH_FINDINGS: &str = "section_research_findings";
pub const RESEARCH_EVALUATION: &str = "research_evaluation";
pub const FINAL_CITED_REPORT: &str = "final_cited_report";
pub const FINAL_REPORT_WITH_CITATIONS: &str = "final_report_with_citations";
pub const URL_TO_SHORT_ID: &str = "url_to_short_id";
pub const SOURCES: &str = "sources";

