//! Wire shape of the grounding metadata attached to a worker stage's output.
//!
//! Every field is optional on the wire. Missing collections deserialise as
//! empty, missing scalars as `None`; the evidence registry decides what an
//! absent value means.

use serde::{Deserialize, Serialize};

/// Evidentiary metadata emitted by one stage invocation.
///
/// Chunk indices in [`GroundingSupport::grounding_chunk_indices`] refer to
/// positions in this event's own [`GroundingEvent::grounding_chunks`]; they are
/// not stable across events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroundingEvent {
    /// Retrieved documents, in the order the provider returned them.
    pub grounding_chunks: Vec<GroundingChunk>,

    /// Claims in the generated text and the chunks that back them.
    pub grounding_supports: Vec<GroundingSupport>,
}

impl GroundingEvent {
    /// Returns `true` when the event carries no chunks and no supports.
    pub fn is_empty(&self) -> bool {
        self.grounding_chunks.is_empty() && self.grounding_supports.is_empty()
    }
}

/// One retrieved document. Only web chunks carry a citable URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroundingChunk {
    pub web: Option<WebReference>,
}

/// A web page that grounded part of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebReference {
    pub uri: Option<String>,
    pub title: Option<String>,
    pub domain: Option<String>,
}

/// Links a segment of generated text to the chunks that support it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroundingSupport {
    pub segment: Option<Segment>,

    /// Scores aligned by position with `grounding_chunk_indices`. May be
    /// shorter than the index list, absent, or hold `null` entries.
    pub confidence_scores: Option<Vec<Option<f64>>>,

    pub grounding_chunk_indices: Option<Vec<i64>>,
}

/// A span of generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    pub text: Option<String>,
}
