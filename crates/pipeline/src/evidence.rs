//! Run-wide registry of cited sources.
//!
//! The registry deduplicates web sources by URL across every grounding event a
//! run produces and accumulates the claims each source supports. It only
//! grows: sources are never removed and claims are never rewritten.
//!
//! Short ids are handed out in first-seen order over the whole sequence of
//! ingested events, so ingestion order must follow stage-invocation order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{Confidence, GroundingEvent, ShortId, WebReference};

/// A statement in generated text that a source backs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// The supported text segment; empty when the support carried none.
    pub text_segment: String,
    pub confidence: Confidence,
}

/// A deduplicated web source and everything it has been cited for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSource {
    pub short_id: ShortId,
    pub title: String,
    pub url: String,
    pub domain: String,
    /// Claims in the order they were ingested.
    pub supported_claims: Vec<Claim>,
}

impl EvidenceSource {
    /// Text to show for a link to this source: the title, else the domain,
    /// else the short id.
    pub fn display_text(&self) -> String {
        if !self.title.is_empty() {
            self.title.clone()
        } else if !self.domain.is_empty() {
            self.domain.clone()
        } else {
            self.short_id.to_string()
        }
    }
}

/// Counts of what one [`EvidenceRegistry::ingest`] call added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub events: usize,
    pub new_sources: usize,
    pub claims_appended: usize,
}

/// The URL index and source map accumulated over one run.
#[derive(Debug, Clone)]
pub struct EvidenceRegistry {
    url_index: HashMap<String, ShortId>,
    sources: BTreeMap<ShortId, EvidenceSource>,
    next_id: ShortId,
}

impl Default for EvidenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceRegistry {
    /// Creates an empty registry; the first new URL will be `src-1`.
    pub fn new() -> Self {
        Self {
            url_index: HashMap::new(),
            sources: BTreeMap::new(),
            next_id: ShortId::FIRST,
        }
    }

    /// Folds a batch of grounding events into the registry, in order.
    ///
    /// Each event must be ingested exactly once: ingesting the same event
    /// again appends its claims a second time.
    pub fn ingest<'a, I>(&mut self, events: I) -> IngestSummary
    where
        I: IntoIterator<Item = &'a GroundingEvent>,
    {
        let mut summary = IngestSummary::default();
        for event in events {
            self.ingest_event(event, &mut summary);
        }
        debug!(
            events = summary.events,
            new_sources = summary.new_sources,
            claims_appended = summary.claims_appended,
            total_sources = self.sources.len(),
            "Ingested grounding events"
        );
        summary
    }

    fn ingest_event(&mut self, event: &GroundingEvent, summary: &mut IngestSummary) {
        summary.events += 1;

        // Chunk positions are only meaningful inside this event.
        let chunk_ids: Vec<Option<ShortId>> = event
            .grounding_chunks
            .iter()
            .map(|chunk| {
                let web = chunk.web.as_ref()?;
                let url = web.uri.as_deref().filter(|uri| !uri.is_empty())?;
                Some(self.register(url, web, summary))
            })
            .collect();

        for support in &event.grounding_supports {
            let indices = support.grounding_chunk_indices.as_deref().unwrap_or_default();
            let scores = support.confidence_scores.as_deref().unwrap_or_default();
            let text_segment = support
                .segment
                .as_ref()
                .and_then(|segment| segment.text.clone())
                .unwrap_or_default();

            for (position, &index) in indices.iter().enumerate() {
                let Some(short_id) = usize::try_from(index)
                    .ok()
                    .and_then(|i| chunk_ids.get(i).copied().flatten())
                else {
                    continue;
                };
                let confidence = scores
                    .get(position)
                    .copied()
                    .flatten()
                    .and_then(Confidence::new)
                    .unwrap_or_default();

                if let Some(source) = self.sources.get_mut(&short_id) {
                    source.supported_claims.push(Claim {
                        text_segment: text_segment.clone(),
                        confidence,
                    });
                    summary.claims_appended += 1;
                }
            }
        }
    }

    fn register(&mut self, url: &str, web: &WebReference, summary: &mut IngestSummary) -> ShortId {
        if let Some(&short_id) = self.url_index.get(url) {
            return short_id;
        }

        let short_id = self.next_id;
        self.next_id = short_id.next();

        let domain = web.domain.clone().unwrap_or_default();
        // A title identical to the domain carries no extra information.
        let title = match web.title.as_deref() {
            Some(title) if title != domain => title.to_string(),
            Some(_) => domain.clone(),
            None => String::new(),
        };

        self.url_index.insert(url.to_string(), short_id);
        self.sources.insert(
            short_id,
            EvidenceSource {
                short_id,
                title,
                url: url.to_string(),
                domain,
                supported_claims: Vec::new(),
            },
        );
        summary.new_sources += 1;
        short_id
    }

    /// Looks up a source by short id.
    pub fn get(&self, short_id: &ShortId) -> Option<&EvidenceSource> {
        self.sources.get(short_id)
    }

    /// Returns the short id assigned to `url`, if it has been seen.
    pub fn short_id_for(&self, url: &str) -> Option<ShortId> {
        self.url_index.get(url).copied()
    }

    /// Iterates sources in short-id (first-seen) order.
    pub fn sources(&self) -> impl Iterator<Item = &EvidenceSource> {
        self.sources.values()
    }

    /// Iterates `(url, short id)` pairs in first-seen order.
    pub fn url_index(&self) -> impl Iterator<Item = (&str, ShortId)> {
        self.sources
            .values()
            .map(|source| (source.url.as_str(), source.short_id))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// JSON object mapping URL to short id.
    pub fn url_index_json(&self) -> Value {
        Value::Object(
            self.url_index()
                .map(|(url, short_id)| (url.to_string(), Value::String(short_id.to_string())))
                .collect(),
        )
    }

    /// JSON object mapping short id to source.
    pub fn sources_json(&self) -> Value {
        Value::Object(
            self.sources()
                .map(|source| {
                    let value = serde_json::to_value(source).unwrap_or(Value::Null);
                    (source.short_id.to_string(), value)
                })
                .collect(),
        )
    }
}
