//! The run-wide key/value store every stage reads from.
//!
//! A [`SharedState`] lives for exactly one pipeline run. Stages receive it by
//! shared reference; only the executor holds it mutably, and it commits a
//! stage's output in one step after the stage has returned. There is never
//! more than one writer, so no locking is involved.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{keys, EvidenceRegistry, GroundingEvent, IngestSummary, StateKey};

/// Key-indexed values plus the evidence registry for one run.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    values: BTreeMap<StateKey, Value>,
    evidence: EvidenceRegistry,
}

impl SharedState {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value under `key`.
    pub fn get(&self, key: &StateKey) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the string under `key`, or `None` if absent or not a string.
    pub fn get_str(&self, key: &StateKey) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Deserialises the value under `key`.
    ///
    /// `None` when the key is absent; `Some(Err(_))` when it holds something
    /// that is not a `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &StateKey) -> Option<serde_json::Result<T>> {
        self.values
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates the value keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.values.keys()
    }

    /// Writes `value` under `key`, replacing any previous value.
    pub fn insert(&mut self, key: StateKey, value: Value) -> Option<Value> {
        self.values.insert(key, value)
    }

    pub fn evidence(&self) -> &EvidenceRegistry {
        &self.evidence
    }

    /// Commits one stage's result: its output value (if the stage has an
    /// output key) and its grounding events, in that order.
    ///
    /// Callers only invoke this after the stage succeeded, so a failed stage
    /// leaves no trace in the store.
    pub fn commit(
        &mut self,
        output: Option<(StateKey, Value)>,
        events: &[GroundingEvent],
    ) -> IngestSummary {
        if let Some((key, value)) = output {
            self.values.insert(key, value);
        }
        self.evidence.ingest(events)
    }

    /// Snapshot of everything a caller may depend on after a run: every value
    /// key, plus the URL index and the source map.
    pub fn export(&self) -> Value {
        let mut map: Map<String, Value> = self
            .values
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        map.insert(keys::URL_TO_SHORT_ID.to_string(), self.evidence.url_index_json());
        map.insert(keys::SOURCES.to_string(), self.evidence.sources_json());
        Value::Object(map)
    }
}
