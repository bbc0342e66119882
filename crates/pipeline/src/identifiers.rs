//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`StageName`] with a [`StateKey`] even though both are strings under the
//! hood.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Creates an identifier from a compile-time constant.
            ///
            /// # Panics
            ///
            /// Panics if `value` is empty.
            pub fn from_static(value: &'static str) -> Self {
                assert!(!value.is_empty(), concat!(stringify!($name), " must not be empty"));
                Self(value.to_string())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (graph wiring)
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a stage, loop, or sequencer by its configured name.
    ///
    /// Names appear in spans, the run journal, and replay transcripts. They are
    /// not required to be unique, but the default research graph keeps them so.
    StageName
}

string_id! {
    /// Names one entry of the run-wide [`crate::SharedState`].
    ///
    /// Each stage node writes at most one key; see [`crate::keys`] for the keys
    /// the default research graph uses.
    StateKey
}

// ---------------------------------------------------------------------------
// Short source identifiers
// ---------------------------------------------------------------------------

/// Sequential identifier assigned to a source URL on first sighting.
///
/// Renders as `src-<n>` with `n >= 1`. The numeric part is kept so ids sort in
/// assignment order rather than lexically (`src-10` after `src-9`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShortId(u32);

impl ShortId {
    /// Textual prefix shared by every short id.
    pub const PREFIX: &'static str = "src-";

    /// The first id handed out in a run.
    pub const FIRST: ShortId = ShortId(1);

    /// Creates the short id for sequence number `n`.
    ///
    /// Returns `None` for `0`; numbering starts at 1.
    pub fn new(n: u32) -> Option<Self> {
        (n > 0).then_some(Self(n))
    }

    /// Returns the sequence number.
    pub fn sequence(self) -> u32 {
        self.0
    }

    /// Returns the id allocated after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

/// Error returned when text is not of the form `src-<digits>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a short source id (expected src-<n>)")]
pub struct ParseShortIdError(String);

impl FromStr for ShortId {
    type Err = ParseShortIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(Self::PREFIX)
            // Assigned ids never carry a leading zero, so `src-01` names no source.
            .filter(|digits| {
                !digits.is_empty()
                    && !digits.starts_with('0')
                    && digits.bytes().all(|b| b.is_ascii_digit())
            })
            .and_then(|digits| digits.parse::<u32>().ok())
            .and_then(Self::new)
            .ok_or_else(|| ParseShortIdError(s.to_string()))
    }
}

impl Serialize for ShortId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShortId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline execution run.
///
/// Generated fresh for every run; propagated through spans and the run journal
/// so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineRunId(Uuid);

impl PipelineRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PipelineRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
