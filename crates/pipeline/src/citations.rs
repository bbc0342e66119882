//! Rewrites inline `<cite source="src-N" />` markers into Markdown links.
//!
//! Marker grammar (ASCII):
//!
//! ```text
//! <cite source = "src-<digits>" />
//! ```
//!
//! The quote may be `"` or `'` or absent, whitespace is tolerated around `=`,
//! inside the quotes and before `/>`. Spaces or tabs directly in front of a
//! marker belong to it, so a resolved marker reads `word [Title](url)` and an
//! elided one leaves no gap. Text that only resembles a marker is left alone.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{EvidenceRegistry, ShortId};

static CITE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[ \t]*<cite\s+source\s*=\s*["']?\s*(src-[0-9]+)\s*["']?\s*/>"#)
        .expect("citation marker pattern compiles")
});

static SPACE_BEFORE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,;:])").expect("punctuation pattern compiles"));

/// What [`render_citations_with_report`] did to a text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderReport {
    /// Markers replaced by a link.
    pub resolved: usize,
    /// Ids of markers that named no known source and were removed.
    pub elided: Vec<String>,
}

/// Replaces every citation marker in `text` with a link to its source.
///
/// Markers naming an unknown id are removed with a warning. Whitespace before
/// `.`, `,`, `;` and `:` is then dropped to repair the spacing left behind.
pub fn render_citations(text: &str, registry: &EvidenceRegistry) -> String {
    render_citations_with_report(text, registry).0
}

/// Same as [`render_citations`], also reporting resolved and elided markers.
pub fn render_citations_with_report(
    text: &str,
    registry: &EvidenceRegistry,
) -> (String, RenderReport) {
    let mut report = RenderReport::default();

    let replaced = CITE_MARKER.replace_all(text, |caps: &Captures<'_>| {
        let id = &caps[1];
        let source = id
            .parse::<ShortId>()
            .ok()
            .and_then(|short_id| registry.get(&short_id));
        match source {
            Some(source) => {
                report.resolved += 1;
                format!(" [{}]({})", source.display_text(), source.url)
            }
            None => {
                warn!(marker = caps[0].trim(), "Citation references unknown source; removed");
                report.elided.push(id.to_string());
                String::new()
            }
        }
    });

    let cleaned = SPACE_BEFORE_PUNCTUATION
        .replace_all(&replaced, "$1")
        .into_owned();
    (cleaned, report)
}
