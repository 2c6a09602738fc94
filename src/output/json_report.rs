/*!
 * Structured JSON projections.
 *
 * - Diagnostic edits: one object per scrubbed entry with fractional-second
 *   offsets and the before/after text.
 * - Skip markers: one object per scrubbed entry in whole milliseconds, tagged
 *   with a caller-supplied content identifier.
 * - PlexAutoSkip document: the custom-markers file consumed by the
 *   PlexAutoSkip add-on, built from the merged mute segments.
 */

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::CleanError;
use crate::matcher::MatchedEntry;
use crate::segments::MuteSegment;

/// Action tag carried by every skip marker
pub const SKIP_MARKER_TAG: &str = "volume";

/// Diagnostic record of one scrubbed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEdit {
    /// Entry start in seconds
    pub start: f64,
    /// Entry end in seconds
    pub end: f64,
    pub original: String,
    pub replacement: String,
}

/// Diagnostic records for every scrubbed entry, in input order
pub fn diagnostic_edits(matched: &[MatchedEntry]) -> Vec<DiagnosticEdit> {
    matched
        .iter()
        .filter(|m| m.is_matched())
        .map(|m| DiagnosticEdit {
            start: m.entry.start_time_ms as f64 / 1000.0,
            end: m.entry.end_time_ms as f64 / 1000.0,
            original: m.entry.text.clone(),
            replacement: m.replacement_text.clone(),
        })
        .collect()
}

/// Input and output locations of one artifact kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Full diagnostic document written with `--json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Local time the report was generated (RFC 3339)
    pub now: String,
    pub edits: Vec<DiagnosticEdit>,
    pub media: ArtifactPaths,
    pub subtitles: ArtifactPaths,
}

impl DiagnosticReport {
    pub fn new(edits: Vec<DiagnosticEdit>, media: ArtifactPaths, subtitles: ArtifactPaths) -> Self {
        Self {
            now: chrono::Local::now().to_rfc3339(),
            edits,
            media,
            subtitles,
        }
    }
}

/// One skip marker in the third-party schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipMarker {
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub content_id: String,
    pub tag: String,
}

fn require_content_id(content_id: Option<&str>) -> Result<&str, CleanError> {
    match content_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(CleanError::validation(
            "content_id",
            "skip-marker output requires a content identifier",
        )),
    }
}

/// Skip markers for every scrubbed entry.
///
/// Fails with `CleanError::Validation` when the content identifier is absent
/// or blank.
pub fn skip_markers(matched: &[MatchedEntry], content_id: Option<&str>) -> Result<Vec<SkipMarker>, CleanError> {
    let content_id = require_content_id(content_id)?;

    Ok(matched
        .iter()
        .filter(|m| m.is_matched())
        .map(|m| SkipMarker {
            offset_ms: m.entry.start_time_ms,
            duration_ms: m.entry.duration_ms(),
            content_id: content_id.to_string(),
            tag: SKIP_MARKER_TAG.to_string(),
        })
        .collect())
}

/// Marker entry inside a PlexAutoSkip document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlexMarker {
    pub start: u64,
    pub end: u64,
    pub mode: String,
}

/// Allow/block lists of a PlexAutoSkip document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlexAccessList {
    pub users: Vec<String>,
    pub clients: Vec<String>,
    pub keys: Vec<String>,
}

/// PlexAutoSkip custom-markers document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlexAutoSkipDocument {
    pub markers: BTreeMap<String, Vec<PlexMarker>>,
    pub offsets: BTreeMap<String, serde_json::Value>,
    pub tags: BTreeMap<String, serde_json::Value>,
    pub allowed: PlexAccessList,
    pub blocked: PlexAccessList,
    pub clients: BTreeMap<String, serde_json::Value>,
    pub mode: BTreeMap<String, String>,
}

impl PlexAutoSkipDocument {
    /// Build a document muting every segment for one piece of content
    pub fn from_segments(segments: &[MuteSegment], content_id: Option<&str>) -> Result<Self, CleanError> {
        let content_id = require_content_id(content_id)?;
        let markers = segments
            .iter()
            .map(|s| PlexMarker {
                start: s.start_ms,
                end: s.end_ms,
                mode: SKIP_MARKER_TAG.to_string(),
            })
            .collect();

        let mut document = Self::default();
        document.markers.insert(content_id.to_string(), markers);
        document.mode.insert(content_id.to_string(), SKIP_MARKER_TAG.to_string());
        Ok(document)
    }

    /// Number of markers across all content
    pub fn marker_count(&self) -> usize {
        self.markers.values().map(Vec::len).sum()
    }
}
