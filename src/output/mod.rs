/*!
 * Output projections of a cleaning run.
 *
 * Each projection is a pure function over the matched entries and/or the
 * synthesized mute segments. None depends on another's output.
 *
 * # Architecture
 *
 * - `clean_subs`: clean subtitle track (scrub-only or full)
 * - `mute_filter`: silence instructions for the transcoding collaborator
 * - `edl`: MPlayer edit decision list
 * - `json_report`: diagnostic JSON, skip markers and PlexAutoSkip documents
 */

pub mod clean_subs;
pub mod mute_filter;
pub mod edl;
pub mod json_report;

pub use clean_subs::{build_clean_subtitles, SubtitleMode};
pub use mute_filter::{mute_instructions, MuteAction, MuteInstruction};
pub use edl::{parse_edl, write_edl, EDL_MUTE_ACTION};
pub use json_report::{
    diagnostic_edits, skip_markers, DiagnosticEdit, DiagnosticReport, PlexAutoSkipDocument, SkipMarker,
    SKIP_MARKER_TAG,
};
