/*!
 * Pipeline coordinator.
 *
 * `CleanOptions` is the loose, user-facing set of switches (CLI flags and
 * config file values). `CleanOptions::normalize` resolves every implication
 * between them exactly once and rejects invalid combinations, producing the
 * canonical `ProcessingPlan` that the rest of the run consumes.
 *
 * A `Pipeline` pairs a plan with a compiled matcher. It holds no per-run
 * state and can process any number of subtitle tracks.
 */

use std::fmt;

use log::{info, warn};

use crate::dictionary::RuleSet;
use crate::errors::CleanError;
use crate::matcher::{MatchedEntry, Matcher, DEFAULT_MASK_CHAR};
use crate::output::{
    build_clean_subtitles, diagnostic_edits, mute_instructions, skip_markers, write_edl, DiagnosticEdit,
    MuteInstruction, PlexAutoSkipDocument, SkipMarker, SubtitleMode,
};
use crate::segments::{check_ordering, synthesize, MuteSegment, SynthesisOptions};
use crate::subtitle_processor::SubtitleEntry;

/// Raw processing switches before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOptions {
    pub pad_secs: f64,
    pub mask_char: char,
    pub merge_epsilon_ms: u64,
    /// Media duration, when known, used to clamp segment ends
    pub timeline_end_ms: Option<u64>,
    pub full_subs: bool,
    pub subs_only: bool,
    pub edl: bool,
    pub json: bool,
    pub skip_markers: bool,
    pub plex_auto_skip: bool,
    pub content_id: Option<String>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            pad_secs: 0.0,
            mask_char: DEFAULT_MASK_CHAR,
            merge_epsilon_ms: 0,
            timeline_end_ms: None,
            full_subs: false,
            subs_only: false,
            edl: false,
            json: false,
            skip_markers: false,
            plex_auto_skip: false,
            content_id: None,
        }
    }
}

/// Whether the run ends with a re-muxed, muted video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Only subtitle-derived artifacts are produced
    SubsOnly,
    /// Mute instructions are handed to the transcoder as well
    FullProcessing,
}

/// Artifacts requested on top of the clean subtitles and mute instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestedOutputs {
    pub edl: bool,
    pub diagnostics: bool,
    pub skip_markers: bool,
    pub plex_document: bool,
}

/// Canonical, validated configuration of a run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingPlan {
    pub subtitle_mode: SubtitleMode,
    pub processing: ProcessingMode,
    pub synthesis: SynthesisOptions,
    pub mask_char: char,
    pub outputs: RequestedOutputs,
    pub content_id: Option<String>,
}

impl ProcessingPlan {
    pub fn is_subs_only(&self) -> bool {
        self.processing == ProcessingMode::SubsOnly
    }
}

impl CleanOptions {
    /// Resolve implications and validate.
    ///
    /// EDL, skip-marker and PlexAutoSkip output each imply subs-only
    /// processing. Skip-marker and PlexAutoSkip output need a content id.
    pub fn normalize(&self) -> Result<ProcessingPlan, CleanError> {
        if !self.pad_secs.is_finite() || self.pad_secs < 0.0 {
            return Err(CleanError::validation(
                "pad",
                format!("must be a non-negative number of seconds, got {}", self.pad_secs),
            ));
        }

        if self.mask_char.is_whitespace() || self.mask_char.is_control() {
            return Err(CleanError::validation(
                "mask_char",
                format!("must be a visible character, got {:?}", self.mask_char),
            ));
        }

        let content_id = self
            .content_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let needs_content_id = self.skip_markers || self.plex_auto_skip;
        if needs_content_id && content_id.is_none() {
            return Err(CleanError::validation(
                "content_id",
                "skip-marker and PlexAutoSkip output require a content identifier",
            ));
        }

        let subs_only = self.subs_only || self.edl || needs_content_id;

        Ok(ProcessingPlan {
            subtitle_mode: if self.full_subs { SubtitleMode::Full } else { SubtitleMode::ScrubOnly },
            processing: if subs_only { ProcessingMode::SubsOnly } else { ProcessingMode::FullProcessing },
            synthesis: SynthesisOptions {
                pad_ms: (self.pad_secs * 1000.0).round() as u64,
                merge_epsilon_ms: self.merge_epsilon_ms,
                timeline_end_ms: self.timeline_end_ms,
            },
            mask_char: self.mask_char,
            outputs: RequestedOutputs {
                edl: self.edl,
                diagnostics: self.json,
                skip_markers: self.skip_markers,
                plex_document: self.plex_auto_skip,
            },
            content_id,
        })
    }
}

/// Non-fatal outcome worth reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineWarning {
    /// No rule matched, nothing to mute
    EmptyResult,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::EmptyResult => write!(f, "no profanity found, nothing to mute"),
        }
    }
}

/// Everything a run derives from one subtitle track
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub matched: Vec<MatchedEntry>,
    pub segments: Vec<MuteSegment>,
    pub clean_subtitles: Vec<SubtitleEntry>,
    pub mute_instructions: Vec<MuteInstruction>,
    pub edl: Option<String>,
    pub diagnostics: Option<Vec<DiagnosticEdit>>,
    pub skip_markers: Option<Vec<SkipMarker>>,
    pub plex_document: Option<PlexAutoSkipDocument>,
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineOutput {
    /// Number of entries with at least one match
    pub fn matched_count(&self) -> usize {
        self.matched.iter().filter(|m| m.is_matched()).count()
    }

    pub fn is_empty_result(&self) -> bool {
        self.warnings.contains(&PipelineWarning::EmptyResult)
    }
}

/// Runs matching, synthesis and every requested projection
#[derive(Debug, Clone)]
pub struct Pipeline {
    matcher: Matcher,
    plan: ProcessingPlan,
}

impl Pipeline {
    pub fn new(rules: &RuleSet, plan: ProcessingPlan) -> Self {
        Self {
            matcher: Matcher::new(rules, plan.mask_char),
            plan,
        }
    }

    pub fn plan(&self) -> &ProcessingPlan {
        &self.plan
    }

    /// Process one subtitle track.
    ///
    /// Fails with `CleanError::Ordering` when entries are not sorted by start
    /// and with `CleanError::Validation` when a requested projection cannot
    /// be produced. Nothing is returned on failure.
    pub fn run(&self, entries: &[SubtitleEntry]) -> Result<PipelineOutput, CleanError> {
        self.run_until(entries, self.plan.synthesis.timeline_end_ms)
    }

    /// Like `run`, clamping segment ends to `timeline_end_ms` instead of the plan's value
    pub fn run_until(&self, entries: &[SubtitleEntry], timeline_end_ms: Option<u64>) -> Result<PipelineOutput, CleanError> {
        check_ordering(entries)?;

        let matched = self.matcher.match_entries(entries);
        let synthesis = SynthesisOptions { timeline_end_ms, ..self.plan.synthesis };
        let segments = synthesize(&matched, &synthesis);
        let outputs = self.plan.outputs;
        let content_id = self.plan.content_id.as_deref();

        let markers = if outputs.skip_markers {
            Some(skip_markers(&matched, content_id)?)
        } else {
            None
        };
        let plex_document = if outputs.plex_document {
            Some(PlexAutoSkipDocument::from_segments(&segments, content_id)?)
        } else {
            None
        };

        let mut warnings = Vec::new();
        if segments.is_empty() {
            warn!("{}", PipelineWarning::EmptyResult);
            warnings.push(PipelineWarning::EmptyResult);
        }

        let output = PipelineOutput {
            clean_subtitles: build_clean_subtitles(&matched, self.plan.subtitle_mode),
            mute_instructions: mute_instructions(&segments),
            edl: outputs.edl.then(|| write_edl(&segments)),
            diagnostics: outputs.diagnostics.then(|| diagnostic_edits(&matched)),
            skip_markers: markers,
            plex_document,
            warnings,
            matched,
            segments,
        };

        info!(
            "Scrubbed {} of {} entries into {} mute segments",
            output.matched_count(),
            entries.len(),
            output.segments.len()
        );

        Ok(output)
    }
}
