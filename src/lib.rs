/*!
 * # cleansubs - subtitle-driven profanity muting
 *
 * A Rust library that scrubs profanity from a subtitle track and derives the
 * audio regions to mute from the scrubbed entries' timings.
 *
 * ## Features
 *
 * - Line-oriented rule files with optional replacements (`phrase => word`)
 * - Whole-token, longest-first phrase matching with per-token masking
 * - Padded, merged mute segments
 * - Clean SRT, MPlayer EDL, diagnostic JSON, skip markers and PlexAutoSkip output
 * - Subtitle extraction and audio muting through ffmpeg/ffprobe
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `dictionary`: Rule file loading
 * - `matcher`: Phrase matching and text scrubbing
 * - `segments`: Mute interval synthesis and merging
 * - `output`: Projections of a run (clean subtitles, EDL, JSON documents)
 * - `pipeline`: Option normalization and the end-to-end cleaning run
 * - `subtitle_processor`: SRT parsing and writing
 * - `media`: ffmpeg/ffprobe collaborators
 * - `file_utils`: File system operations and atomic artifact writing
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod dictionary;
pub mod errors;
pub mod file_utils;
pub mod matcher;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod segments;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use dictionary::{load_rules, parse_rules, Rule, RuleSet};
pub use errors::{AppError, CleanError, MediaError};
pub use matcher::{MatchSpan, MatchedEntry, Matcher};
pub use media::language_codes_match;
pub use pipeline::{CleanOptions, Pipeline, PipelineOutput, PipelineWarning, ProcessingPlan};
pub use segments::{merge_intervals, synthesize, MuteSegment};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
