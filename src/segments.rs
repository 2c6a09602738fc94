/*!
 * Mute segment synthesis.
 *
 * Every matched entry contributes its whole duration, widened by the pad, as
 * a candidate interval. Candidates are then merged into the minimal ordered
 * set of disjoint segments.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::CleanError;
use crate::matcher::MatchedEntry;
use crate::subtitle_processor::SubtitleEntry;

/// A time interval to silence, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MuteSegment {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl MuteSegment {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn start_secs(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_secs(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }
}

/// Parameters of a synthesis pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SynthesisOptions {
    /// Padding added before and after every matched entry
    pub pad_ms: u64,
    /// Candidates closer than this are merged; 0 merges only touching ones
    pub merge_epsilon_ms: u64,
    /// End of the media timeline, when the caller knows it
    pub timeline_end_ms: Option<u64>,
}

impl SynthesisOptions {
    pub fn with_pad(pad_ms: u64) -> Self {
        Self { pad_ms, ..Self::default() }
    }
}

/// Verify entries are sorted by start time.
///
/// The sequence is never re-sorted here, so upstream corruption surfaces as
/// an error naming the first offending entry.
pub fn check_ordering(entries: &[SubtitleEntry]) -> Result<(), CleanError> {
    for (index, pair) in entries.windows(2).enumerate() {
        if pair[1].start_time_ms < pair[0].start_time_ms {
            return Err(CleanError::Ordering {
                index: index + 1,
                start_ms: pair[1].start_time_ms,
                previous_start_ms: pair[0].start_time_ms,
            });
        }
    }
    Ok(())
}

/// Derive the mute segments for a whole track
pub fn synthesize(matched: &[MatchedEntry], options: &SynthesisOptions) -> Vec<MuteSegment> {
    let candidates: Vec<MuteSegment> = matched
        .iter()
        .filter(|m| m.is_matched())
        .filter_map(|m| padded_candidate(&m.entry, options))
        .collect();

    let segments = merge_intervals(candidates, options.merge_epsilon_ms);
    debug!("Synthesized {} mute segments from {} matched entries",
        segments.len(),
        matched.iter().filter(|m| m.is_matched()).count());
    segments
}

/// Padded interval of one entry, or `None` when it lies wholly past the timeline end
fn padded_candidate(entry: &SubtitleEntry, options: &SynthesisOptions) -> Option<MuteSegment> {
    let start = entry.start_time_ms.saturating_sub(options.pad_ms);
    let mut end = entry.end_time_ms.saturating_add(options.pad_ms);

    if let Some(limit) = options.timeline_end_ms {
        if start >= limit {
            debug!("Dropping entry at {}ms, past the timeline end {}ms", entry.start_time_ms, limit);
            return None;
        }
        end = end.min(limit);
    }

    Some(MuteSegment::new(start, end))
}

/// Merge intervals into a sorted, disjoint sequence.
///
/// Two intervals merge when the next one starts no later than
/// `current.end + epsilon_ms`.
pub fn merge_intervals(mut candidates: Vec<MuteSegment>, epsilon_ms: u64) -> Vec<MuteSegment> {
    candidates.sort_by_key(|c| (c.start_ms, c.end_ms));

    let mut merged: Vec<MuteSegment> = Vec::with_capacity(candidates.len());
    let mut iter = candidates.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for candidate in iter {
        if candidate.start_ms <= current.end_ms.saturating_add(epsilon_ms) {
            current.end_ms = current.end_ms.max(candidate.end_ms);
        } else {
            merged.push(current);
            current = candidate;
        }
    }
    merged.push(current);

    merged
}
