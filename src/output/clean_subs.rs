use serde::{Deserialize, Serialize};

use crate::matcher::MatchedEntry;
use crate::subtitle_processor::SubtitleEntry;

/// Which entries end up in the clean subtitle track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleMode {
    /// Only entries that were scrubbed, renumbered from 1
    #[default]
    ScrubOnly,
    /// Every entry, scrubbed where matched
    Full,
}

/// Build the clean subtitle track. Timing is never altered.
pub fn build_clean_subtitles(matched: &[MatchedEntry], mode: SubtitleMode) -> Vec<SubtitleEntry> {
    match mode {
        SubtitleMode::ScrubOnly => matched
            .iter()
            .filter(|m| m.is_matched())
            .enumerate()
            .map(|(i, m)| {
                SubtitleEntry::new(i + 1, m.entry.start_time_ms, m.entry.end_time_ms, m.replacement_text.clone())
            })
            .collect(),
        SubtitleMode::Full => matched
            .iter()
            .map(|m| {
                let mut entry = m.entry.clone();
                if m.is_matched() {
                    entry.text = m.replacement_text.clone();
                }
                entry
            })
            .collect(),
    }
}
