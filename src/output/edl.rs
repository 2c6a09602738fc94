/*!
 * MPlayer edit decision list output.
 *
 * One line per mute segment: `<start>\t<end>\t1`, times in seconds with
 * three decimals, `1` being the EDL mute action.
 */

use anyhow::{anyhow, Context, Result};

use crate::segments::MuteSegment;

/// EDL action code for muting audio
pub const EDL_MUTE_ACTION: u8 = 1;

/// Milliseconds as seconds with exactly three decimals
pub(crate) fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Render segments as EDL text. Empty input renders as an empty string.
pub fn write_edl(segments: &[MuteSegment]) -> String {
    segments
        .iter()
        .map(|s| format!("{}\t{}\t{}\n", format_seconds(s.start_ms), format_seconds(s.end_ms), EDL_MUTE_ACTION))
        .collect()
}

/// Read EDL text back into mute segments, rounding to whole milliseconds
pub fn parse_edl(content: &str) -> Result<Vec<MuteSegment>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(anyhow!("EDL line {} has {} fields, expected 3", idx + 1, fields.len()));
            }
            let start: f64 = fields[0].parse().with_context(|| format!("Bad start on EDL line {}", idx + 1))?;
            let end: f64 = fields[1].parse().with_context(|| format!("Bad end on EDL line {}", idx + 1))?;
            Ok(MuteSegment::new((start * 1000.0).round() as u64, (end * 1000.0).round() as u64))
        })
        .collect()
}
