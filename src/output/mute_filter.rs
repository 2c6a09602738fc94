use serde::{Deserialize, Serialize};

use crate::segments::MuteSegment;

/// What the transcoder should do over an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuteAction {
    Silence,
}

/// One declarative instruction for the transcoding collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteInstruction {
    pub start_ms: u64,
    pub end_ms: u64,
    pub action: MuteAction,
}

/// Project segments into silence instructions, preserving their order
pub fn mute_instructions(segments: &[MuteSegment]) -> Vec<MuteInstruction> {
    segments
        .iter()
        .map(|s| MuteInstruction {
            start_ms: s.start_ms,
            end_ms: s.end_ms,
            action: MuteAction::Silence,
        })
        .collect()
}
