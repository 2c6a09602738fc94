/*!
 * End-to-end runs of the cleaning pipeline on in-memory tracks
 */

use cleansubs::dictionary::{parse_rules, RuleSet};
use cleansubs::errors::CleanError;
use cleansubs::output::{parse_edl, SubtitleMode};
use cleansubs::pipeline::{CleanOptions, Pipeline, ProcessingMode};
use cleansubs::segments::MuteSegment;
use crate::common;

fn scenario_options() -> CleanOptions {
    CleanOptions {
        pad_secs: 0.5,
        edl: true,
        json: true,
        skip_markers: true,
        plex_auto_skip: true,
        content_id: Some(" 4242 ".to_string()),
        ..CleanOptions::default()
    }
}

#[test]
fn test_pipeline_withScenarioTrack_shouldMuteDirtyEntriesOnly() {
    let plan = scenario_options().normalize().unwrap();
    assert_eq!(plan.processing, ProcessingMode::SubsOnly);
    assert_eq!(plan.content_id.as_deref(), Some("4242"));

    let pipeline = Pipeline::new(&parse_rules(common::SCENARIO_SWEARS), plan);
    let output = pipeline.run(&common::scenario_entries()).unwrap();

    let indices: Vec<usize> = output.matched.iter().filter(|m| m.is_matched()).map(|m| m.index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert_eq!(output.segments, vec![MuteSegment::new(0, 1500), MuteSegment::new(5700, 7500)]);

    let texts: Vec<&str> = output.clean_subtitles.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["you *", "gosh"]);
    assert_eq!(output.clean_subtitles[1].seq_num, 2);

    assert_eq!(output.edl.as_deref(), Some("0.000\t1.500\t1\n5.700\t7.500\t1\n"));
    assert_eq!(output.diagnostics.as_ref().map(Vec::len), Some(2));
    let markers = output.skip_markers.as_ref().unwrap();
    assert_eq!(markers[0].content_id, "4242");
    assert_eq!(markers[1].offset_ms, 6200);
    assert_eq!(output.plex_document.as_ref().map(|d| d.marker_count()), Some(2));
    assert!(!output.is_empty_result());
}

#[test]
fn test_pipeline_withEmptyRuleSet_shouldLeaveTrackUntouched() {
    let entries = common::scenario_entries();

    let scrub_only = Pipeline::new(&RuleSet::default(), CleanOptions::default().normalize().unwrap());
    let output = scrub_only.run(&entries).unwrap();
    assert_eq!(output.matched_count(), 0);
    assert!(output.segments.is_empty());
    assert!(output.clean_subtitles.is_empty());
    assert!(output.mute_instructions.is_empty());
    assert!(output.is_empty_result());

    let full_options = CleanOptions { full_subs: true, ..CleanOptions::default() };
    let full = Pipeline::new(&RuleSet::default(), full_options.normalize().unwrap());
    assert_eq!(full.plan().subtitle_mode, SubtitleMode::Full);
    assert_eq!(full.run(&entries).unwrap().clean_subtitles, entries);
}

#[test]
fn test_pipeline_edlOutput_shouldRoundTripThroughReader() {
    let options = CleanOptions { pad_secs: 0.25, edl: true, ..CleanOptions::default() };
    let pipeline = Pipeline::new(&parse_rules(common::SCENARIO_SWEARS), options.normalize().unwrap());
    let output = pipeline.run(&common::scenario_entries()).unwrap();

    let edl = output.edl.as_deref().unwrap();
    assert_eq!(parse_edl(edl).unwrap(), output.segments);
}

#[test]
fn test_pipeline_withHugePad_shouldMergeIntoOneSegment() {
    let options = CleanOptions { pad_secs: 10.0, ..CleanOptions::default() };
    let pipeline = Pipeline::new(&parse_rules(common::SCENARIO_SWEARS), options.normalize().unwrap());
    let output = pipeline.run(&common::scenario_entries()).unwrap();

    assert_eq!(output.segments, vec![MuteSegment::new(0, 17_000)]);
    assert_eq!(output.mute_instructions.len(), 1);
}

#[test]
fn test_pipeline_runUntil_shouldClampToTimelineEnd() {
    let options = CleanOptions { pad_secs: 1.0, ..CleanOptions::default() };
    let pipeline = Pipeline::new(&parse_rules(common::SCENARIO_SWEARS), options.normalize().unwrap());

    let output = pipeline.run_until(&common::scenario_entries(), Some(7_200)).unwrap();

    assert_eq!(output.segments.last(), Some(&MuteSegment::new(5_200, 7_200)));
}

#[test]
fn test_pipeline_withUnsortedTrack_shouldFailWithoutOutput() {
    let mut entries = common::scenario_entries();
    entries.swap(0, 2);
    let pipeline = Pipeline::new(&parse_rules(common::SCENARIO_SWEARS), CleanOptions::default().normalize().unwrap());

    let err = pipeline.run(&entries).unwrap_err();
    assert_eq!(err, CleanError::Ordering { index: 1, start_ms: 5000, previous_start_ms: 6200 });
}

#[test]
fn test_pipeline_reusedAcrossTracks_shouldNotCarryState() {
    let pipeline = Pipeline::new(&parse_rules(common::SCENARIO_SWEARS), CleanOptions::default().normalize().unwrap());
    let first = pipeline.run(&common::scenario_entries()).unwrap();
    let second = pipeline.run(&common::scenario_entries()).unwrap();
    assert_eq!(first, second);
}
