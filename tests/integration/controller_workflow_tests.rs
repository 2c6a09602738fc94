/*!
 * Controller runs against files on disk. None of these need ffmpeg: every
 * run either requests subtitle artifacts only or has no input video.
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use cleansubs::app_config::Config;
use cleansubs::app_controller::{CleanRequest, Controller};
use cleansubs::output::{DiagnosticReport, PlexAutoSkipDocument, SkipMarker};
use cleansubs::subtitle_processor::SubtitleCollection;
use crate::common;

fn controller_for(swears: &Path, configure: impl FnOnce(&mut Config)) -> Result<Controller> {
    common::init_test_logging();
    let mut config = Config::default();
    config.swears_file = swears.to_path_buf();
    configure(&mut config);
    Controller::with_config(config)
}

#[tokio::test]
async fn test_run_withSubtitleFileOnly_shouldWriteCleanSubtitles() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (subs, swears) = common::create_scenario_files(dir.path())?;
    let controller = controller_for(&swears, |_| {})?;

    let summary = controller
        .run(CleanRequest { subtitles: Some(subs.clone()), ..CleanRequest::default() })
        .await?;

    assert_eq!(summary.scrubbed_entries, 2);
    assert_eq!(summary.mute_segments, 2);
    let clean_path = dir.path().join("movie_clean.srt");
    assert_eq!(summary.written, vec![clean_path.clone()]);

    let clean = SubtitleCollection::from_srt_file(&clean_path)?;
    let texts: Vec<&str> = clean.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["you *", "gosh"]);
    Ok(())
}

#[tokio::test]
async fn test_run_withEveryOutputRequested_shouldWriteAllArtifacts() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (subs, swears) = common::create_scenario_files(dir.path())?;
    let controller = controller_for(&swears, |config| {
        config.cleaning.pad_secs = 0.5;
        config.outputs.edl = true;
        config.outputs.json = true;
        config.outputs.skip_markers = true;
        config.outputs.plex_auto_skip_id = Some("777".into());
    })?;
    let plex_path = dir.path().join("plex").join("custom.json");

    let summary = controller
        .run(CleanRequest {
            subtitles: Some(subs.clone()),
            plex_auto_skip_json: Some(plex_path.clone()),
            ..CleanRequest::default()
        })
        .await?;

    assert_eq!(summary.written.len(), 5);
    assert_eq!(
        fs::read_to_string(dir.path().join("movie_clean.edl"))?,
        "0.000\t1.500\t1\n5.700\t7.500\t1\n"
    );

    let report: DiagnosticReport = serde_json::from_str(&fs::read_to_string(dir.path().join("movie_clean.json"))?)?;
    assert_eq!(report.edits.len(), 2);
    assert_eq!(report.edits[1].replacement, "gosh");
    assert_eq!(report.subtitles.input.as_deref(), Some(subs.as_path()));
    assert!(report.media.input.is_none());

    let markers: Vec<SkipMarker> =
        serde_json::from_str(&fs::read_to_string(dir.path().join("movie_clean_skip_markers.json"))?)?;
    assert_eq!(markers.len(), 2);
    assert!(markers.iter().all(|m| m.content_id == "777" && m.tag == "volume"));

    let document: PlexAutoSkipDocument = serde_json::from_str(&fs::read_to_string(&plex_path)?)?;
    assert_eq!(document.markers["777"].len(), 2);
    assert_eq!(document.markers["777"][1].end, 7500);
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingArtifact_shouldLeaveNoPartialOutput() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (subs, swears) = common::create_scenario_files(dir.path())?;
    let controller = controller_for(&swears, |config| {
        config.outputs.edl = true;
    })?;
    // EDL target already exists and overwriting is not allowed
    common::create_test_file(dir.path(), "movie_clean.edl", "old")?;
    let before = common::file_names(dir.path())?;

    let result = controller
        .run(CleanRequest { subtitles: Some(subs), ..CleanRequest::default() })
        .await;

    assert!(result.is_err());
    assert_eq!(common::file_names(dir.path())?, before);
    assert_eq!(fs::read_to_string(dir.path().join("movie_clean.edl"))?, "old");
    Ok(())
}

#[tokio::test]
async fn test_run_withForceOverwrite_shouldReplaceExistingOutput() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (subs, swears) = common::create_scenario_files(dir.path())?;
    common::create_test_file(dir.path(), "movie_clean.srt", "stale")?;
    let controller = controller_for(&swears, |_| {})?;

    controller
        .run(CleanRequest { subtitles: Some(subs), force_overwrite: true, ..CleanRequest::default() })
        .await?;

    assert!(fs::read_to_string(dir.path().join("movie_clean.srt"))?.contains("gosh"));
    Ok(())
}

#[tokio::test]
async fn test_run_withPlexOutputButNoId_shouldFailValidation() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (subs, swears) = common::create_scenario_files(dir.path())?;
    let controller = controller_for(&swears, |_| {})?;

    let result = controller
        .run(CleanRequest {
            subtitles: Some(subs),
            plex_auto_skip_json: Some(dir.path().join("plex.json")),
            ..CleanRequest::default()
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("content_id"));
    assert!(!dir.path().join("movie_clean.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withUnorderedSubtitles_shouldFailWithOrderingError() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (_, swears) = common::create_scenario_files(dir.path())?;
    let subs = common::create_test_file(
        dir.path(),
        "broken.srt",
        "1\n00:00:05,000 --> 00:00:06,000\nheck\n\n2\n00:00:01,000 --> 00:00:02,000\nheck\n",
    )?;
    let controller = controller_for(&swears, |_| {})?;

    let err = controller
        .run(CleanRequest { subtitles: Some(subs), ..CleanRequest::default() })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Ordering error"));
    assert!(!dir.path().join("broken_clean.srt").exists());
    Ok(())
}

#[test]
fn test_withConfig_withMissingSwearsFile_shouldFail() {
    let mut config = Config::default();
    config.swears_file = "/definitely/not/here.txt".into();
    assert!(Controller::with_config(config).is_err());
}

#[tokio::test]
async fn test_runFolder_shouldCleanEachFileOnceThenSkip() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (_, swears) = common::create_scenario_files(dir.path())?;
    let season = dir.path().join("season1");
    fs::create_dir(&season)?;
    common::create_test_file(&season, "ep1.srt", common::SCENARIO_SRT)?;
    common::create_test_file(&season, "ep2.srt", common::SCENARIO_SRT)?;
    let controller = controller_for(&swears, |_| {})?;

    let first = controller.run_folder(season.clone(), false).await?;
    assert_eq!(first.processed, 2);
    assert!(first.failed.is_empty());
    assert!(season.join("ep1_clean.srt").exists());
    assert!(season.join("ep2_clean.srt").exists());

    let second = controller.run_folder(season.clone(), false).await?;
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 2);

    let forced = controller.run_folder(season, true).await?;
    assert_eq!(forced.processed, 2);
    Ok(())
}

#[test]
fn test_runFolder_withSkipMarkers_shouldRefuse() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (_, swears) = common::create_scenario_files(dir.path())?;
    let controller = controller_for(&swears, |config| {
        config.outputs.skip_markers = true;
        config.outputs.plex_auto_skip_id = Some("1".into());
    })?;

    let result = tokio_test::block_on(controller.run_folder(dir.path().to_path_buf(), false));
    assert!(result.is_err());
    assert!(!dir.path().join("movie_clean.srt").exists());
    Ok(())
}
