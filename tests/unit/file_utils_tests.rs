/*!
 * Tests for file utilities
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use cleansubs::file_utils::{ArtifactWriter, FileManager, FileType};
use crate::common;

#[test]
fn test_findSubtitleFiles_shouldSkipCleanedOutputAndOtherFiles() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "a.srt", common::SCENARIO_SRT)?;
    common::create_test_file(dir.path(), "a_clean.srt", common::SCENARIO_SRT)?;
    common::create_test_file(dir.path(), "notes.txt", "x")?;
    fs::create_dir(dir.path().join("season1"))?;
    common::create_test_file(&dir.path().join("season1"), "b.SRT", common::SCENARIO_SRT)?;

    let files = FileManager::find_subtitle_files(dir.path())?;

    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.srt", "b.SRT"]);
    Ok(())
}

#[test]
fn test_detectFileType_withUnknownExtension_shouldSniffSrt() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let srt = common::create_test_file(dir.path(), "track.sub", common::SCENARIO_SRT)?;
    let other = common::create_test_file(dir.path(), "track.bin", "nothing here")?;
    let video = common::create_test_file(dir.path(), "movie.mkv", "")?;

    assert_eq!(FileManager::detect_file_type(&srt)?, FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type(&other)?, FileType::Unknown);
    assert_eq!(FileManager::detect_file_type(&video)?, FileType::Video);
    assert!(FileManager::detect_file_type(dir.path().join("missing.srt")).is_err());
    Ok(())
}

#[test]
fn test_findSiblingVideo_withLanguageSuffix_shouldFindBaseVideo() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let subs = common::create_test_file(dir.path(), "movie.en.srt", common::SCENARIO_SRT)?;
    assert_eq!(FileManager::find_sibling_video(&subs), None);

    let video = common::create_test_file(dir.path(), "movie.mp4", "")?;
    assert_eq!(FileManager::find_sibling_video(&subs), Some(video));
    Ok(())
}

#[test]
fn test_artifactWriter_commit_shouldWriteEveryStagedFile() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut writer = ArtifactWriter::new(false);
    writer.stage(dir.path().join("a.srt"), "subs")?;
    writer.stage(dir.path().join("out").join("a.edl"), "edl")?;

    let staged = writer.staged_path(dir.path().join("a.srt")).map(Path::to_path_buf);
    assert!(staged.as_ref().is_some_and(|p| p.extension().is_some_and(|e| e == "srt")));
    assert!(writer.stage(dir.path().join("a.srt"), "again").is_err());

    let written = writer.commit()?;

    assert_eq!(written.len(), 2);
    assert_eq!(fs::read_to_string(dir.path().join("a.srt"))?, "subs");
    assert_eq!(fs::read_to_string(dir.path().join("out").join("a.edl"))?, "edl");
    assert_eq!(common::file_names(dir.path())?, vec!["a.srt", "out"]);
    Ok(())
}
