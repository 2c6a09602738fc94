/*!
 * Common test utilities for the cleansubs test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use cleansubs::subtitle_processor::SubtitleEntry;

/// Subtitle track used by most scenarios: two dirty entries around a clean one
pub const SCENARIO_SRT: &str = "1
00:00:00,000 --> 00:00:01,000
you heck

2
00:00:05,000 --> 00:00:06,000
clean line

3
00:00:06,200 --> 00:00:07,000
oh my god
";

/// Rule file matching `SCENARIO_SRT`
pub const SCENARIO_SWEARS: &str = "# test list
heck => *
oh my god => gosh
";

/// Route library logs to the test harness; safe to call more than once
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Writes the scenario subtitle and rule files, returning (subtitles, swears)
pub fn create_scenario_files(dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let subs = create_test_file(dir, "movie.srt", SCENARIO_SRT)?;
    let swears = create_test_file(dir, "swears.txt", SCENARIO_SWEARS)?;
    Ok((subs, swears))
}

/// Scenario entries built in memory
pub fn scenario_entries() -> Vec<SubtitleEntry> {
    vec![
        SubtitleEntry::new(1, 0, 1000, "you heck".to_string()),
        SubtitleEntry::new(2, 5000, 6000, "clean line".to_string()),
        SubtitleEntry::new(3, 6200, 7000, "oh my god".to_string()),
    ]
}

/// Names of the files in a directory, sorted
pub fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}
