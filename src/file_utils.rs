use anyhow::{anyhow, Context, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

static SRT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*\r?\n\d{2}:\d{2}:\d{2},\d{3}\s+-->\s+\d{2}:\d{2}:\d{2},\d{3}")
        .expect("SRT block regex is valid")
});

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @generates: `<dir>/<stem><suffix>.<extension>`, dir defaulting to the input's
    pub fn derived_path<P: AsRef<Path>>(input: P, output_dir: Option<&Path>, suffix: &str, extension: &str) -> PathBuf {
        let input = input.as_ref();
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        dir.join(format!("{}{}.{}", stem, suffix, extension))
    }

    /// `movie.srt` -> `movie_clean.srt`
    pub fn clean_subtitle_path<P: AsRef<Path>>(subs: P, output_dir: Option<&Path>) -> PathBuf {
        Self::derived_path(subs, output_dir, "_clean", "srt")
    }

    /// `movie.srt` -> `movie.edl`
    pub fn edl_path<P: AsRef<Path>>(subs: P, output_dir: Option<&Path>) -> PathBuf {
        Self::derived_path(subs, output_dir, "", "edl")
    }

    /// `movie.srt` -> `movie.json`
    pub fn json_path<P: AsRef<Path>>(subs: P, output_dir: Option<&Path>) -> PathBuf {
        Self::derived_path(subs, output_dir, "", "json")
    }

    /// `movie.srt` -> `movie_skip_markers.json`
    pub fn skip_markers_path<P: AsRef<Path>>(subs: P, output_dir: Option<&Path>) -> PathBuf {
        Self::derived_path(subs, output_dir, "_skip_markers", "json")
    }

    /// `movie.mkv` -> `movie_clean.mkv`
    pub fn clean_video_path<P: AsRef<Path>>(video: P, output_dir: Option<&Path>) -> PathBuf {
        let video = video.as_ref();
        let ext = video
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mkv".to_string());
        Self::derived_path(video, output_dir, "_clean", &ext)
    }

    /// `movie.mkv` -> `movie_PlexAutoSkip_clean.json`
    pub fn plex_auto_skip_path<P: AsRef<Path>>(video: P, output_dir: Option<&Path>) -> PathBuf {
        Self::derived_path(video, output_dir, "_PlexAutoSkip_clean", "json")
    }

    /// Find subtitle files under a directory, skipping previously cleaned output
    pub fn find_subtitle_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let is_srt = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("srt"));
            let is_cleaned = path
                .file_stem()
                .is_some_and(|s| s.to_string_lossy().ends_with("_clean"));
            if is_srt && !is_cleaned {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    /// Video sitting next to a subtitle file (`movie.en.srt` -> `movie.mkv`)
    pub fn find_sibling_video<P: AsRef<Path>>(subs: P) -> Option<PathBuf> {
        let subs = subs.as_ref();
        let dir = subs.parent()?;
        let stem = subs.file_stem()?.to_string_lossy().into_owned();
        let base = stem.split('.').next().unwrap_or(&stem).to_string();

        [stem, base].iter().find_map(|name| {
            VIDEO_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{}.{}", name, ext)))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Detect if a file is a subtitle file (SRT) or a video file
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!("File does not exist: {}", path.display()));
        }

        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if ext == "srt" {
                return Ok(FileType::Subtitle);
            }
            if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
                return Ok(FileType::Video);
            }
        }

        // Unknown extension: sniff for SRT content
        if let Ok(bytes) = fs::read(path) {
            let content = crate::subtitle_processor::decode_subtitle_bytes(&bytes);
            if SRT_BLOCK.is_match(&content) {
                return Ok(FileType::Subtitle);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Subtitle file (SRT)
    Subtitle,
    /// Video file supported by ffmpeg
    Video,
    /// Unknown file type
    Unknown,
}

/// Writes a set of artifacts so that either all of them land or none does.
///
/// Contents are staged in temporary files next to their destinations and only
/// renamed into place by `commit`.
#[derive(Debug, Default)]
pub struct ArtifactWriter {
    staged: Vec<(PathBuf, NamedTempFile)>,
    force_overwrite: bool,
}

impl ArtifactWriter {
    pub fn new(force_overwrite: bool) -> Self {
        Self { staged: Vec::new(), force_overwrite }
    }

    /// Stage `content` for `path`
    pub fn stage<P: AsRef<Path>>(&mut self, path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !self.force_overwrite {
            return Err(anyhow!("Output file already exists: {} (use --force-overwrite)", path.display()));
        }
        if self.staged.iter().any(|(p, _)| p == path) {
            return Err(anyhow!("Output file staged twice: {}", path.display()));
        }

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        FileManager::ensure_dir(&dir)?;

        // Keep the extension so tools that sniff by name accept the staged file
        let suffix = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mut temp = tempfile::Builder::new()
            .prefix(".cleansubs-")
            .suffix(&suffix)
            .tempfile_in(&dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        temp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to stage {}", path.display()))?;
        temp.flush()?;

        self.staged.push((path.to_path_buf(), temp));
        Ok(())
    }

    /// Destinations staged so far
    pub fn paths(&self) -> Vec<&Path> {
        self.staged.iter().map(|(p, _)| p.as_path()).collect()
    }

    /// Temporary location of a staged artifact, readable before `commit`
    pub fn staged_path<P: AsRef<Path>>(&self, path: P) -> Option<&Path> {
        self.staged
            .iter()
            .find(|(p, _)| p == path.as_ref())
            .map(|(_, temp)| temp.path())
    }

    /// Move every staged file into place, returning the written paths.
    ///
    /// When one rename fails, the files already moved by this call are removed
    /// and the remaining staged files are discarded.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let mut written: Vec<PathBuf> = Vec::with_capacity(self.staged.len());
        for (path, temp) in self.staged {
            if let Err(e) = temp.persist(&path) {
                for done in &written {
                    if let Err(remove_err) = fs::remove_file(done) {
                        warn!("Failed to remove {}: {}", done.display(), remove_err);
                    }
                }
                return Err(anyhow::Error::new(e).context(format!("Failed to write {}", path.display())));
            }
            written.push(path);
        }
        Ok(written)
    }
}
