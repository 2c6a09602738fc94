use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::app_config::Config;
use crate::dictionary::{load_rules, RuleSet};
use crate::file_utils::{ArtifactWriter, FileManager, FileType};
use crate::media::{MediaMuxer, MediaProbe};
use crate::output::json_report::ArtifactPaths;
use crate::output::DiagnosticReport;
use crate::pipeline::{CleanOptions, Pipeline, PipelineOutput};
use crate::subtitle_processor::SubtitleCollection;

// @module: Application controller for cleaning runs

/// Inputs and output overrides of one cleaning run
#[derive(Debug, Clone, Default)]
pub struct CleanRequest {
    /// Video to mute (and to extract subtitles from when none are given)
    pub input_video: Option<PathBuf>,
    /// Subtitle file to scrub
    pub subtitles: Option<PathBuf>,
    /// Where the muted video goes, `<video stem>_clean.<ext>` by default
    pub output_video: Option<PathBuf>,
    /// Where the clean subtitles go, `<subs stem>_clean.srt` by default
    pub subs_output: Option<PathBuf>,
    /// Write a PlexAutoSkip document to this path
    pub plex_auto_skip_json: Option<PathBuf>,
    pub force_overwrite: bool,
}

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub scrubbed_entries: usize,
    pub mute_segments: usize,
    /// Every file written, muted video included
    pub written: Vec<PathBuf>,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: Vec<PathBuf>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Rules loaded once, shared by every run
    rules: RuleSet,
    probe: MediaProbe,
}

impl Controller {
    // @method: Create a controller, loading the configured rule file
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let rules = load_rules(&config.swears_file)
            .with_context(|| format!("Cannot load swears file {}", config.swears_file.display()))?;
        Ok(Self::with_rules(config, rules))
    }

    /// Create a controller with an already loaded rule set
    pub fn with_rules(config: Config, rules: RuleSet) -> Self {
        Self { config, rules, probe: MediaProbe }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Raw switches for a run, taken from the (CLI-overridden) configuration
    pub fn clean_options(&self, plex_auto_skip: bool) -> CleanOptions {
        let cleaning = &self.config.cleaning;
        let outputs = &self.config.outputs;
        CleanOptions {
            pad_secs: cleaning.pad_secs,
            mask_char: cleaning.mask_char,
            merge_epsilon_ms: cleaning.merge_epsilon_ms,
            timeline_end_ms: None,
            full_subs: cleaning.full_subs,
            subs_only: cleaning.subs_only,
            edl: outputs.edl,
            json: outputs.json,
            skip_markers: outputs.skip_markers,
            plex_auto_skip,
            content_id: outputs.plex_auto_skip_id.clone(),
        }
    }

    /// Clean one subtitle track and write every requested artifact
    pub async fn run(&self, request: CleanRequest) -> Result<RunSummary> {
        let plan = self.clean_options(request.plex_auto_skip_json.is_some()).normalize()?;
        let pipeline = Pipeline::new(&self.rules, plan);
        self.process(&pipeline, &request).await
    }

    async fn process(&self, pipeline: &Pipeline, request: &CleanRequest) -> Result<RunSummary> {
        let start_time = Instant::now();
        let plan = pipeline.plan();

        let video = match &request.input_video {
            Some(video) if !FileManager::file_exists(video) => {
                return Err(anyhow!("Input video does not exist: {}", video.display()));
            }
            other => other.clone(),
        };
        let mux_video = match (&video, plan.is_subs_only()) {
            (Some(video), false) => Some(video.clone()),
            (None, false) => {
                info!("No input video given, producing subtitle artifacts only");
                None
            }
            _ => None,
        };

        let subs_path = self.resolve_subtitles(request, video.as_deref()).await?;
        let collection = SubtitleCollection::from_srt_file(&subs_path)?;

        let timeline_end_ms = match &mux_video {
            Some(video) => self.probe.duration_ms(video).await.unwrap_or_else(|e| {
                warn!("Could not read duration of {}: {}", video.display(), e);
                None
            }),
            None => None,
        };
        let output = pipeline.run_until(&collection.entries, timeline_end_ms)?;

        let clean_subs_path = request
            .subs_output
            .clone()
            .unwrap_or_else(|| FileManager::clean_subtitle_path(&subs_path, None));
        let output_video = mux_video.as_ref().map(|video| {
            request
                .output_video
                .clone()
                .unwrap_or_else(|| FileManager::clean_video_path(video, None))
        });

        let mut writer = ArtifactWriter::new(request.force_overwrite);
        self.stage_artifacts(
            &mut writer,
            &output,
            &subs_path,
            &clean_subs_path,
            video.as_deref(),
            output_video.as_deref(),
            request.plex_auto_skip_json.as_deref(),
        )?;

        let mut written = Vec::new();
        if let (Some(video), Some(output_video)) = (&mux_video, &output_video) {
            if self.should_mux(&output) {
                if output_video.exists() && !request.force_overwrite {
                    return Err(anyhow!(
                        "Output video already exists: {} (use --force-overwrite)",
                        output_video.display()
                    ));
                }
                let embedded_subs = writer.staged_path(&clean_subs_path);
                let muxer = MediaMuxer::new(self.config.media.clone());
                if let Err(e) = muxer.mux(video, output_video, &output.mute_instructions, embedded_subs).await {
                    // Do not leave a truncated video behind
                    let _ = std::fs::remove_file(output_video);
                    return Err(e.context(format!("Failed to write muted video {}", output_video.display())));
                }
                written.push(output_video.clone());
            } else {
                info!("Nothing to mute in {}, video left untouched", video.display());
            }
        }

        match writer.commit() {
            Ok(committed) => written.extend(committed),
            Err(e) => {
                for video in &written {
                    let _ = std::fs::remove_file(video);
                }
                return Err(e);
            }
        }
        for path in &written {
            debug!("Wrote {}", path.display());
        }

        info!(
            "Cleaned {} in {}.",
            subs_path.display(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(RunSummary {
            scrubbed_entries: output.matched_count(),
            mute_segments: output.segments.len(),
            written,
        })
    }

    fn should_mux(&self, output: &PipelineOutput) -> bool {
        let media = &self.config.media;
        !output.segments.is_empty() || media.embed_subs || media.re_encode_video
    }

    async fn resolve_subtitles(&self, request: &CleanRequest, video: Option<&Path>) -> Result<PathBuf> {
        if let Some(subs) = &request.subtitles {
            if FileManager::detect_file_type(subs)? != FileType::Subtitle {
                return Err(anyhow!("Not an SRT subtitle file: {}", subs.display()));
            }
            return Ok(subs.clone());
        }

        let video = video.ok_or_else(|| anyhow!("Either a subtitle file or an input video is required"))?;
        info!("No subtitle file given, extracting from {}", video.display());
        self.probe
            .extract_subtitles(video, &self.config.media.subtitle_language, self.config.media.ffmpeg_timeout_secs)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    fn stage_artifacts(
        &self,
        writer: &mut ArtifactWriter,
        output: &PipelineOutput,
        subs_path: &Path,
        clean_subs_path: &Path,
        video: Option<&Path>,
        output_video: Option<&Path>,
        plex_path: Option<&Path>,
    ) -> Result<()> {
        writer.stage(clean_subs_path, &SubtitleCollection::to_srt_string(&output.clean_subtitles))?;

        if let Some(edl) = &output.edl {
            writer.stage(FileManager::edl_path(clean_subs_path, None), edl)?;
        }

        if let Some(edits) = &output.diagnostics {
            let report = DiagnosticReport::new(
                edits.clone(),
                ArtifactPaths {
                    input: video.map(Path::to_path_buf),
                    output: output_video.map(Path::to_path_buf),
                },
                ArtifactPaths {
                    input: Some(subs_path.to_path_buf()),
                    output: Some(clean_subs_path.to_path_buf()),
                },
            );
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize diagnostic report")?;
            writer.stage(FileManager::json_path(clean_subs_path, None), &json)?;
        }

        if let Some(markers) = &output.skip_markers {
            let json = serde_json::to_string_pretty(markers).context("Failed to serialize skip markers")?;
            writer.stage(FileManager::skip_markers_path(clean_subs_path, None), &json)?;
        }

        if let (Some(document), Some(path)) = (&output.plex_document, plex_path) {
            let json = serde_json::to_string_pretty(document).context("Failed to serialize PlexAutoSkip document")?;
            writer.stage(path, &json)?;
        }

        Ok(())
    }

    /// Format a duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        let millis = duration.subsec_millis();

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, millis)
        }
    }

    /// Clean every subtitle file under a directory with a single compiled rule set.
    ///
    /// Files whose clean output already exists are skipped unless
    /// `force_overwrite` is set. A failing file is logged and does not stop the
    /// batch.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<BatchSummary> {
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {}", input_dir.display()));
        }
        if self.config.outputs.skip_markers {
            return Err(anyhow!("Skip-marker output needs one content id per file and is not available in batch mode"));
        }

        let plan = self.clean_options(false).normalize()?;
        let pipeline = Pipeline::new(&self.rules, plan);

        let files = FileManager::find_subtitle_files(&input_dir)?;
        if files.is_empty() {
            warn!("No subtitle files found in {}", input_dir.display());
            return Ok(BatchSummary::default());
        }
        info!("Found {} subtitle file(s) in {}", files.len(), input_dir.display());

        let progress = ProgressBar::new(files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("█▓▒░"));

        let mut summary = BatchSummary::default();
        for subs in files {
            progress.set_message(
                subs.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );

            if FileManager::clean_subtitle_path(&subs, None).exists() && !force_overwrite {
                warn!("Skipping {}, clean subtitles already exist (use --force-overwrite)", subs.display());
                summary.skipped += 1;
                progress.inc(1);
                continue;
            }

            let request = CleanRequest {
                input_video: FileManager::find_sibling_video(&subs),
                subtitles: Some(subs.clone()),
                force_overwrite,
                ..CleanRequest::default()
            };
            match self.process(&pipeline, &request).await {
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    error!("Failed to clean {}: {:#}", subs.display(), e);
                    summary.failed.push(subs);
                }
            }
            progress.inc(1);
        }

        progress.finish_with_message(format!(
            "{} cleaned, {} skipped, {} failed",
            summary.processed,
            summary.skipped,
            summary.failed.len()
        ));
        Ok(summary)
    }
}
