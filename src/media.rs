/*!
 * Adapters for the external media tools.
 *
 * - `MediaProbe` asks `ffprobe` about streams and duration and extracts
 *   embedded subtitle tracks with `ffmpeg`.
 * - `MediaMuxer` turns mute instructions into an `afade` filter chain and
 *   re-muxes the video with the cleaned audio stream.
 *
 * Argument and filter construction are plain functions so they can be tested
 * without the tools installed.
 */

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use isolang::Language;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::process::Command;

use crate::app_config::MediaConfig;
use crate::errors::MediaError;
use crate::output::edl::format_seconds;
use crate::output::MuteInstruction;

/// Stereo downmix filter applied before muting when requested
pub const AUDIO_DOWNMIX_FILTER: &str =
    "pan=stereo|FL=0.8*FC + 0.6*FL + 0.6*BL + 0.5*LFE|FR=0.8*FC + 0.6*FR + 0.6*BR + 0.5*LFE";

/// Length of the fade at each mute boundary
const FADE_DURATION: &str = "10ms";

const PROBE_TIMEOUT_SECS: u64 = 60;

/// ISO 639 B-codes whose T-code differs
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"), ("arm", "hye"), ("baq", "eus"), ("bur", "mya"), ("chi", "zho"),
    ("cze", "ces"), ("dut", "nld"), ("fre", "fra"), ("geo", "kat"), ("ger", "deu"),
    ("gre", "ell"), ("ice", "isl"), ("mac", "mkd"), ("may", "msa"), ("per", "fas"),
    ("rum", "ron"), ("slo", "slk"), ("wel", "cym"),
];

/// Resolve a 2- or 3-letter language code (ISO 639-1, 639-2/T or 639-2/B)
pub fn normalize_language(code: &str) -> Option<Language> {
    let code = code.trim().to_lowercase();
    let code = code.split(':').next().unwrap_or_default();
    match code.len() {
        2 => Language::from_639_1(code),
        3 => {
            let terminology = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(b, _)| *b == code)
                .map_or(code, |(_, t)| *t);
            Language::from_639_3(terminology)
        }
        _ => None,
    }
}

/// Whether two language codes name the same language
pub fn language_codes_match(a: &str, b: &str) -> bool {
    match (normalize_language(a), normalize_language(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

/// One stream reported by ffprobe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Absolute stream index in the container
    pub index: usize,
    pub codec_name: String,
    pub language: Option<String>,
    pub title: Option<String>,
    pub channels: Option<u32>,
}

/// Parse the `streams` array of `ffprobe -print_format json -show_streams`
pub fn parse_probe_streams(json: &str) -> Result<Vec<StreamInfo>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(json).context("Failed to parse ffprobe JSON output")?;
    let Some(streams) = value.get("streams").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(streams
        .iter()
        .map(|stream| {
            let tag = |name: &str| {
                stream
                    .get("tags")
                    .and_then(|t| t.get(name))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            StreamInfo {
                index: stream.get("index").and_then(Value::as_u64).unwrap_or(0) as usize,
                codec_name: stream
                    .get("codec_name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                language: tag("language"),
                title: tag("title"),
                channels: stream.get("channels").and_then(Value::as_u64).map(|c| c as u32),
            }
        })
        .collect())
}

/// Check if a subtitle codec is bitmap-based (cannot be converted to text SRT)
fn is_bitmap_codec(codec_name: &str) -> bool {
    matches!(codec_name, "hdmv_pgs_subtitle" | "dvd_subtitle" | "dvb_subtitle" | "xsub")
}

/// Pick a text subtitle track.
///
/// `language` may carry a forced stream index as `lang:index`; otherwise the
/// first text track in that language wins.
pub fn select_subtitle_track(tracks: &[StreamInfo], language: &str) -> Option<usize> {
    if let Some((_, forced)) = language.split_once(':') {
        return forced.trim().parse().ok();
    }

    tracks
        .iter()
        .filter(|t| !is_bitmap_codec(&t.codec_name))
        .find(|t| t.language.as_deref().is_some_and(|l| language_codes_match(l, language)))
        .map(|t| t.index)
}

/// Position, among audio streams, of the stream to clean.
///
/// Without an explicit index the input must have exactly one audio stream.
pub fn resolve_audio_stream(audio_streams: &[StreamInfo], requested: Option<usize>) -> Result<usize> {
    if audio_streams.is_empty() {
        return Err(anyhow!("No audio streams found"));
    }

    match requested {
        None if audio_streams.len() == 1 => Ok(0),
        None => Err(anyhow!(
            "Multiple audio streams found, choose one with --audio-stream-index ({})",
            audio_streams.iter().map(|s| s.index.to_string()).collect::<Vec<_>>().join(", ")
        )),
        Some(index) => audio_streams
            .iter()
            .position(|s| s.index == index)
            .ok_or_else(|| anyhow!("Audio stream index {} does not exist", index)),
    }
}

/// Build the audio filter chain muting every instruction window.
///
/// Each window gets a fade-out at its start, enabled until its end, and a
/// fade-in at its end, enabled until the next window starts.
pub fn build_audio_filter(instructions: &[MuteInstruction], downmix: bool) -> Option<String> {
    let mut filters: Vec<String> = Vec::with_capacity(instructions.len() * 2 + 1);
    if downmix {
        filters.push(AUDIO_DOWNMIX_FILTER.to_string());
    }

    for (i, instruction) in instructions.iter().enumerate() {
        let start = format_seconds(instruction.start_ms);
        let end = format_seconds(instruction.end_ms);
        filters.push(format!(
            "afade=enable='between(t,{start},{end})':t=out:st={start}:d={FADE_DURATION}"
        ));
        let fade_in_window = match instructions.get(i + 1) {
            Some(next) => format!("between(t,{},{})", end, format_seconds(next.start_ms)),
            None => format!("gte(t,{})", end),
        };
        filters.push(format!("afade=enable='{fade_in_window}':t=in:st={end}:d={FADE_DURATION}"));
    }

    (!filters.is_empty()).then(|| filters.join(","))
}

/// Inputs of one re-mux run
#[derive(Debug, Clone)]
pub struct MuxRequest<'a> {
    pub input_video: &'a Path,
    pub output_video: &'a Path,
    /// Clean subtitles to embed, if requested
    pub clean_subtitles: Option<&'a Path>,
    pub instructions: &'a [MuteInstruction],
    /// Position of the cleaned stream among audio streams
    pub audio_position: usize,
    pub audio_stream_count: usize,
    /// Whether the downmix filter should be applied
    pub downmix: bool,
}

/// Build the ffmpeg argument list for a re-mux
pub fn build_mux_args(request: &MuxRequest<'_>, config: &MediaConfig) -> Vec<String> {
    let pos = request.audio_position;
    let mut args: Vec<String> = ["-hide_banner", "-nostats", "-loglevel", "error", "-y", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(request.input_video.to_string_lossy().into_owned());

    if let Some(subs) = request.clean_subtitles {
        args.push("-i".into());
        args.push(subs.to_string_lossy().into_owned());
    }

    let cleaned_label = match build_audio_filter(request.instructions, request.downmix) {
        Some(filter) => {
            args.push("-filter_complex".into());
            args.push(format!("[0:a:{pos}]{filter}[a{pos}]"));
            format!("[a{pos}]")
        }
        None => format!("0:a:{pos}"),
    };

    args.extend(["-map".into(), "0:v".into(), "-map".into(), cleaned_label]);
    for other in (0..request.audio_stream_count).filter(|i| *i != pos) {
        args.push("-map".into());
        args.push(format!("0:a:{other}"));
    }

    match request.clean_subtitles {
        Some(_) => {
            let is_mp4 = request
                .output_video
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("mp4"));
            args.extend([
                "-map".into(),
                "1:s".into(),
                "-c:s".into(),
                if is_mp4 { "mov_text".into() } else { "srt".into() },
                "-disposition:s:0".into(),
                "default".into(),
                "-metadata:s:s:0".into(),
                format!("language={}", config.subtitle_language),
            ]);
        }
        None => args.push("-sn".into()),
    }

    if config.re_encode_video {
        args.extend(config.video_params.split_whitespace().map(str::to_string));
    } else {
        args.extend(["-c:v".into(), "copy".into()]);
    }

    // The cleaned stream is mapped first, so it is output audio stream 0
    if request.audio_stream_count > 1 {
        args.extend(["-c:a".into(), "copy".into()]);
    }
    args.extend(config.audio_params.split_whitespace().map(|p| {
        if p == "-c:a" {
            "-c:a:0".to_string()
        } else {
            p.to_string()
        }
    }));

    args.push(request.output_video.to_string_lossy().into_owned());
    args
}

async fn run_tool(tool: &'static str, args: &[String], timeout_secs: u64) -> Result<Output, MediaError> {
    debug!("Running {} {}", tool, args.join(" "));
    let mut command = Command::new(tool);
    command.args(args).kill_on_drop(true);

    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), command.output())
        .await
        .map_err(|_| MediaError::Timeout { tool, secs: timeout_secs })?
        .map_err(|e| MediaError::SpawnFailed { tool, message: e.to_string() })?;

    if !output.status.success() {
        return Err(MediaError::ToolFailed {
            tool,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Read-only queries against a media file
#[derive(Debug, Clone, Default)]
pub struct MediaProbe;

impl MediaProbe {
    /// List streams of one kind (`a` audio, `s` subtitle)
    pub async fn streams(&self, video: &Path, selector: &str) -> Result<Vec<StreamInfo>> {
        let args: Vec<String> = vec![
            "-v".into(), "quiet".into(),
            "-print_format".into(), "json".into(),
            "-show_streams".into(),
            "-select_streams".into(), selector.into(),
            video.to_string_lossy().into_owned(),
        ];
        let output = run_tool("ffprobe", &args, PROBE_TIMEOUT_SECS).await?;
        parse_probe_streams(&String::from_utf8_lossy(&output.stdout))
    }

    /// Container duration in milliseconds, when ffprobe reports one
    pub async fn duration_ms(&self, video: &Path) -> Result<Option<u64>> {
        let args: Vec<String> = vec![
            "-v".into(), "error".into(),
            "-show_entries".into(), "format=duration".into(),
            "-of".into(), "default=noprint_wrappers=1:nokey=1".into(),
            video.to_string_lossy().into_owned(),
        ];
        let output = run_tool("ffprobe", &args, PROBE_TIMEOUT_SECS).await?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.trim().parse::<f64>().ok().map(|secs| (secs * 1000.0).round() as u64))
    }

    /// Extract the embedded subtitle track for `language` to `<video stem>.<language>.srt`
    pub async fn extract_subtitles(&self, video: &Path, language: &str, timeout_secs: u64) -> Result<PathBuf> {
        let tracks = self.streams(video, "s").await?;
        let bitmap_count = tracks.iter().filter(|t| is_bitmap_codec(&t.codec_name)).count();
        if bitmap_count > 0 {
            warn!("Skipping {} bitmap subtitle track(s), only text tracks can be extracted", bitmap_count);
        }

        let index = select_subtitle_track(&tracks, language).ok_or_else(|| {
            MediaError::NoSubtitleTrack(format!("no text track for language '{}' in {}", language, video.display()))
        })?;

        let lang_label = language.split(':').next().unwrap_or(language);
        let output = video.with_extension(format!("{}.srt", lang_label));
        let args: Vec<String> = vec![
            "-hide_banner".into(), "-nostats".into(), "-loglevel".into(), "error".into(), "-y".into(),
            "-i".into(), video.to_string_lossy().into_owned(),
            "-map".into(), format!("0:{}", index),
            output.to_string_lossy().into_owned(),
        ];
        run_tool("ffmpeg", &args, timeout_secs).await?;

        if !output.exists() {
            return Err(anyhow!("ffmpeg did not produce {}", output.display()));
        }
        info!("Extracted subtitle track {} to {}", index, output.display());
        Ok(output)
    }
}

/// Writes a muted copy of a video
#[derive(Debug, Clone)]
pub struct MediaMuxer {
    config: MediaConfig,
    probe: MediaProbe,
}

impl MediaMuxer {
    pub fn new(config: MediaConfig) -> Self {
        Self { config, probe: MediaProbe }
    }

    /// Mute `instructions` in `input_video` and write `output_video`
    pub async fn mux(
        &self,
        input_video: &Path,
        output_video: &Path,
        instructions: &[MuteInstruction],
        clean_subtitles: Option<&Path>,
    ) -> Result<()> {
        let audio_streams = self.probe.streams(input_video, "a").await?;
        let audio_position = resolve_audio_stream(&audio_streams, self.config.audio_stream_index)
            .with_context(|| format!("Cannot choose audio stream in {}", input_video.display()))?;
        let downmix = self.config.downmix
            && audio_streams[audio_position].channels.is_some_and(|c| c > 2);

        let request = MuxRequest {
            input_video,
            output_video,
            clean_subtitles: if self.config.embed_subs { clean_subtitles } else { None },
            instructions,
            audio_position,
            audio_stream_count: audio_streams.len(),
            downmix,
        };
        let args = build_mux_args(&request, &self.config);

        info!("Muting {} segment(s) in {}", instructions.len(), input_video.display());
        run_tool("ffmpeg", &args, self.config.ffmpeg_timeout_secs).await?;

        if !output_video.exists() {
            return Err(anyhow!("ffmpeg did not produce {}", output_video.display()));
        }
        Ok(())
    }
}
