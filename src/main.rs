#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use cleansubs::app_config::{self, Config};
use cleansubs::app_controller::{CleanRequest, Controller};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every command that loads a configuration
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long = "config-path", default_value = "conf.json")]
    config_path: PathBuf,

    /// Profanity list, one phrase per line (`phrase => replacement` optional)
    #[arg(short = 'w', long)]
    swears: Option<PathBuf>,

    /// Seconds of padding around each muted subtitle
    #[arg(short, long)]
    pad: Option<f64>,

    /// Include every subtitle in the clean file, not only scrubbed ones
    #[arg(short, long)]
    full_subs: bool,

    /// Only produce subtitle artifacts, leave audio alone
    #[arg(long)]
    subs_only: bool,

    /// Write an MPlayer EDL file (implies --subs-only)
    #[arg(long)]
    edl: bool,

    /// Write a diagnostic JSON file
    #[arg(long)]
    json: bool,

    /// Subtitle language to extract from the video (ISO 639, `lang:index` forces a stream)
    #[arg(short, long)]
    lang: Option<String>,

    /// Re-encode video instead of copying it
    #[arg(long)]
    re_encode_video: bool,

    /// Downmix multichannel audio to stereo
    #[arg(long)]
    downmix: bool,

    /// Embed the clean subtitles in the output video
    #[arg(long)]
    embed_subs: bool,

    /// Index of the audio stream to clean
    #[arg(long)]
    audio_stream_index: Option<usize>,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Force overwrite of existing output files
    #[arg(long)]
    force_overwrite: bool,
}

#[derive(Parser, Debug)]
struct CleanArgs {
    /// Input video file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Subtitle file (extracted from the input video when omitted)
    #[arg(short, long)]
    subs: Option<PathBuf>,

    /// Output video file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output subtitle file
    #[arg(long)]
    subs_output: Option<PathBuf>,

    /// Write flat skip markers (implies --subs-only, needs --plex-auto-skip-id)
    #[arg(long)]
    skip_markers: bool,

    /// Write a PlexAutoSkip custom-markers document to this path (implies --subs-only)
    #[arg(long)]
    plex_auto_skip_json: Option<PathBuf>,

    /// Content identifier used in skip markers and PlexAutoSkip documents
    #[arg(long)]
    plex_auto_skip_id: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory scanned recursively for subtitle files
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrub one subtitle file and mute the matching audio
    Clean(CleanArgs),

    /// Scrub every subtitle file in a directory
    Batch(BatchArgs),

    /// Generate shell completions for cleansubs
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// cleansubs - mute profanity in videos using their subtitles
#[derive(Parser, Debug)]
#[command(name = "cleansubs")]
#[command(version)]
#[command(about = "Subtitle-driven profanity muting")]
#[command(long_about = "cleansubs finds profanity in a subtitle track, writes a scrubbed copy of the
subtitles and mutes the matching audio of the video.

EXAMPLES:
    cleansubs clean -i movie.mkv                       # Extract subtitles, scrub, mute
    cleansubs clean -i movie.mkv -s movie.srt -p 0.5   # Use a subtitle file, pad by 0.5s
    cleansubs clean -s movie.srt --edl                 # Only write movie_clean.srt and an EDL
    cleansubs batch /movies --subs-only                # Scrub every subtitle file in a folder
    cleansubs completions bash > cleansubs.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. Command line flags override
    the file. If the config file doesn't exist, a default one is created.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Level is raised or lowered once the config is known
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();
    let result = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "cleansubs", &mut std::io::stdout());
            Ok(())
        }
        Commands::Clean(args) => run_clean(args).await,
        Commands::Batch(args) => run_batch(args).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Load the config file and apply command line overrides
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(level) = common.log_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(swears) = &common.swears {
        config.swears_file = swears.clone();
    }
    if let Some(pad) = common.pad {
        config.cleaning.pad_secs = pad;
    }
    if let Some(lang) = &common.lang {
        config.media.subtitle_language = lang.clone();
    }
    if let Some(index) = common.audio_stream_index {
        config.media.audio_stream_index = Some(index);
    }
    config.cleaning.full_subs |= common.full_subs;
    config.cleaning.subs_only |= common.subs_only;
    config.outputs.edl |= common.edl;
    config.outputs.json |= common.json;
    config.media.re_encode_video |= common.re_encode_video;
    config.media.downmix |= common.downmix;
    config.media.embed_subs |= common.embed_subs;
    if let Some(level) = common.log_level {
        config.log_level = level.into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

async fn run_clean(args: CleanArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    config.outputs.skip_markers |= args.skip_markers;
    if let Some(id) = &args.plex_auto_skip_id {
        config.outputs.plex_auto_skip_id = Some(id.clone());
    }

    if args.input.is_none() && args.subs.is_none() {
        return Err(anyhow!("Either --input or --subs is required"));
    }

    let controller = Controller::with_config(config)?;
    let summary = controller
        .run(CleanRequest {
            input_video: args.input,
            subtitles: args.subs,
            output_video: args.output,
            subs_output: args.subs_output,
            plex_auto_skip_json: args.plex_auto_skip_json,
            force_overwrite: args.common.force_overwrite,
        })
        .await?;

    for path in &summary.written {
        info!("Success: {}", path.display());
    }
    if summary.mute_segments == 0 {
        warn!("No profanity found");
    }
    Ok(())
}

async fn run_batch(args: BatchArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let controller = Controller::with_config(config)?;
    let summary = controller.run_folder(args.input_dir, args.common.force_overwrite).await?;

    info!(
        "Finished: {} cleaned, {} skipped, {} failed",
        summary.processed,
        summary.skipped,
        summary.failed.len()
    );
    if !summary.failed.is_empty() {
        return Err(anyhow!("{} file(s) failed", summary.failed.len()));
    }
    Ok(())
}
