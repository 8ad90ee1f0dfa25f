//! medium-speech - Listen to Medium posts and Markdown articles read aloud

mod config;
mod orchestrator;
mod playback;
mod source;
mod speech;
mod text;
mod workdir;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::SpeechConfig;
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, debug};
use orchestrator::{Orchestrator, PlaybackRequest, SpeakRequest, SpeakSummary};
use playback::{PlaybackOptions, SystemRunner};
use source::Source;
use speech::{RetryConfig, SynthesisOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use workdir::WorkDir;

#[derive(Parser, Debug)]
#[command(name = "medium-speech")]
#[command(
    about = "Listen to a Medium post or a Markdown file read aloud",
    long_about = "Listen to a Medium post or a Markdown file read aloud.\n\n\
                  Posts are exported to Markdown with docker, spoken line by line with \
                  Google Translate text-to-speech and played with mpg123. Only one run \
                  should use a working directory at a time."
)]
#[command(version)]
struct Args {
    /// Medium post URL
    #[arg(short, long, alias = "url-post")]
    url: Option<String>,

    /// Markdown (or HTML) file to read instead of a URL
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Generate the audio files without playing them
    #[arg(long)]
    no_play: bool,

    /// Keep the audio files after playing them
    #[arg(long)]
    keep_files: bool,

    /// Playback rate (0.25-4.0)
    #[arg(long)]
    speed: Option<f32>,

    /// Times each line is played
    #[arg(long)]
    loops: Option<u32>,

    /// Player program (mpg123, mpv, ffplay, ...)
    #[arg(long)]
    player: Option<String>,

    /// Language of the article (e.g. en, en-us, fr)
    #[arg(long)]
    lang: Option<String>,

    /// Request slower speech
    #[arg(long)]
    slow: bool,

    /// Directory for generated audio files
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Maximum lines per chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Synthesis requests in flight at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Save the retrieved document to this path
    #[arg(long, value_name = "PATH")]
    save_markdown: Option<PathBuf>,

    /// Check that the URL responds before exporting it
    #[arg(long)]
    check_url: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG, when set, refines the level given on the command line.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

async fn run(args: Args) -> Result<()> {
    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let mut config = SpeechConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid settings")?;

    let source = Source::new(args.url.clone(), args.file.clone())?;

    let provider =
        tts_client::get_provider(&config.tts).context("Failed to set up speech provider")?;
    let workdir = WorkDir::new(config.workdir(), provider.audio_extension());

    let request = build_request(&config, &args, source, workdir);
    debug!("Request: {:?}", request);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")?
            .progress_chars("#>-"),
    );

    let runner = SystemRunner;
    let outcome = Orchestrator::new(provider.as_ref(), &runner)
        .speak(&request, |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        })
        .await;
    pb.finish_and_clear();

    print_summary(&outcome?, request.workdir.path());
    Ok(())
}

/// Command-line flags win over the configuration file.
fn apply_overrides(config: &mut SpeechConfig, args: &Args) {
    if let Some(lang) = &args.lang {
        config.lang = lang.clone();
    }
    if let Some(player) = &args.player {
        config.player = player.clone();
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if let Some(loops) = args.loops {
        config.loops = loops;
    }
    if let Some(workdir) = &args.workdir {
        config.workdir = Some(workdir.clone());
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    config.slow |= args.slow;
}

fn build_request(
    config: &SpeechConfig,
    args: &Args,
    source: Source,
    workdir: WorkDir,
) -> SpeakRequest {
    let playback = (!args.no_play).then(|| PlaybackRequest {
        player: config.player.clone(),
        options: PlaybackOptions {
            speed: config.speed,
            loops: config.loops,
        },
        cleanup: !args.keep_files,
    });

    SpeakRequest {
        source,
        workdir,
        playback,
        chunk_size: config.chunk_size,
        tab_width: config.tab_width,
        synthesis: SynthesisOptions {
            lang: config.lang.clone(),
            slow: config.slow,
            jobs: config.jobs,
            retry: RetryConfig::default().with_max_retries(config.max_retries),
        },
        exporter_image: config.exporter_image.clone(),
        export_timeout: config.export_timeout(),
        check_timeout: config.url_check_timeout(),
        save_document: args.save_markdown.clone(),
        check_url: args.check_url,
    }
}

fn print_summary(summary: &SpeakSummary, workdir: &Path) {
    let detail = log::max_level() >= LevelFilter::Debug;
    for line in summary_lines(summary, workdir, detail) {
        eprintln!("{}", line);
    }
}

/// Summary shown after a run. Per-line and per-track failures are only
/// itemized when `detail` is set.
fn summary_lines(summary: &SpeakSummary, workdir: &Path, detail: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "Lines: {}, Chunks: {}, Audio files: {}",
        summary.lines, summary.chunks, summary.synthesis.produced
    )];

    let skipped = &summary.synthesis.skipped;
    if !skipped.is_empty() {
        if detail {
            lines.push(format!("Skipped {} lines:", skipped.len()));
            lines.extend(
                skipped
                    .iter()
                    .map(|s| format!("  {}: \"{}\" ({})", s.index, s.excerpt, s.reason)),
            );
        } else {
            lines.push(format!(
                "Skipped {} lines (run with --log-level debug for details)",
                skipped.len()
            ));
        }
    }

    match &summary.playback {
        Some(report) => {
            if !report.failed.is_empty() {
                lines.push(format!(
                    "Player failed on {} of {} tracks",
                    report.failed.len(),
                    report.tracks
                ));
                if detail {
                    lines.extend(
                        report
                            .failed
                            .iter()
                            .map(|f| format!("  {} (exit code {:?})", f.file, f.exit_code)),
                    );
                }
            }
            if report.removed == 0 && report.tracks > 0 {
                lines.push(format!("Audio files kept in {}", workdir.display()));
            }
        }
        None => lines.push(format!("Audio files written to {}", workdir.display())),
    }

    lines
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = SpeechConfig::load()?;
            println!("Configuration file: {:?}", SpeechConfig::config_path()?);
            println!();
            println!("lang = \"{}\"", config.lang);
            println!("slow = {}", config.slow);
            println!("player = \"{}\"", config.player);
            println!("speed = {}", config.speed);
            println!("loops = {}", config.loops);
            println!("workdir = \"{}\"", config.workdir().display());
            println!("chunk_size = {}", config.chunk_size);
            println!("tab_width = {}", config.tab_width);
            println!("jobs = {}", config.jobs);
            println!("max_retries = {}", config.max_retries);
            println!("exporter_image = \"{}\"", config.exporter_image);
            println!("export_timeout_secs = {}", config.export_timeout_secs);
            println!("url_check_timeout_secs = {}", config.url_check_timeout_secs);
            println!("tts.provider = \"{}\"", config.tts.provider);
            println!("tts.timeout_secs = {}", config.tts.timeout_secs);
        }
        ConfigAction::Path => {
            println!("{}", SpeechConfig::config_path()?.display());
        }
        ConfigAction::Init { force } => {
            let path = SpeechConfig::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite it.",
                    path.display()
                );
            }
            SpeechConfig::default().save()?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
