use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use videobreaker::{
    ArchivePackager, DEFAULT_ARCHIVE_NAME, DEFAULT_JPEG_QUALITY, ExtractOptions, ExtractedFrame,
    ExtractionSession, FfmpegLogLevel, FfmpegSource, FramePlan, FrameSink, ImageEncoding,
    ProgressCallback, ProgressInfo, RunState, RunStatus, VideoSource, parse_max_frames,
};

const CLI_AFTER_HELP: &str = "Examples:\n  videobreaker probe input.mp4 --step 0.5\n  videobreaker extract input.mp4 --step 2 --max-frames 120 --zip frames.zip --progress\n  videobreaker extract input.mp4 --out frames --format jpeg --quality 85\n  videobreaker completions zsh > _videobreaker";

#[derive(Debug, Parser)]
#[command(
    name = "videobreaker",
    version,
    about = "Break a video into still frames at fixed time steps",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print video metadata and the frame plan for a step.
    #[command(
        about = "Print video metadata and frame plan",
        visible_alias = "info",
        after_help = "Examples:\n  videobreaker probe input.mp4\n  videobreaker probe input.mp4 --step 0.5 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Sampling step in seconds.
        #[arg(long, default_value_t = 1.0)]
        step: f64,
        /// Frame ceiling (non-numeric values fall back to 300).
        #[arg(long)]
        max_frames: Option<String>,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract frames at fixed time steps.
    #[command(
        about = "Extract frames and package them",
        after_help = "Without --out or --zip, frames are packaged into videobreaker_frames.zip."
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Sampling step in seconds (0.5, 1, 2 and 5 are the usual choices).
        #[arg(long, default_value_t = 1.0)]
        step: f64,
        /// Frame ceiling (non-numeric values fall back to 300).
        #[arg(long)]
        max_frames: Option<String>,
        /// Directory to write individual frames into.
        #[arg(long)]
        out: Option<PathBuf>,
        /// ZIP archive to write.
        #[arg(long)]
        zip: Option<PathBuf>,
        /// Image format (png, jpeg).
        #[arg(long, default_value = "png")]
        format: String,
        /// JPEG quality, 1 to 100.
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Give up on a seek after this many seconds.
        #[arg(long)]
        seek_timeout: Option<f64>,
        /// Print a machine-readable summary.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_encoding(value: &str, quality: u8) -> Option<ImageEncoding> {
    match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => Some(ImageEncoding::Png),
        "jpeg" | "jpg" => Some(ImageEncoding::jpeg(quality)),
        _ => None,
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        videobreaker::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn progress_bar() -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let bar = ProgressBar::new(0);
    let style =
        ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
    bar.set_style(style.progress_chars("##-"));
    Ok(bar)
}

/// Prints status lines and drives the optional progress bar.
struct TerminalProgress {
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    fn new(bar: Option<ProgressBar>) -> Self {
        Self { bar }
    }

    fn print(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(bar) = &self.bar {
            if let Some(total) = info.total {
                bar.set_length(total);
            }
            bar.set_position(info.current);
        }
    }

    fn on_status(&self, status: &RunStatus) {
        let line = match status {
            RunStatus::Progress { .. } if self.bar.is_some() => return,
            RunStatus::Truncated { .. } => {
                format!("{} {}", "notice:".yellow().bold(), status.to_string().yellow())
            }
            status if status.is_error() => {
                format!("{} {}", "error:".red().bold(), status.to_string().red())
            }
            status => format!("{} {status}", "status:".cyan().bold()),
        };
        self.print(line);
    }
}

/// Writes each frame into the output directory as soon as it is extracted.
struct DirectorySink {
    directory: Option<PathBuf>,
    overwrite: bool,
    written: usize,
    failures: Vec<String>,
}

impl DirectorySink {
    fn new(directory: Option<PathBuf>, overwrite: bool) -> Self {
        Self {
            directory,
            overwrite,
            written: 0,
            failures: Vec::new(),
        }
    }
}

impl FrameSink for DirectorySink {
    fn on_frame(&mut self, frame: &ExtractedFrame) {
        let Some(directory) = &self.directory else {
            return;
        };
        let path = directory.join(frame.filename());
        if path.exists() && !self.overwrite {
            self.failures.push(format!(
                "output file already exists: {} (use --overwrite)",
                path.display()
            ));
            return;
        }
        match frame.save_to(directory) {
            Ok(path) => {
                log::info!("saved frame {} -> {}", frame.index(), path.display());
                self.written += 1;
            }
            Err(error) => self.failures.push(format!("{}: {error}", path.display())),
        }
    }

    fn on_reset(&mut self) {
        self.written = 0;
        self.failures.clear();
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Probe {
            input,
            step,
            max_frames,
            json,
        } => {
            let source = FfmpegSource::open(&input)?;
            let metadata = source.metadata();
            let plan = FramePlan::compute(
                metadata.duration,
                step,
                parse_max_frames(max_frames.as_deref()),
            );

            if json {
                let payload = json!({
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "duration_seconds": metadata.duration,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "plan": plan.as_ref().ok().map(|plan| json!({
                        "step_seconds": plan.step_seconds(),
                        "planned_count": plan.planned_count(),
                        "total": plan.total(),
                        "truncated": plan.is_truncated(),
                    })),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:.2}s", metadata.duration);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                match &plan {
                    Ok(plan) => {
                        println!(
                            "Plan: {} frames at {}s steps, {} will be extracted",
                            plan.planned_count(),
                            plan.step_seconds(),
                            plan.total()
                        );
                        if plan.is_truncated() {
                            println!("{}", "Plan exceeds the frame ceiling".yellow());
                        }
                    }
                    Err(error) => println!("{} {error}", "Plan:".red()),
                }
            }
        }
        Commands::Extract {
            input,
            step,
            max_frames,
            out,
            zip,
            format,
            quality,
            seek_timeout,
            json,
        } => {
            let encoding =
                parse_encoding(&format, quality).ok_or(format!("unsupported --format: {format}"))?;
            let zip = match (&out, zip) {
                (None, None) => Some(PathBuf::from(DEFAULT_ARCHIVE_NAME)),
                (_, zip) => zip,
            };

            if let Some(out) = &out {
                if out.exists() {
                    eprintln!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        format!("writing into existing directory {}", out.display()).yellow()
                    );
                }
                fs::create_dir_all(out)?;
            }
            if let Some(zip) = &zip {
                ensure_writable_path(zip, cli.global.overwrite)?;
            }

            let bar = if cli.global.progress {
                Some(progress_bar()?)
            } else {
                None
            };

            let mut options = ExtractOptions::new()
                .with_step(step)
                .with_max_frames(parse_max_frames(max_frames.as_deref()))
                .with_encoding(encoding)
                .with_progress(Arc::new(TerminalProgress::new(bar.clone())));
            if let Some(seconds) = seek_timeout {
                options = options.with_seek_timeout(Duration::try_from_secs_f64(seconds)?);
            }

            let mut sink = DirectorySink::new(out.clone(), cli.global.overwrite);
            let mut session = ExtractionSession::new();
            let run = session.run_file(&input, &options, &mut sink)?;
            let (state, status, extracted, skipped, total) = (
                run.state(),
                run.status_text(),
                run.len(),
                run.skipped(),
                run.total(),
            );

            if let Some(bar) = &bar {
                bar.finish_with_message("done");
            }

            if let RunState::Failed(_) = state {
                if extracted == 0 {
                    return Err(status.into());
                }
            }
            if let Some(failure) = sink.failures.first() {
                return Err(failure.clone().into());
            }

            let archive = match &zip {
                Some(zip) => Some(session.save_archive(&ArchivePackager::new(), zip, &options)?),
                None => None,
            };

            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "state": format!("{state:?}"),
                    "status": status,
                    "total": total,
                    "extracted": extracted,
                    "skipped": skipped,
                    "written": sink.written,
                    "archive": archive.as_ref().map(|path| path.display().to_string()),
                    "frames": session.records().iter().map(|frame| json!({
                        "index": frame.index(),
                        "time": frame.time(),
                        "filename": frame.filename(),
                        "bytes": frame.image().len(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                if skipped > 0 {
                    eprintln!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        format!("{skipped} of {total} frames could not be captured").yellow()
                    );
                }
                if let Some(out) = &out {
                    println!(
                        "{} {}",
                        "success:".green().bold(),
                        format!("Wrote {} frame(s) to {}", sink.written, out.display()).green()
                    );
                }
                if let Some(path) = &archive {
                    println!(
                        "{} {}",
                        "success:".green().bold(),
                        format!("Packaged {extracted} frame(s) into {}", path.display()).green()
                    );
                }
            }

            if let RunState::Failed(_) = state {
                return Err(status.into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "videobreaker", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
