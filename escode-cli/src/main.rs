//! escode CLI - elementary-stream encode/decode driver.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use escode_codecs::CodecParams;
use escode_core::Rational;
use escode_pipeline::{run_jobs, Direction, SessionConfig, SessionReport, TranscodeSession};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the escode tool.
#[derive(Parser, Debug)]
#[command(name = "escode")]
#[command(version)]
#[command(about = "Elementary-stream encode/decode driver")]
#[command(long_about = "escode drives a video codec engine over raw planar \
    YUV files and elementary streams.\n\n\
    EXAMPLES:\n    \
    escode encode -i input.yuv -o output.es\n    \
    escode decode -i input.es -o output.yuv --width 1280 --height 720\n    \
    escode encode -i input.yuv -o output.es --tune preset=slow --tune tune=zerolatency\n    \
    escode run jobs.json")]
struct Cli {
    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the session report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode raw planar frames into an elementary stream
    Encode(CmdSession),
    /// Decode an elementary stream into raw planar frames
    Decode(CmdSession),
    /// Run a chain of sessions described by a JSON job file
    Run(CmdRun),
}

/// Arguments shared by the encode and decode subcommands.
#[derive(Args, Debug)]
struct CmdSession {
    /// Input file path
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Codec engine name
    #[arg(long, default_value = "raw")]
    codec: String,

    /// Picture width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Picture height in pixels
    #[arg(long, default_value = "480")]
    height: u32,

    /// Frame rate in frames per second
    #[arg(long, default_value = "30")]
    fps: i64,

    /// Target bitrate in bits per second
    #[arg(long, default_value = "468000")]
    bitrate: u64,

    /// Keyframe interval in frames
    #[arg(long, default_value = "250")]
    gop: u32,

    /// Maximum consecutive B-frames
    #[arg(long, default_value = "0")]
    b_frames: u32,

    /// Codec tuning pair, key=value (repeatable)
    #[arg(long = "tune", value_name = "KEY=VALUE", value_parser = parse_tuning)]
    tuning: Vec<(String, String)>,
}

impl CmdSession {
    fn into_config(self, direction: Direction) -> SessionConfig {
        let mut params = CodecParams::default()
            .with_dimensions(self.width, self.height)
            .with_frame_rate(Rational::new(self.fps, 1))
            .with_bit_rate(self.bitrate)
            .with_gop_size(self.gop)
            .with_max_b_frames(self.b_frames);
        for (key, value) in self.tuning {
            params = params.with_tuning(key, value);
        }
        SessionConfig {
            input: self.input,
            output: self.output,
            codec: self.codec,
            direction,
            params,
        }
    }
}

/// Run a job file.
#[derive(Args, Debug)]
struct CmdRun {
    /// Path to a JSON file holding an array of session configurations
    jobs: PathBuf,
}

/// Parse a `key=value` tuning pair.
fn parse_tuning(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}

fn print_report(report: &SessionReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!(
            "frames in: {}  units out: {}  units in: {}  frames out: {}",
            report.frames_in, report.units_out, report.units_in, report.frames_out
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.to_string())),
        )
        .with_target(false)
        .init();

    match cli.command {
        Command::Encode(cmd) => {
            let config = cmd.into_config(Direction::Encode);
            let report = TranscodeSession::new(config)?.run()?;
            print_report(&report, cli.json)?;
        }
        Command::Decode(cmd) => {
            let config = cmd.into_config(Direction::Decode);
            let report = TranscodeSession::new(config)?.run()?;
            print_report(&report, cli.json)?;
        }
        Command::Run(cmd) => {
            let file = File::open(&cmd.jobs)
                .with_context(|| format!("cannot open job file {}", cmd.jobs.display()))?;
            let configs: Vec<SessionConfig> = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("cannot parse job file {}", cmd.jobs.display()))?;
            let reports = run_jobs(&configs)?;
            if cli.json {
                println!("{}", serde_json::to_string(&reports)?);
            } else {
                for (index, report) in reports.iter().enumerate() {
                    print!("job {}: ", index + 1);
                    print_report(report, false)?;
                }
            }
        }
    }

    Ok(())
}
