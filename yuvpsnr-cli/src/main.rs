//! yuvpsnr CLI - PSNR between two raw YUV 4:2:0 files
//!
//! Prints a per-plane PSNR table for two same-sized 8-bit YUV 4:2:0 streams.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use yuvpsnr::geometry::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use yuvpsnr::report::TextReporter;
use yuvpsnr::{
    CompareParams, Comparison, FrameReport, PlanarMetrics, PsnrError, ShortReadPolicy,
    StreamReport,
};

/// PSNR between two raw planar YUV 4:2:0 video files
///
/// Both files must hold 8-bit samples laid out as Y(w*h) U(w*h/4) V(w*h/4)
/// per frame, with no header. Higher PSNR means more similar; identical
/// planes report `inf`.
#[derive(Parser, Debug)]
#[command(name = "yuvpsnr")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
#[command(after_help = "EXAMPLES:
    Compare two CIF sequences:
        yuvpsnr -i0 foreman.yuv -i1 foreman_decoded.yuv

    Per-frame table for 720p with up to 24 windows in flight:
        yuvpsnr -w 1280 -h 720 -t 8 -v -i0 ref.yuv -i1 out.yuv

    JSON for scripting:
        yuvpsnr --json -v -i0 ref.yuv -i1 out.yuv

EXIT CODES:
    0 - Success
    1 - An input file could not be opened
    2 - Any other error (bad arguments, truncated input, etc.)")]
struct Cli {
    /// Frame width in luma samples
    #[arg(short = 'w', value_name = "N", default_value_t = DEFAULT_WIDTH)]
    width: usize,

    /// Frame height in luma samples
    #[arg(short = 'h', value_name = "N", default_value_t = DEFAULT_HEIGHT)]
    height: usize,

    /// First input file (also accepted as -i0)
    #[arg(long = "i0", value_name = "PATH")]
    first: PathBuf,

    /// Second input file (also accepted as -i1)
    #[arg(long = "i1", value_name = "PATH")]
    second: PathBuf,

    /// Concurrency unit; up to 3*N plane windows are in flight
    #[arg(short = 't', value_name = "N", default_value_t = 1)]
    threads: usize,

    /// Print a line per frame
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// What to do when the inputs differ in length
    #[arg(long, value_enum, default_value = "reject")]
    short_read: ShortReadArg,

    /// Output JSON instead of the text table
    #[arg(long)]
    json: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShortReadArg {
    /// Fail when either input ends before the other
    Reject,
    /// Pad the shorter input with zeros
    ZeroFill,
}

impl From<ShortReadArg> for ShortReadPolicy {
    fn from(arg: ShortReadArg) -> Self {
        match arg {
            ShortReadArg::Reject => ShortReadPolicy::Reject,
            ShortReadArg::ZeroFill => ShortReadPolicy::ZeroFill,
        }
    }
}

#[derive(Serialize)]
struct JsonOutput {
    first: String,
    second: String,
    width: usize,
    height: usize,
    concurrency: usize,
    frames: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames_detail: Option<Vec<JsonFrame>>,
    total: JsonPsnr,
}

#[derive(Serialize)]
struct JsonFrame {
    frame: u64,
    #[serde(flatten)]
    psnr: JsonPsnr,
}

/// PSNR in dB; `null` stands for identical planes.
#[derive(Serialize)]
struct JsonPsnr {
    y: Option<f64>,
    u: Option<f64>,
    v: Option<f64>,
}

impl From<PlanarMetrics> for JsonPsnr {
    fn from(psnr: PlanarMetrics) -> Self {
        let db = |v: f64| v.is_finite().then_some(v);
        Self {
            y: db(psnr.y),
            u: db(psnr.u),
            v: db(psnr.v),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    setup_colors(&cli);
    init_tracing();

    run(&cli)
}

/// Rewrites the single-dash `-i0`/`-i1` flags to their long forms.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-i0") => OsString::from("--i0"),
            Some("-i1") => OsString::from("--i1"),
            _ => arg,
        })
        .collect()
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            if !io::stderr().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> ExitCode {
    let first = match open_input(&cli.first) {
        Ok(f) => f,
        Err(code) => return code,
    };
    let second = match open_input(&cli.second) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let params = CompareParams::new()
        .with_dimensions(cli.width, cli.height)
        .with_concurrency(cli.threads)
        .with_short_read(cli.short_read.into());
    let comparison = match Comparison::new(first, second, &params) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };

    let result = if cli.json {
        run_json(cli, comparison)
    } else {
        run_text(cli, comparison)
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn open_input(path: &Path) -> Result<BufReader<File>, ExitCode> {
    match File::open(path) {
        Ok(f) => Ok(BufReader::new(f)),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "open failed");
            eprintln!("Error: cannot open file '{}'", path.display());
            Err(ExitCode::from(1))
        }
    }
}

fn report_error(e: &PsnrError) -> ExitCode {
    if let PsnrError::Open { path, .. } = e {
        eprintln!("Error: cannot open file '{}'", path.display());
        return ExitCode::from(1);
    }
    eprintln!("{}: {}", "error".red().bold(), e);
    ExitCode::from(2)
}

type Input = BufReader<File>;

fn run_text(cli: &Cli, comparison: Comparison<Input, Input>) -> Result<(), PsnrError> {
    let mut reporter = TextReporter::new(io::stdout().lock(), cli.verbose);
    reporter.header()?;

    let mut write_error = None;
    let report = comparison.run(|frame| {
        if write_error.is_none() {
            write_error = reporter.frame(frame).err();
        }
    })?;
    if let Some(e) = write_error {
        return Err(e.into());
    }

    reporter.total(&report.totals)?;
    Ok(())
}

fn run_json(cli: &Cli, comparison: Comparison<Input, Input>) -> Result<(), PsnrError> {
    let mut frames: Vec<JsonFrame> = Vec::new();
    let report: StreamReport = comparison.run(|frame: &FrameReport| {
        if cli.verbose {
            frames.push(JsonFrame {
                frame: frame.index,
                psnr: frame.psnr.into(),
            });
        }
    })?;

    let output = JsonOutput {
        first: cli.first.display().to_string(),
        second: cli.second.display().to_string(),
        width: cli.width,
        height: cli.height,
        concurrency: cli.threads,
        frames: report.totals.frames,
        frames_detail: cli.verbose.then_some(frames),
        total: report.totals.psnr.into(),
    };
    write_json(&mut io::stdout().lock(), &output)
}

fn write_json(out: &mut impl Write, output: &JsonOutput) -> Result<(), PsnrError> {
    serde_json::to_writer_pretty(&mut *out, output).map_err(io::Error::from)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
