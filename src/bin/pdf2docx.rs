//! CLI binary for sinhala-pdf2docx.
//!
//! A thin shim over the library crate: `serve` runs the web service,
//! `convert` runs one conversion in the terminal, `check` probes the engines.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sinhala_pdf2docx::pipeline::input;
use sinhala_pdf2docx::{
    server, ConversionConfig, ConversionProgressCallback, Converter, NoopProgressCallback,
    PdfiumRasteriser, ServerConfig, TesseractRecogniser,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Spinner while pdfium renders, then a page bar while tesseract runs.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            page_started: Mutex::new(None),
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_rasterise_start(&self) {
        self.bar.set_prefix("Rendering");
        self.bar.set_message("PDF → images");
    }

    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_pages as u64);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let elapsed_ms = self
            .page_started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} bytes")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        // Clears the spinner when a conversion fails halfway.
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the web service on port 5000
  pdf2docx serve

  # Different port and working directories
  pdf2docx serve --bind 127.0.0.1:8080 --upload-dir /var/tmp/up --output-dir /srv/docx

  # Convert one file in the terminal
  pdf2docx convert scan.pdf -o scan.docx

  # Check that pdfium and tesseract (with the Sinhala model) are usable
  pdf2docx check

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_DIR              Directory containing libpdfium
  TESSERACT_PATH              tesseract binary (default: tesseract on PATH)
  TESSDATA_PREFIX             Directory containing sin.traineddata
  PDF2DOCX_LANGUAGE           Tesseract language code(s) (default: sin)
  PDF2DOCX_PSM                Tesseract page segmentation mode (0–13)
  PDF2DOCX_DPI                Rendering DPI (default: 200)
  PDF2DOCX_RAW_TEXT           Keep raw OCR output
  PDF2DOCX_VERBOSE            Enable DEBUG-level logs
  PDF2DOCX_QUIET              Errors only
  PDF2DOCX_BIND               serve: listen address
  PDF2DOCX_UPLOAD_DIR         serve: where uploads are stored
  PDF2DOCX_OUTPUT_DIR         serve: where .docx files are written
  PDF2DOCX_MAX_UPLOAD_MB      serve: largest accepted upload
  PDF2DOCX_RETENTION_SECS     serve: keep finished jobs this long (0 = forever)
  PDF2DOCX_SWEEP_SECS         serve: how often expired jobs are removed
  PDF2DOCX_NO_PROGRESS        convert: no progress bar
  RUST_LOG                    Override the log filter

SETUP:
  Debian/Ubuntu:  apt install tesseract-ocr tesseract-ocr-sin
  PDFium:         download a build from bblanchon/pdfium-binaries and point
                  PDFIUM_LIB_DIR at its lib/ directory
"#;

/// Convert scanned Sinhala PDFs to Word documents with OCR.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docx",
    version,
    about = "Convert scanned Sinhala PDFs to Word documents with OCR",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2DOCX_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web service.
    Serve(ServeArgs),
    /// Convert one PDF in the terminal.
    Convert(ConvertArgs),
    /// Check that the OCR and PDF engines are usable.
    Check(EngineArgs),
}

/// Engine locations and OCR settings shared by every subcommand.
#[derive(Args, Debug)]
struct EngineArgs {
    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_DIR")]
    pdfium_lib_dir: Option<PathBuf>,

    /// tesseract binary.
    #[arg(long, env = "TESSERACT_PATH", default_value = "tesseract")]
    tesseract_path: PathBuf,

    /// Directory containing tesseract language models.
    #[arg(long, env = "TESSDATA_PREFIX")]
    tessdata_dir: Option<PathBuf>,

    /// Tesseract language code(s), e.g. sin or sin+eng.
    #[arg(long, env = "PDF2DOCX_LANGUAGE", default_value = "sin")]
    language: String,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "PDF2DOCX_PSM",
          value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF2DOCX_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Keep raw OCR output (no whitespace / form-feed cleanup).
    #[arg(long, env = "PDF2DOCX_RAW_TEXT")]
    raw_text: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Address to listen on.
    #[arg(long, env = "PDF2DOCX_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Where uploaded PDFs are stored while they convert.
    #[arg(long, env = "PDF2DOCX_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Where finished .docx files are written.
    #[arg(long, env = "PDF2DOCX_OUTPUT_DIR", default_value = "converts")]
    output_dir: PathBuf,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "PDF2DOCX_MAX_UPLOAD_MB", default_value_t = 100)]
    max_upload_mb: usize,

    /// Keep finished jobs and their documents this many seconds (0 = forever).
    #[arg(long, env = "PDF2DOCX_RETENTION_SECS", default_value_t = 24 * 60 * 60)]
    retention_secs: u64,

    /// Seconds between retention sweeps.
    #[arg(long, env = "PDF2DOCX_SWEEP_SECS", default_value_t = 600)]
    sweep_secs: u64,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Scanned PDF to convert.
    input: PathBuf,

    /// Output .docx (default: input with a .docx extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "PDF2DOCX_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs during `convert`.
    let show_progress = matches!(&cli.command, Command::Convert(a) if !a.no_progress) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info,tower_http=debug"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args, show_progress, cli.quiet).await,
        Command::Check(args) => run_check(args).await,
    }
}

/// Map engine args to `ConversionConfig`.
fn build_config(args: &EngineArgs) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .tesseract_path(&args.tesseract_path)
        .language(&args.language)
        .dpi(args.dpi)
        .clean_text(!args.raw_text);
    if let Some(ref dir) = args.pdfium_lib_dir {
        builder = builder.pdfium_library_dir(dir);
    }
    if let Some(ref dir) = args.tessdata_dir {
        builder = builder.tessdata_dir(dir);
    }
    if let Some(psm) = args.psm {
        builder = builder.page_segmentation_mode(psm);
    }
    builder.build().context("Invalid configuration")
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = build_config(&args.engine)?;
    let server_config = ServerConfig {
        bind: args.bind,
        upload_dir: args.upload_dir,
        output_dir: args.output_dir,
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
        retention: (args.retention_secs > 0).then(|| Duration::from_secs(args.retention_secs)),
        sweep_interval: Duration::from_secs(args.sweep_secs.max(1)),
    };

    server::serve(&config, server_config)
        .await
        .context("Server failed")
}

async fn run_convert(args: ConvertArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let config = build_config(&args.engine)?;
    let input = input::resolve_local(&args.input).context("Cannot read input")?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension("docx"));

    let converter = Converter::new(&config);
    let result = if show_progress {
        let cb = CliProgressCallback::new();
        converter.convert_to_file(&input, &output, &cb).await
    } else {
        converter
            .convert_to_file(&input, &output, &NoopProgressCallback)
            .await
    };
    let result = result.context("Conversion failed")?;

    if !quiet {
        let stats = &result.stats;
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            stats.total_pages,
            stats.total_duration_ms,
            bold(&output.display().to_string()),
        );
        eprintln!(
            "   {} characters  /  {} empty pages  /  render {}ms, OCR {}ms",
            dim(&stats.total_chars.to_string()),
            dim(&stats.empty_pages.to_string()),
            stats.render_duration_ms,
            stats.ocr_duration_ms,
        );
    }
    Ok(())
}

async fn run_check(args: EngineArgs) -> Result<()> {
    let config = build_config(&args)?;
    let mut ok = true;

    match PdfiumRasteriser::from_config(&config).probe().await {
        Ok(()) => eprintln!("{} pdfium      bound", green("✓")),
        Err(e) => {
            ok = false;
            eprintln!("{} pdfium      {}", red("✗"), e);
        }
    }

    match TesseractRecogniser::from_config(&config).probe().await {
        Ok(probe) if probe.language_available => {
            eprintln!(
                "{} tesseract   {}  (language '{}' installed)",
                green("✓"),
                probe.version,
                config.language
            );
        }
        Ok(probe) => {
            ok = false;
            eprintln!(
                "{} tesseract   {}  but language '{}' is missing",
                red("✗"),
                probe.version,
                config.language
            );
        }
        Err(e) => {
            ok = false;
            eprintln!("{} tesseract   {}", red("✗"), e);
        }
    }

    if !ok {
        bail!("One or more engines are not usable");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn env_vars(cmd: &clap::Command, out: &mut Vec<String>) {
        for arg in cmd.get_arguments() {
            if let Some(env) = arg.get_env() {
                out.push(env.to_string_lossy().into_owned());
            }
        }
        for sub in cmd.get_subcommands() {
            env_vars(sub, out);
        }
    }

    #[test]
    fn after_help_lists_every_env_var() {
        let mut vars = Vec::new();
        env_vars(&Cli::command(), &mut vars);
        assert!(vars.iter().any(|v| v == "PDF2DOCX_SWEEP_SECS"));
        for var in vars {
            assert!(AFTER_HELP.contains(&var), "{var} missing from --help");
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
