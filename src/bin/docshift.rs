//! CLI binary for docshift.
//!
//! A thin shim over the library crate: each subcommand loads its inputs,
//! stages them in a `ConversionSession` and writes the artifacts into the
//! output directory.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docshift::pipeline::input::load_inputs;
use docshift::{
    inspect, Capabilities, ConversionConfig, ConversionProgressCallback, ConversionSession,
    DirectoryEmitter, OperationKind, ProgressCallback, SplitMode,
};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner until the first unit completes, then
/// a bar over the units of the run, with one log line per written artifact.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_file_staged(&self, name: &str, index: usize) {
        self.bar
            .println(format!("  {} staged #{} {}", dim("•"), index + 1, name));
    }

    fn on_conversion_start(&self, kind: OperationKind, units: usize) {
        self.bar.set_prefix(kind.busy_label());
        self.bar.set_message(format!("{units} file(s)"));
    }

    fn on_unit_complete(&self, unit: usize, total: usize) {
        if self.bar.length() != Some(total as u64) {
            self.activate_bar(total);
        }
        self.bar.set_position(unit as u64);
    }

    fn on_artifact_emitted(&self, filename: &str, bytes: usize) {
        self.bar.println(format!(
            "  {} {:<28} {}",
            green("✓"),
            filename,
            dim(&HumanBytes(bytes as u64).to_string())
        ));
    }

    fn on_conversion_failed(&self, _kind: OperationKind, notice: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), bold(notice));
    }

    fn on_conversion_complete(&self, _kind: OperationKind, artifacts: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} file(s) written",
            green("✔"),
            bold(&artifacts.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Several JPEGs into one PDF, one image per page
  docshift images-to-pdf scan1.jpg scan2.jpg -o out/

  # Every page of a PDF as page_N.jpg
  docshift pdf-to-images report.pdf --scale 3

  # Merge (order is kept) and split
  docshift merge a.pdf b.pdf c.pdf
  docshift split report.pdf                    # page_1.pdf, page_2.pdf, …
  docshift split report.pdf --range "1-3, 5"   # extracted_pages.pdf

  # Office formats
  docshift pdf-to-word report.pdf
  docshift word-to-pdf letter.docx
  docshift slides-to-pdf deck.pptx

  # Inputs may be URLs
  docshift pdf-to-word https://example.com/paper.pdf

  # Page count only
  docshift inspect report.pdf

ENVIRONMENT VARIABLES:
  DOCSHIFT_OUTPUT_DIR       Default for --output-dir
  DOCSHIFT_SCALE            Default for --scale
  DOCSHIFT_QUALITY          Default for --quality
  PDFIUM_LIB_PATH           Path to an existing libpdfium (skips auto-download)
  PDFIUM_LOADER_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                  Override the log filter

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/docshift/pdfium-7690/.
"#;

/// Convert between images, PDF, Word and PowerPoint; merge and split PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "docshift",
    version,
    about = "Convert between images, PDF, Word and PowerPoint; merge and split PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    opts: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Directory to write output files into.
    #[arg(short, long, global = true, env = "DOCSHIFT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Refuse to overwrite existing output files.
    #[arg(long, global = true, env = "DOCSHIFT_NO_CLOBBER")]
    no_clobber: bool,

    /// Render scale for PDF pages (0.5–8.0).
    #[arg(long, global = true, env = "DOCSHIFT_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// JPEG quality for rendered pages (1–100).
    #[arg(long, global = true, env = "DOCSHIFT_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "DOCSHIFT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print run statistics as JSON on stdout.
    #[arg(long, global = true, env = "DOCSHIFT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "DOCSHIFT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSHIFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSHIFT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// JPEG images → one PDF, one image per page.
    ImagesToPdf {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// PDF → one JPEG per page.
    PdfToImages { input: String },
    /// PDF → Word document with the text of each page.
    PdfToWord { input: String },
    /// Word (.docx) → PDF of its raw text.
    WordToPdf { input: String },
    /// Two or more PDFs → one PDF, in the given order.
    Merge {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<String>,
    },
    /// PDF → one PDF per page, or one PDF of the pages in --range.
    Split {
        input: String,
        /// Pages to extract, e.g. "1-3, 5, 8-10".
        #[arg(long, env = "DOCSHIFT_RANGE")]
        range: Option<String>,
    },
    /// PowerPoint (.pptx) → PDF with one section per slide.
    SlidesToPdf { input: String },
    /// Print the page count of a PDF.
    Inspect { input: String },
}

impl Command {
    fn kind_and_inputs(&self) -> Option<(OperationKind, Vec<String>)> {
        let one = |s: &String| vec![s.clone()];
        Some(match self {
            Command::ImagesToPdf { inputs } => (OperationKind::ImageToDoc, inputs.clone()),
            Command::PdfToImages { input } => (OperationKind::DocToImage, one(input)),
            Command::PdfToWord { input } => (OperationKind::DocToWord, one(input)),
            Command::WordToPdf { input } => (OperationKind::WordToDoc, one(input)),
            Command::Merge { inputs } => (OperationKind::MergeDoc, inputs.clone()),
            Command::Split { input, .. } => (OperationKind::SplitDoc, one(input)),
            Command::SlidesToPdf { input } => (OperationKind::SlidesToDoc, one(input)),
            Command::Inspect { .. } => return None,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let opts = &cli.opts;

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are suppressed while the progress bar is visible.
    let show_progress = !opts.quiet && !opts.no_progress && !opts.json;
    let filter = if opts.verbose {
        "debug"
    } else if opts.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    ensure_engine(opts)?;
    let caps = Capabilities::native();

    // ── Inspect ──────────────────────────────────────────────────────────
    if let Command::Inspect { input } = &cli.command {
        let config = build_config(&cli, None)?;
        let pages = inspect(input, &config, &caps)
            .await
            .context("Failed to inspect PDF")?;
        if opts.json {
            println!("{}", serde_json::json!({ "file": input, "pages": pages }));
        } else {
            println!("File:   {input}");
            println!("Pages:  {pages}");
        }
        return Ok(());
    }

    let Some((kind, inputs)) = cli.command.kind_and_inputs() else {
        return Ok(());
    };

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Stage ────────────────────────────────────────────────────────────
    let files = load_inputs(&inputs, opts.download_timeout)
        .await
        .context("Failed to load input")?;
    let mut session = ConversionSession::new(kind, config, caps);
    for file in files {
        let name = file.name.clone();
        session
            .stage(file)
            .with_context(|| format!("Cannot use '{name}' for {kind}"))?;
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let mut emitter = DirectoryEmitter::new(&opts.output_dir)
        .with_context(|| format!("Cannot write to {}", opts.output_dir.display()))?;
    if opts.no_clobber {
        emitter = emitter.no_clobber();
    }

    let output = session
        .run(&mut emitter)
        .await
        .with_context(|| kind.failure_notice())?;

    if opts.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output.stats).context("Failed to serialise stats")?
        );
    } else if !opts.quiet {
        let total = HumanBytes(output.stats.output_bytes).to_string();
        eprintln!(
            "{}  {} file(s)  {}  {}ms  →  {}",
            cyan("◆"),
            output.stats.artifacts,
            dim(&total),
            output.stats.duration_ms,
            bold(&emitter.dir().display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let opts = &cli.opts;
    let split_mode = match &cli.command {
        Command::Split {
            range: Some(range), ..
        } => SplitMode::Range(range.clone()),
        _ => SplitMode::All,
    };

    let mut builder = ConversionConfig::builder()
        .render_scale(opts.scale)
        .jpeg_quality(opts.quality)
        .split_mode(split_mode)
        .download_timeout_secs(opts.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Make sure libpdfium is present, downloading it with a progress bar on the
/// first run.
fn ensure_engine(opts: &GlobalOpts) -> Result<()> {
    if pdfium_loader::is_available_offline() {
        return Ok(());
    }

    if opts.quiet {
        tokio::task::block_in_place(|| pdfium_loader::ensure_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_loader::ensure_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length() != Some(t) {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}
