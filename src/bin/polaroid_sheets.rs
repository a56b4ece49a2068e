//! CLI binary for polaroid-sheets.
//!
//! A thin shim over the library crate that maps CLI flags to `SheetConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use polaroid_sheets::{
    generate, generate_to_file, print_sheets, ProgressCallback, SheetConfig, SheetError,
    SheetProgressCallback, DEFAULT_OUTPUT_NAME,
};
use std::io::{self, Write};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one progress bar, re-armed for each phase
/// (loading photos, then generating pages), plus per-event log lines.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set by on_ingest_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Re-arm the bar for a phase with a known total.
    fn arm(&self, prefix: &'static str, noun: &'static str, total: usize) {
        let style = ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {noun}  ⏱ {{elapsed_precise}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_style(style);
        self.bar.set_prefix(prefix);
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }
}

impl SheetProgressCallback for CliProgressCallback {
    fn on_ingest_start(&self, total_files: usize) {
        self.arm("Loading", "photos", total_files);
    }

    fn on_file_done(&self, _current: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_file_dropped(&self, current: usize, total: usize, reason: &str) {
        let msg = if reason.chars().count() > 72 {
            let head: String = reason.chars().take(71).collect();
            format!("{head}\u{2026}")
        } else {
            reason.to_string()
        };
        self.bar.println(format!(
            "  {} Photo {:>3}/{:<3}  {}",
            red("✗"),
            current,
            total,
            red(&msg),
        ));
    }

    fn on_export_start(&self, total_pages: usize) {
        self.arm("Generating", "pages", total_pages);
    }

    fn on_page_complete(&self, page_num: usize, total: usize, failed_cells: usize) {
        if failed_cells == 0 {
            self.bar.println(format!(
                "  {} Page {:>2}/{:<2}",
                green("✓"),
                page_num,
                total
            ));
        } else {
            self.bar.println(format!(
                "  {} Page {:>2}/{:<2}  {}",
                cyan("⚠"),
                page_num,
                total,
                dim(&format!("{failed_cells} cell(s) blank")),
            ));
        }
        self.bar.inc(1);
    }

    fn on_page_skipped(&self, page_num: usize, total: usize, reason: &str) {
        self.bar.println(format!(
            "  {} Page {:>2}/{:<2}  {}",
            red("✗"),
            page_num,
            total,
            red(reason),
        ));
        self.bar.inc(1);
    }

    fn on_export_complete(&self, total_pages: usize, written_pages: usize) {
        self.bar.finish_and_clear();
        let skipped = total_pages.saturating_sub(written_pages);
        if skipped == 0 {
            eprintln!(
                "{} {} page(s) generated",
                green("✔"),
                bold(&written_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} page(s) generated  ({} skipped)",
                cyan("⚠"),
                bold(&written_pages.to_string()),
                total_pages,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Lay out a folder of photos and export the default PDF
  polaroid-sheets vacation/

  # Explicit files, custom output path
  polaroid-sheets a.jpg b.png c.heic -o sheets.pdf

  # Send the sheets straight to the system printer
  polaroid-sheets vacation/ --print

  # Denser grid, higher raster quality
  polaroid-sheets vacation/ --per-page 20 --columns 4 --scale 3

  # Machine-readable run statistics
  polaroid-sheets vacation/ --json > stats.json

LAYOUT:
  Each A4 page (210 × 297 mm, portrait) holds up to 15 photos in a
  3 × 5 grid. Photos are rotated 90° and cover-cropped into their cells,
  preserving their native aspect ratio. Pages fill in input order; the
  last page holds the remainder.

INPUT FORMATS:
  JPEG, PNG, GIF, WebP, BMP, TIFF are read directly. HEIC/HEIF files are
  transcoded to JPEG when the binary is built with `--features heif`
  (needs the system libheif); otherwise they are dropped with a warning.
  Files that fail to read or decode are dropped and counted — the batch
  never stops for one bad photo.

ENVIRONMENT VARIABLES:
  POLAROID_OUTPUT       Default output path (same as --output)
  POLAROID_SCALE        Default raster scale (same as --scale)
  POLAROID_NO_PROGRESS  Disable the progress bar
"#;

/// Batch photos into print-ready A4 sheets of polaroid-style cells.
#[derive(Parser, Debug)]
#[command(
    name = "polaroid-sheets",
    version,
    about = "Batch photos into print-ready A4 sheets of polaroid-style cells",
    long_about = "Lay out batches of photos as A4 sheets of polaroid-style cells \
(rotated 90°, cover-cropped, 15 per page) and export them as a multi-page PDF \
or send them straight to the system printer.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Photo files and/or directories (directories are scanned, sorted by name).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write the PDF to this path.
    #[arg(short, long, env = "POLAROID_OUTPUT", default_value = DEFAULT_OUTPUT_NAME)]
    output: PathBuf,

    /// Send the sheets to the system print spooler instead of writing a file.
    #[arg(long, conflicts_with = "json")]
    print: bool,

    /// Photos per page.
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(usize))]
    per_page: usize,

    /// Grid columns per page (rows follow from --per-page).
    #[arg(long, default_value_t = 3,
          value_parser = clap::value_parser!(usize))]
    columns: usize,

    /// Raster density multiplier over 96 DPI (2 = 192 DPI).
    #[arg(long, env = "POLAROID_SCALE", default_value_t = 2,
          value_parser = clap::value_parser!(u32).range(1..=4))]
    scale: u32,

    /// Per-photo decode budget in seconds during page composition.
    #[arg(long, default_value_t = 5)]
    cell_timeout: u64,

    /// JPEG quality for HEIC/HEIF transcoding (0.1–1.0).
    #[arg(long, default_value_t = 0.9)]
    jpeg_quality: f32,

    /// Print run statistics as JSON to stdout instead of the summary line.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "POLAROID_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Expand inputs ────────────────────────────────────────────────────
    let files = expand_inputs(&cli.inputs)?;
    if files.is_empty() {
        anyhow::bail!(
            "No images to lay out: nothing matched the given path(s).\n\
             Point at image files or a directory containing them."
        );
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SheetProgressCallback>)
    } else {
        None
    };

    let mut builder = SheetConfig::builder()
        .page_capacity(cli.per_page)
        .columns(cli.columns)
        .scale(cli.scale)
        .cell_timeout_secs(cli.cell_timeout)
        .jpeg_quality(cli.jpeg_quality)
        .output_path(cli.output.clone());
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let result = if cli.print {
        print_sheets(&files, &config).await
    } else if cli.json {
        generate(&files, &config).await
    } else {
        generate_to_file(&files, &cli.output, &config).await
    };

    let output = match result {
        Ok(output) => output,
        // The empty-input contract deserves a friendly terminal message
        // rather than an error chain.
        Err(e @ SheetError::NoImages { .. }) => {
            eprintln!("{} {}", red("✘"), e);
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Sheet generation failed")),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(json.as_bytes()).context("stdout")?;
        handle.write_all(b"\n").ok();
    } else if !cli.quiet {
        let s = &output.stats;
        let destination = if cli.print {
            "sent to printer".to_string()
        } else {
            bold(&cli.output.display().to_string())
        };
        eprintln!(
            "{}  {} page(s)  {} photo(s)  {}ms  →  {}",
            if s.skipped_pages == 0 && s.dropped_files == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            s.written_pages,
            s.ingested_files,
            s.total_duration_ms,
            destination,
        );
        if s.dropped_files > 0 {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{} of {} file(s) dropped during ingestion — see warnings above",
                    s.dropped_files, s.attempted_files
                ))
            );
        }
    }

    Ok(())
}

/// Expand files and directories into an ordered flat file list.
///
/// Directories contribute their image-suffixed entries sorted by name;
/// explicit files pass through untouched so callers control their order.
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    const SUFFIXES: &[&str] = &[
        "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "heic", "heif",
    ];

    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .map(|e| SUFFIXES.contains(&e.to_ascii_lowercase().as_str()))
                        .unwrap_or(false)
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}
