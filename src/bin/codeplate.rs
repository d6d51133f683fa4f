//! CLI binary for codeplate.
//!
//! `serve` runs the HTTP API; `generate` stamps a template file from the
//! command line and writes the PDF locally.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use codeplate::pipeline::template::content_type_for_path;
use codeplate::{
    export_to_file, load_template_async, BatchProgressCallback, GenerationConfig, ProgressCallback,
    ServiceConfig, DEFAULT_FONT_SIZE, MAX_PAGES,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

/// Terminal progress bar over the pages of one batch.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Stamping");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.reset_eta();
    }

    fn on_page_composed(&self, _page_num: usize, _total_pages: usize, value: &str) {
        self.bar.set_message(value.to_string());
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_pages: usize, _pdf_bytes: usize) {
        // The summary line is printed once the file is on disk.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP API for the web frontend
  codeplate serve --bind 127.0.0.1:8000

  # Stamp QR codes ID-1 … ID-50 onto a label
  echo '{"start_value":1,"end_value":50,"prefix":"ID-","include_qr":true,"show_qr_text":true}' > batch.json
  codeplate generate label.png --config batch.json -o labels.pdf

  # Use the first page of a PDF as the template
  codeplate generate form.pdf --config batch.json -o forms.pdf

CONFIG FILE:
  The same JSON the web frontend sends as `config_data`. Only start_value and
  end_value are required. Other fields and their defaults:
    prefix ""             include_qr false       include_barcode false
    show_qr_text false    show_barcode_text false
    qr_size 100           qr_x 100               qr_y 100
    barcode_width 200     barcode_height 50      barcode_x 100
    barcode_y 200         text_offset_y 10

ENVIRONMENT VARIABLES:
  CODEPLATE_BIND          Address for `serve` (default 0.0.0.0:8000)
  CODEPLATE_MAX_PAGES     Page ceiling per batch (default 100)
  PDFIUM_LIB_PATH         Path to libpdfium, needed for PDF templates
  RUST_LOG                Override the log filter
"#;

/// Stamp QR codes and barcodes onto templates.
#[derive(Parser, Debug)]
#[command(
    name = "codeplate",
    version,
    about = "Stamp QR codes and Code128 barcodes onto an image or PDF template",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CODEPLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CODEPLATE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Stamp a template file and write the batch as PDF.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct LimitArgs {
    /// Maximum pages per batch.
    #[arg(long, env = "CODEPLATE_MAX_PAGES", default_value_t = MAX_PAGES)]
    max_pages: usize,

    /// Label glyph size in pixels.
    #[arg(long, env = "CODEPLATE_FONT_SIZE", default_value_t = DEFAULT_FONT_SIZE)]
    font_size: u32,

    /// Scale factor when rasterising a PDF template (1.0 = 72 DPI).
    #[arg(long, env = "CODEPLATE_PDF_SCALE", default_value_t = 2.0)]
    pdf_scale: f32,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "CODEPLATE_BIND", default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Allowed CORS origin; repeat for several. Defaults to the bundled frontend's.
    #[arg(long = "allowed-origin", env = "CODEPLATE_ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Largest accepted request body in MiB.
    #[arg(long, env = "CODEPLATE_MAX_BODY_MIB", default_value_t = 50)]
    max_body_mib: usize,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Template file: PNG, JPEG or PDF (first page is used).
    template: PathBuf,

    /// JSON batch configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Output PDF path.
    #[arg(short, long, default_value = "generated_codes.pdf")]
    output: PathBuf,

    /// Disable progress bar.
    #[arg(long, env = "CODEPLATE_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    limits: LimitArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // A progress bar replaces INFO-level library logs during `generate`.
    let show_progress = match &cli.command {
        Command::Generate(args) => !cli.quiet && !args.no_progress,
        Command::Serve(_) => false,
    };
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

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Generate(args) => run_generate(args, show_progress, cli.quiet).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut builder = service_builder(&args.limits)
        .max_body_bytes(args.max_body_mib.saturating_mul(1024 * 1024));
    if !args.allowed_origins.is_empty() {
        builder = builder.allowed_origins(args.allowed_origins);
    }
    let service = builder.build().context("Invalid configuration")?;

    codeplate::serve(args.bind, service)
        .await
        .with_context(|| format!("Server on {} failed", args.bind))
}

async fn run_generate(args: GenerateArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let started = Instant::now();
    let service = service_builder(&args.limits)
        .build()
        .context("Invalid configuration")?;

    let config_json = tokio::fs::read_to_string(&args.config)
        .await
        .with_context(|| format!("Failed to read config from {:?}", args.config))?;
    let config = GenerationConfig::from_json(&config_json).context("Invalid batch config")?;

    let bytes = tokio::fs::read(&args.template)
        .await
        .with_context(|| format!("Failed to read template {:?}", args.template))?;
    let content_type = content_type_for_path(&args.template, &bytes).to_string();
    let template = load_template_async(bytes, content_type, &service)
        .await
        .context("Failed to load template")?;

    if !quiet {
        let (w, h) = template.dimensions();
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Template {w}×{h} px, {} pages", config.page_count()))
        );
    }

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let pages = export_to_file(template, config, &service, &args.output, progress)
        .await
        .context("Generation failed")?;

    if !quiet {
        eprintln!(
            "{}  {} pages  {}  →  {}",
            green("✔"),
            pages,
            dim(&format!("{}ms", started.elapsed().as_millis())),
            bold(&args.output.display().to_string()),
        );
    }
    Ok(())
}

fn service_builder(limits: &LimitArgs) -> codeplate::ServiceConfigBuilder {
    ServiceConfig::builder()
        .max_pages(limits.max_pages)
        .font_size(limits.font_size)
        .pdf_render_scale(limits.pdf_scale)
}
