//! CLI binary for mailpdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the merged PDF.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mailpdf::pipeline::input::resolve_input;
use mailpdf::{
    assemble_html, convert, inspect, ConversionConfig, ConversionProgressCallback, HeaderLabels,
    MediaType, ProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

/// Progress bar over the top-level attachments. Attachments finish out of
/// order, so start times are tracked per index.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Decoding mail…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} attachments  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_attachments: usize) {
        self.activate_bar(total_attachments);
        if total_attachments > 0 {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Converting {total_attachments} attachments…"))
            ));
        }
    }

    fn on_attachment_start(&self, index: usize, _total: usize, filename: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(filename.to_string());
    }

    fn on_attachment_complete(&self, index: usize, total: usize, pdf_len: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} Attachment {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{pdf_len:>8} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_attachment_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Attachment {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_attachments: usize, succeeded: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed > 0 {
            eprintln!(
                "{} {}/{} attachments converted  ({} failed)",
                red("✘"),
                bold(&succeeded.to_string()),
                total_attachments,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert an Outlook message (PDF to stdout)
  mail2pdf mail.msg > mail.pdf

  # Convert to file with Dutch header labels
  mail2pdf --labels dutch mail.msg -o mail.pdf

  # Use a specific rendering service
  mail2pdf --gotenberg-url http://localhost:3000 forwarded.eml -o out.pdf

  # Convert from URL
  mail2pdf https://example.com/archive/mail.eml -o mail.pdf

  # Show headers and attachment routing (no renderer needed)
  mail2pdf --inspect mail.msg

  # Print the assembled body HTML (no renderer needed)
  mail2pdf --html-only mail.msg > body.html

  # JSON report next to the PDF
  mail2pdf --json mail.msg -o mail.pdf > report.json

ENVIRONMENT VARIABLES:
  GOTENBERG_URL        Base URL of the Gotenberg rendering service
  MAIL2PDF_*           Fallback for every flag (e.g. MAIL2PDF_LABELS=dutch)
  RUST_LOG             Overrides the log filter (e.g. mailpdf=debug)
"#;

/// Convert Outlook .msg and MIME .eml mails to a single merged PDF.
#[derive(Parser, Debug)]
#[command(
    name = "mail2pdf",
    version,
    about = "Convert .msg and .eml mails (with attachments) to one PDF",
    long_about = "Convert Outlook .msg and MIME .eml mails to a single PDF: the mail body with \
a header block, followed by every attachment converted by a Gotenberg-compatible rendering \
service. Nested mails are converted recursively.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .msg/.eml file path or HTTP/HTTPS URL.
    input: String,

    /// Write the PDF to this file instead of stdout.
    #[arg(short, long, env = "MAIL2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Base URL of the Gotenberg service.
    #[arg(long, env = "GOTENBERG_URL")]
    gotenberg_url: Option<String>,

    /// Request id used in log lines and error messages. Default: file name.
    #[arg(long, env = "MAIL2PDF_REQUEST_ID")]
    request_id: Option<String>,

    /// Header label language.
    #[arg(long, env = "MAIL2PDF_LABELS", value_enum, default_value = "english")]
    labels: LabelsArg,

    /// IANA timezone for header dates.
    #[arg(long, env = "MAIL2PDF_TIMEZONE", default_value = "Europe/Amsterdam")]
    timezone: String,

    /// Locale for weekday and month names in header dates.
    #[arg(long, env = "MAIL2PDF_LOCALE", default_value = "nl_NL")]
    locale: String,

    /// strftime pattern for header dates.
    #[arg(long, env = "MAIL2PDF_DATE_FORMAT", default_value = "%A %-d-%m-%Y %H:%M")]
    date_format: String,

    /// Font family applied when the mail declares none.
    #[arg(long, env = "MAIL2PDF_FONT", default_value = "Verdana")]
    font: String,

    /// Width in px for inline images without a declared size.
    #[arg(long, env = "MAIL2PDF_INLINE_WIDTH", default_value_t = 500)]
    inline_width: u32,

    /// Attachments converted concurrently.
    #[arg(short, long, env = "MAIL2PDF_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Maximum depth of mails nested in mails.
    #[arg(long, env = "MAIL2PDF_MAX_DEPTH", default_value_t = 8)]
    max_depth: usize,

    /// Page margin in inches, all sides.
    #[arg(long, env = "MAIL2PDF_MARGIN", default_value_t = 0.5)]
    margin: f32,

    /// Render the mail body in landscape.
    #[arg(long, env = "MAIL2PDF_LANDSCAPE")]
    landscape: bool,

    /// CSS media type emulated while rendering the body.
    #[arg(long, env = "MAIL2PDF_MEDIA", value_enum, default_value = "screen")]
    media: MediaArg,

    /// Per-request timeout for the rendering service, in seconds.
    #[arg(long, env = "MAIL2PDF_REQUEST_TIMEOUT", default_value_t = 120)]
    request_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "MAIL2PDF_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the assembled body HTML instead of rendering.
    #[arg(long, conflicts_with = "inspect")]
    html_only: bool,

    /// Print headers and attachments only, no conversion.
    #[arg(long)]
    inspect: bool,

    /// Print a JSON report (ConversionOutput / MailSummary) on stdout.
    #[arg(long, env = "MAIL2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "MAIL2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MAIL2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MAIL2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LabelsArg {
    English,
    Dutch,
}

impl From<LabelsArg> for HeaderLabels {
    fn from(v: LabelsArg) -> Self {
        match v {
            LabelsArg::English => HeaderLabels::english(),
            LabelsArg::Dutch => HeaderLabels::dutch(),
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum MediaArg {
    Screen,
    Print,
}

impl From<MediaArg> for MediaType {
    fn from(v: MediaArg) -> Self {
        match v {
            MediaArg::Screen => MediaType::Screen,
            MediaArg::Print => MediaType::Print,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // PDF bytes may go to stdout, so logs and the bar always use stderr.
    let to_stdout = cli.output.is_none() && !cli.inspect && !cli.html_only;
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect && !cli.html_only;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let mut source = resolve_input(&cli.input, config.download_timeout_secs)
        .await
        .with_context(|| format!("Failed to read '{}'", cli.input))?;
    if let Some(ref id) = cli.request_id {
        source.id = id.clone();
    }

    // ── Inspect mode ─────────────────────────────────────────────────────
    if cli.inspect {
        let summary = inspect(&source, &config).context("Failed to inspect mail")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        } else {
            println!("File:         {}", summary.name);
            println!("Format:       {}", summary.format);
            for h in &summary.headers {
                println!("{:<14}{}", h.label, h.value);
            }
            println!("Body:         {} ({} chars)", summary.body_kind, summary.body_chars);
            for a in &summary.attachments {
                println!(
                    "  {} {}  {}  {}",
                    cyan("•"),
                    a.label,
                    dim(&format!("{} bytes, {}", a.size, a.content_type)),
                    dim(&format!("→ {}", a.route)),
                );
            }
            for a in &summary.inline_attachments {
                println!(
                    "  {} {}  {}",
                    dim("◦"),
                    a.filename,
                    dim(&format!("inline cid:{}", a.content_id.as_deref().unwrap_or(""))),
                );
            }
        }
        return Ok(());
    }

    // ── HTML-only mode ───────────────────────────────────────────────────
    if cli.html_only {
        let assembled = assemble_html(&source, &config).context("Failed to assemble mail")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&assembled).context("Failed to serialize output")?
            );
        } else if let Some(ref path) = cli.output {
            tokio::fs::write(path, &assembled.html)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        } else {
            println!("{}", assembled.html);
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(source, &config).await.context("Conversion failed")?;

    if let Some(ref path) = cli.output {
        write_atomic(path, &output.pdf).await?;
    } else if to_stdout && !cli.json {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(&output.pdf)
            .context("Failed to write to stdout")?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let target = cli
            .output
            .as_ref()
            .map(|p| bold(&p.display().to_string()))
            .unwrap_or_else(|| "stdout".to_string());
        eprintln!(
            "{}  {} attachments, {} inline images  {} bytes  {}ms  →  {}",
            green("✔"),
            output.stats.total_attachments,
            output.stats.inline_images,
            output.stats.total_pdf_bytes,
            output.stats.total_duration_ms,
            target,
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .labels(cli.labels.clone().into())
        .timezone_name(&cli.timezone)
        .date_locale_name(&cli.locale)
        .date_format(cli.date_format.clone())
        .default_font_family(cli.font.clone())
        .inline_image_width_px(cli.inline_width)
        .concurrency(cli.concurrency)
        .max_nesting_depth(cli.max_depth)
        .margins(cli.margin)
        .landscape(cli.landscape)
        .media_type(cli.media.clone().into())
        .request_timeout_secs(cli.request_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref url) = cli.gotenberg_url {
        builder = builder.gotenberg_url(url.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Write via temp file + rename so a failed run never leaves a partial PDF.
async fn write_atomic(path: &Path, pdf: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp, pdf)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
