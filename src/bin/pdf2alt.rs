//! CLI binary for pdf2alt.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`,
//! drives a run, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2alt::{
    generate_to_file, inspect, validate_key, Language, ProgressCallback, Provider, RunConfig,
    RunProgressCallback,
};
use std::io;
use std::path::PathBuf;
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
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-image log
/// lines using [indicatif]. Images are processed one at a time, so events
/// always arrive in order.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Wall-clock start of the image currently in flight.
    current_start: Mutex<Option<Instant>>,
    /// Count of images that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically by
    /// `on_run_start` (called once extraction has counted the images).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Extracting images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current_start: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Describing");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.current_start
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_images} image(s), generating alt-text…"))
        ));
    }

    fn on_image_start(&self, page: u32, index: usize) {
        *self.current_start.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(format!("page {page}, image {index}"));
    }

    fn on_image_complete(&self, page: u32, index: usize, alt_text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3} image {:<2}  {:<10}  {}",
            green("✓"),
            page,
            index,
            dim(&format!("{alt_text_len:>4} chars")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, page: u32, index: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            let mut end = 79;
            while !error.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}\u{2026}", &error[..end])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3} image {:<2}  {}  {}",
            red("✗"),
            page,
            index,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_images: usize, success_count: usize) {
        let failed = total_images.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} image(s) described successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} image(s) described  ({} failed)",
                if failed == total_images {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_images,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic run (writes outputs/generated_texts/document_alt_text.txt)
  pdf2alt document.pdf

  # Groq with Dutch output, 3 lines per image
  pdf2alt --provider groq --language dutch --lines 3 document.pdf

  # Specific model and output directory
  pdf2alt --provider openai --model gpt-4o --output-dir alt/ report.pdf

  # From a URL
  pdf2alt https://example.com/brochure.pdf

  # Count images without an API key
  pdf2alt --inspect-only document.pdf

  # Validate the configured key and exit
  pdf2alt --check-key --provider groq document.pdf

  # Structured JSON on stdout
  pdf2alt --json document.pdf > run.json

SUPPORTED PROVIDERS & DEFAULT MODELS:
  Provider   Default model                              Key env var
  ─────────  ─────────────────────────────────────────  ───────────────
  openai     gpt-4o-mini                                OPENAI_API_KEY
  groq       meta-llama/llama-4-scout-17b-16e-instruct  GROQ_API_KEY

LANGUAGES:
  english (en), dutch (nl), spanish (es), french (fr), german (de)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY   OpenAI API key
  GROQ_API_KEY     Groq API key

SETUP:
  1. Set API key:  export OPENAI_API_KEY=sk-...
  2. Run:          pdf2alt document.pdf
"#;

/// Generate accessibility alt-text for images embedded in PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2alt",
    version,
    about = "Generate alt-text for PDF images using Vision LLMs",
    long_about = "Extract the raster images embedded in a PDF (local file or URL) and generate \
accessibility alt-text for each one using a vision language model. Supports OpenAI and Groq. \
Writes one label per image to a plain-text file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Vision provider: openai or groq.
    #[arg(long, env = "PDF2ALT_PROVIDER", default_value = "openai")]
    provider: String,

    /// API key for the provider. Falls back to OPENAI_API_KEY / GROQ_API_KEY.
    #[arg(long, env = "PDF2ALT_API_KEY")]
    api_key: Option<String>,

    /// Vision model ID. Defaults to the provider's default model.
    #[arg(long, env = "PDF2ALT_MODEL")]
    model: Option<String>,

    /// Output language: english, dutch, spanish, french, german (or en/nl/es/fr/de).
    #[arg(long, env = "PDF2ALT_LANGUAGE", default_value = "english")]
    language: String,

    /// Requested alt-text lines per image (1–5).
    #[arg(long, env = "PDF2ALT_LINES", default_value_t = 2,
          value_parser = clap::value_parser!(u8).range(1..=5))]
    lines: u8,

    /// Directory the output text file is written into.
    #[arg(long, env = "PDF2ALT_OUTPUT_DIR", default_value = "outputs/generated_texts")]
    output_dir: PathBuf,

    /// Max LLM output tokens per image.
    #[arg(long, env = "PDF2ALT_MAX_TOKENS", default_value_t = 300)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2ALT_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, env = "PDF2ALT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-image vision API call timeout in seconds.
    #[arg(long, env = "PDF2ALT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Output structured JSON (RunOutput) on stdout instead of a summary.
    #[arg(long, env = "PDF2ALT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2ALT_NO_PROGRESS")]
    no_progress: bool,

    /// Count pages and images only; no API key needed, nothing is written.
    #[arg(long)]
    inspect_only: bool,

    /// Validate the API key against the provider and exit.
    #[arg(long)]
    check_key: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2ALT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2ALT_QUIET")]
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

    let provider = Provider::parse(&cli.provider)
        .with_context(|| format!("Unknown provider '{}': expected openai or groq", cli.provider))?;
    let language = Language::parse(&cli.language).with_context(|| {
        format!(
            "Unknown language '{}': expected english, dutch, spanish, french or german",
            cli.language
        )
    })?;

    // ── Key check mode ───────────────────────────────────────────────────
    if cli.check_key {
        let key = cli
            .api_key
            .clone()
            .or_else(|| std::env::var(provider.key_env_var()).ok())
            .filter(|k| !k.is_empty())
            .with_context(|| format!("No API key: set {} or --api-key", provider.key_env_var()))?;

        match validate_key(provider, &key, cli.api_timeout).await {
            Ok(()) => {
                println!("{} API key is valid for provider '{}'", green("✔"), provider);
                return Ok(());
            }
            Err(e) => {
                eprintln!("{} {}", red("✘"), e);
                std::process::exit(1);
            }
        }
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, provider, language, None)?;
        let summary = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
            );
        } else {
            println!("File:          {}", summary.name);
            println!("Pages:         {}", summary.page_count);
            println!("Images:        {}", summary.total_images);
            for (page, count) in &summary.images_per_page {
                println!("  page {page:>3}: {count} image(s)");
            }
        }
        return Ok(());
    }

    // ── Build config and run ─────────────────────────────────────────────
    // The progress bar starts as a spinner; `on_run_start` resizes it once
    // extraction has counted the images.
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, provider, language, progress_cb)?;

    let (output, path) = generate_to_file(&cli.input, &config)
        .await
        .context("Alt-text generation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    // Summary line (the callback already printed the per-image log).
    if !cli.quiet {
        let s = &output.stats;
        eprintln!(
            "{}  {}/{} images  {}ms  →  {}",
            if s.failed == 0 { green("✔") } else { cyan("⚠") },
            s.generated,
            s.total_images,
            s.total_duration_ms,
            bold(&path.display().to_string()),
        );
        eprintln!(
            "   {}  {}  {}",
            dim(&format!("{} logo(s)", s.logos)),
            dim(&format!("{} flagged", s.flagged)),
            dim(&format!("{} failed", s.failed)),
        );
        for msg in output.flagged_messages() {
            eprintln!("   {} {}", yellow("⚑"), msg);
        }
    }

    Ok(())
}

/// Map CLI args to `RunConfig`.
fn build_config(
    cli: &Cli,
    provider: Provider,
    language: Language,
    progress: Option<ProgressCallback>,
) -> Result<RunConfig> {
    let mut builder = RunConfig::builder()
        .provider(provider)
        .language(language)
        .alt_lines(cli.lines)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .output_dir(cli.output_dir.clone())
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
