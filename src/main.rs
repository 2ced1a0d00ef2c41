use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shots_review::approve::{self, ApproveRequest, Selector};
use shots_review::config::{self, ReviewConfig};
use shots_review::generate::{self, GenerateRequest};
use shots_review::imaging::RustProbe;
use shots_review::open::{self, OpenRequest, SystemLauncher};
use shots_review::output;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("SHOTS_REVIEW_ON_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("SHOTS_REVIEW_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "shots-review")]
#[command(about = "Review framed App Store screenshots against their raw captures")]
#[command(long_about = "\
Review framed App Store screenshots against their raw captures

Directory layout:

  screenshots/
  ├── raw/                         # Simulator captures, one per screenshot id
  │   ├── home.png
  │   └── details.png
  ├── framed/                      # Framed output: <locale>/<device>/<id>.png
  │   ├── en/
  │   │   └── iPhone_Air/
  │   │       ├── home.png         # → key en|iPhone_Air|home
  │   │       └── details.png
  │   └── fr/
  │       └── iPhone_Air/
  │           └── home.png
  └── review/                      # Written by review-generate
      ├── manifest.json
      ├── index.html
      └── approved.json            # Written by review-approve

Typical flow:

  shots-review review-generate     # classify and write the report
  shots-review review-open         # look at it
  shots-review review-approve --all-ready

Run 'shots-review gen-config' to generate a documented review.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Result format on stdout
    #[arg(long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    /// Indent JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the HTML side-by-side review and the JSON manifest
    ReviewGenerate(GenerateArgs),
    /// Add manifest entries to approved.json by selector
    ReviewApprove(ApproveArgs),
    /// Open the review HTML in the default browser
    ReviewOpen(OpenArgs),
    /// Show accepted framed sizes per device
    ListDevices,
    /// Print a stock review.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Raw captures (optional; empty string disables raw matching)
    #[arg(long)]
    raw_dir: Option<PathBuf>,
    /// Framed screenshots, laid out as <locale>/<device>/<id>.png
    #[arg(long)]
    framed_dir: Option<PathBuf>,
    /// Where manifest.json and index.html are written
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Approvals file (default: <output-dir>/approved.json)
    #[arg(long)]
    approval_path: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ApproveArgs {
    /// Directory containing review artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Manifest (default: <output-dir>/manifest.json)
    #[arg(long)]
    manifest_path: Option<PathBuf>,
    /// Approvals file (default: <output-dir>/approved.json)
    #[arg(long)]
    approval_path: Option<PathBuf>,
    /// Approve every entry with status=ready
    #[arg(long)]
    all_ready: bool,
    /// Review key(s), comma-separated (locale|device|screenshot_id)
    #[arg(long)]
    key: Option<String>,
    /// Screenshot id, optionally narrowed by --locale/--device
    #[arg(long)]
    id: Option<String>,
    /// Locale selector/filter
    #[arg(long)]
    locale: Option<String>,
    /// Device selector/filter
    #[arg(long)]
    device: Option<String>,
}

#[derive(clap::Args)]
struct OpenArgs {
    /// Directory containing review artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Report path (default: <output-dir>/index.html)
    #[arg(long)]
    html_path: Option<PathBuf>,
    /// Resolve and check the path without launching anything
    #[arg(long)]
    dry_run: bool,
}

/// Bad invocation: reported like any error but exits with status 2.
#[derive(Error, Debug)]
#[error("{0}")]
struct UsageError(&'static str);

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            if is_usage(err.as_ref()) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let emit = Emitter {
        format: cli.format,
        pretty: cli.pretty,
    };

    match cli.command {
        Command::ReviewGenerate(args) => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let req = generate_request(args, config)?;
            let result = generate::generate(&req, &RustProbe::new())?;
            emit.result(&result, output::print_generate_result)?;
        }
        Command::ReviewApprove(args) => {
            let selector = Selector::from_flags(
                args.all_ready,
                args.key.as_deref(),
                args.id.as_deref(),
                args.locale.as_deref(),
                args.device.as_deref(),
            );
            // Checked before the config is read so a bare invocation touches nothing.
            if selector.is_empty() {
                return Err(approve::ApproveError::NoSelector.into());
            }
            let config = config::load_config(&cli.config)?;
            let mut req = ApproveRequest::new(
                args.output_dir.unwrap_or(config.paths.output_dir),
                selector,
            );
            req.manifest_path = non_empty(args.manifest_path);
            req.approval_path = non_empty(args.approval_path);
            let result = approve::approve(&req)?;
            emit.result(&result, output::print_approve_result)?;
        }
        Command::ReviewOpen(args) => {
            let output_dir = match args.output_dir {
                Some(dir) => dir,
                None => config::load_config(&cli.config)?.paths.output_dir,
            };
            let req = OpenRequest {
                output_dir,
                html_path: non_empty(args.html_path),
                dry_run: args.dry_run,
            };
            let result = open::open_review(&req, &SystemLauncher)?;
            emit.result(&result, output::print_open_result)?;
        }
        Command::ListDevices => {
            let config = config::load_config(&cli.config)?;
            emit.result(&output::DeviceList::new(&config.devices), output::print_devices)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Flags override config; an empty `--framed-dir` is a usage error and an
/// empty `--raw-dir` means no raw directory at all.
fn generate_request(
    args: GenerateArgs,
    config: ReviewConfig,
) -> Result<GenerateRequest, UsageError> {
    let framed_dir = args.framed_dir.unwrap_or(config.paths.framed_dir);
    if is_blank(&framed_dir) {
        return Err(UsageError("--framed-dir is required"));
    }
    let output_dir = args.output_dir.unwrap_or(config.paths.output_dir);
    let raw_dir = args.raw_dir.unwrap_or(config.paths.raw_dir);

    let mut req = GenerateRequest::new(framed_dir, output_dir);
    req.raw_dir = (!is_blank(&raw_dir)).then_some(raw_dir);
    req.approval_path = non_empty(args.approval_path);
    req.devices = config.devices;
    Ok(req)
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !is_blank(p))
}

fn is_usage(err: &(dyn Error + 'static)) -> bool {
    err.is::<UsageError>()
        || err
            .downcast_ref::<approve::ApproveError>()
            .is_some_and(approve::ApproveError::is_usage)
        || err
            .downcast_ref::<open::OpenError>()
            .is_some_and(open::OpenError::is_usage)
}

struct Emitter {
    format: Format,
    pretty: bool,
}

impl Emitter {
    fn result<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> serde_json::Result<()> {
        match self.format {
            Format::Json => println!("{}", output::to_json(value, self.pretty)?),
            Format::Text => text(value),
        }
        Ok(())
    }
}

/// `-v` forces debug; otherwise `RUST_LOG`, falling back to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
