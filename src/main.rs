//! CLI entry point for the group profile tool.
//!
//! Provides subcommands for generating a group profile payload from CSV
//! reference exports and for checking how a scoring table bands a score.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use group_profile::config::ProfileConfig;
use group_profile::output::{JsonFileRenderer, LogRenderer, ReportRenderer};
use group_profile::profile::banding::BandingResolver;
use group_profile::profile::generator::{GroupProfileGenerator, render_group_profile};
use group_profile::profile::types::ProfileInput;
use group_profile::repository::Dataset;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "group_profile")]
#[command(about = "Builds group profile reports from candidate test scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the group profile payload of an order
    Generate {
        /// Directory containing the CSV reference exports
        #[arg(short = 'd', long, env = "GROUP_PROFILE_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Order (test administration) id
        #[arg(long)]
        order_id: u32,

        /// Test id within the order
        #[arg(long)]
        test_id: u32,

        /// Test type id, selects the generator
        #[arg(long)]
        test_type_id: u32,

        /// Report file type
        #[arg(long, default_value = "gp-pdf-i")]
        file_type: String,

        /// JSON file to write the payload to; logs it when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Optional JSON file overriding the percentile curve and band scale
        #[arg(short, long, env = "GROUP_PROFILE_CONFIG")]
        config: Option<PathBuf>,

        /// Pretty-print the JSON payload
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Show which scoring row a score falls into
    Band {
        /// Directory containing the CSV reference exports
        #[arg(short = 'd', long, env = "GROUP_PROFILE_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        #[arg(long)]
        question_code_id: u32,

        #[arg(long)]
        test_type_id: u32,

        /// Standardized score to look up
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/group_profile.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("group_profile.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            data_dir,
            order_id,
            test_id,
            test_type_id,
            file_type,
            output,
            config,
            pretty,
        } => {
            let config = ProfileConfig::load_or_default(config.as_deref())?;
            let dataset = load_dataset(&data_dir)?;
            let generator = GroupProfileGenerator::new(&dataset, &config);

            let input = ProfileInput {
                test_type_id,
                test_id,
                file_type,
            };

            let renderer: Box<dyn ReportRenderer> = match output {
                Some(path) => Box::new(JsonFileRenderer::new(path, pretty)),
                None => Box::new(LogRenderer),
            };

            let rendered = render_group_profile(&generator, order_id, &input, renderer.as_ref())?;
            if !rendered {
                warn!(order_id, "Group profile not generated: no test scores found");
            }
        }
        Commands::Band {
            data_dir,
            question_code_id,
            test_type_id,
            score,
        } => {
            let dataset = load_dataset(&data_dir)?;
            let config = ProfileConfig::default();
            let resolver =
                BandingResolver::new(&dataset, &config.percentile_curve, &config.band_scale);

            match resolver.resolve_banding(question_code_id, test_type_id, score) {
                Some(band) => info!(
                    question_code_id,
                    test_type_id,
                    score,
                    banding = %band.banding,
                    std_score = ?band.std_score,
                    percentile = ?band.percentile,
                    "Banding"
                ),
                None => warn!(question_code_id, test_type_id, score, "No scoring row covers score"),
            }
        }
    }

    Ok(())
}

/// Loads the CSV reference exports from `data_dir`.
#[tracing::instrument(skip(data_dir), fields(data_dir = %data_dir.display()))]
fn load_dataset(data_dir: &Path) -> Result<Dataset> {
    let dataset = Dataset::load(data_dir)
        .with_context(|| format!("failed to load dataset from {}", data_dir.display()))?;
    info!(
        orders = dataset.orders.len(),
        scores = dataset.scores.len(),
        "Dataset ready"
    );
    Ok(dataset)
}
