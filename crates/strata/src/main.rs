use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use strata_core::config::{Config, CONFIG_FILE_NAME};
use strata_core::pipeline::AnalysisPipeline;
use strata_core::report::Report;
use strata_core::types::Severity;

use strata_report::text::TextOptions;
use strata_report::{dot, json, text};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Check layering, boundaries and naming in layered TypeScript codebases")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Dot,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a codebase and print a full report
    Analyze {
        /// Path to the project root
        path: PathBuf,
        /// Config file path (defaults to .strata.toml in the project or a parent)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
        /// With --format dot, draw layer-to-layer flow instead of the file graph
        #[arg(long)]
        layer_flow: bool,
        /// Glob of files to analyze (repeatable, replaces the configured list)
        #[arg(long)]
        include: Vec<String>,
        /// Glob of files to skip (repeatable, replaces the configured list)
        #[arg(long)]
        exclude: Vec<String>,
        /// Hide violations below this severity in text output
        #[arg(long)]
        min_severity: Option<Severity>,
        /// Show at most this many violations per rule in text output
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Analyze and exit with code 0 (pass) or 1 (fail)
    Check {
        /// Path to the project root
        path: PathBuf,
        /// Minimum severity to cause failure (defaults to rules.fail_on)
        #[arg(long)]
        fail_on: Option<Severity>,
        /// Output format (text or json)
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Create a default .strata.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        Commands::Analyze {
            path,
            config,
            format,
            compact,
            layer_flow,
            include,
            exclude,
            min_severity,
            limit,
        } => {
            let options = TextOptions {
                min_severity,
                limit,
            };
            cmd_analyze(
                &path,
                config.as_deref(),
                format,
                compact,
                layer_flow,
                &include,
                &exclude,
                &options,
            )
        }
        Commands::Check {
            path,
            fail_on,
            format,
            compact,
            config,
        } => cmd_check(&path, fail_on, format, compact, config.as_deref()),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
    compact: bool,
    layer_flow: bool,
    include: &[String],
    exclude: &[String],
    options: &TextOptions,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let include = (!include.is_empty()).then_some(include);
    let exclude = (!exclude.is_empty()).then_some(exclude);
    let report = run_analysis(path, config, include, exclude)?;

    let output = match format {
        OutputFormat::Text => text::format_report(&report, options),
        OutputFormat::Json => json::format_report(&report, compact),
        OutputFormat::Dot if layer_flow => dot::generate_layer_flow(&report),
        OutputFormat::Dot => dot::generate_file_graph(&report),
    };
    println!("{output}");
    Ok(())
}

fn cmd_check(
    path: &Path,
    fail_on: Option<Severity>,
    format: OutputFormat,
    compact: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let fail_on = fail_on.unwrap_or(config.rules.fail_on);
    let report = run_analysis(path, config, None, None)?;

    let (output, passed) = match format {
        OutputFormat::Text => text::format_check(&report, fail_on),
        OutputFormat::Json => json::format_check(&report, fail_on, compact),
        OutputFormat::Dot => anyhow::bail!("check does not support --format dot"),
    };
    println!("{output}");
    if !passed {
        process::exit(1);
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE_NAME);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())
        .with_context(|| format!("failed to write {CONFIG_FILE_NAME}"))?;
    println!("Created {CONFIG_FILE_NAME} with default configuration.");
    Ok(())
}

fn load_config(project_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Ok(Config::load_or_default(project_path)),
    }
}

fn run_analysis(
    project_path: &Path,
    config: Config,
    include: Option<&[String]>,
    exclude: Option<&[String]>,
) -> Result<Report> {
    let report = AnalysisPipeline::new(config)
        .analyze(project_path, include, exclude)
        .context("analysis failed")?;
    Ok(report)
}
