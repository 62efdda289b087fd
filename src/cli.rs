#![expect(clippy::print_stdout)]

use anyhow::{Context as _, Result};
use bodsight::codelist::{
    Codelist, CodelistCase, CodelistSource, RemoteCodelists, StaticCodelists, read_codelist,
};
use bodsight::config::{AppConfig, load_app_config, save_app_config};
use bodsight::queries::{BatteryOutcome, QueryId, run_battery};
use bodsight::report::render::{render_markdown, write_outcome};
use bodsight::statements::StatementTables;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bodsight",
    version,
    about = "Descriptive statistics for beneficial ownership data"
)]
pub struct Cli {
    /// Also write daily log files to the data directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the reporting battery and write tables, charts and a Markdown summary
    Run {
        #[command(flatten)]
        battery: BatteryArgs,

        /// Output directory. Defaults to the configured output directory.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Do not print the Markdown summary
        #[arg(long)]
        quiet: bool,

        /// Store the settings used for this run as the new configuration
        #[arg(long)]
        save_config: bool,
    },
    /// Print the codes of a codelist, one per line
    Codelist {
        #[arg(value_enum)]
        name: Codelist,

        #[arg(long, value_enum, default_value_t = CodelistCase::Camel)]
        case: CodelistCase,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Run the reporting battery and browse the results in a window
    #[cfg(feature = "gui")]
    View {
        #[command(flatten)]
        battery: BatteryArgs,
    },
}

#[derive(Args)]
pub struct BatteryArgs {
    /// Directory holding the flattened statement tables (CSV, Parquet or JSON)
    #[arg(short, long)]
    pub data_dir: PathBuf,

    /// Queries to run, in order. Defaults to all of them.
    #[arg(short, long = "query", value_enum)]
    pub queries: Vec<QueryId>,

    /// Reference line on the share histograms, in percent
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Number of jurisdictions charted
    #[arg(long)]
    pub top: Option<usize>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Use the bundled codelists instead of fetching them
    #[arg(long)]
    pub offline: bool,

    /// Data standard release to read codelists from (e.g. 0.2.0)
    #[arg(long)]
    pub standard_version: Option<String>,

    /// Directory for cached codelists
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

pub fn run_command(command: Commands) -> Result<()> {
    let config = load_app_config();
    match command {
        Commands::Run {
            battery,
            out,
            quiet,
            save_config,
        } => handle_run(&config, &battery, out, quiet, save_config),
        Commands::Codelist { name, case, source } => handle_codelist(&config, name, case, &source),
        #[cfg(feature = "gui")]
        Commands::View { battery } => {
            let outcome = run_from_args(&config, &battery)?;
            bodsight::gui::run(outcome, battery.data_dir.display().to_string())
        }
    }
}

fn handle_run(
    config: &AppConfig,
    args: &BatteryArgs,
    out: Option<PathBuf>,
    quiet: bool,
    save_config: bool,
) -> Result<()> {
    let outcome = run_from_args(config, args)?;
    let out = out.unwrap_or_else(|| config.output_dir.clone());

    if save_config {
        let mut settings = battery_config(config, args)?;
        settings.output_dir.clone_from(&out);
        let path = save_app_config(&settings).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
    }
    let summary = write_outcome(&outcome, &out)
        .with_context(|| format!("Failed to write reports to {}", out.display()))?;

    if !quiet {
        println!("{}", render_markdown(&outcome));
    }
    println!("Summary written to: {}", summary.display());
    Ok(())
}

fn handle_codelist(
    config: &AppConfig,
    name: Codelist,
    case: CodelistCase,
    source: &SourceArgs,
) -> Result<()> {
    let codelists = codelist_source(&effective_config(config, source), source.offline)?;
    for code in read_codelist(&*codelists, name, case)? {
        println!("{code}");
    }
    Ok(())
}

fn run_from_args(config: &AppConfig, args: &BatteryArgs) -> Result<BatteryOutcome> {
    let config = battery_config(config, args)?;
    let tables = StatementTables::load_dir(&args.data_dir)
        .with_context(|| format!("Failed to load tables from {}", args.data_dir.display()))?;
    let codelists = codelist_source(&config, args.source.offline)?;

    let queries: &[QueryId] = if args.queries.is_empty() {
        &QueryId::ALL
    } else {
        &args.queries
    };
    Ok(run_battery(
        queries,
        &tables,
        &*codelists,
        &config.query_options(),
    )?)
}

/// Settings for a battery run: flags win over the stored configuration.
fn battery_config(config: &AppConfig, args: &BatteryArgs) -> Result<AppConfig> {
    let mut config = effective_config(config, &args.source);
    if let Some(threshold) = args.threshold {
        config.share_threshold = threshold;
    }
    if let Some(top) = args.top {
        config.top_jurisdictions = top;
    }
    config.validate()?;
    Ok(config)
}

/// The stored configuration with command-line overrides applied.
fn effective_config(config: &AppConfig, source: &SourceArgs) -> AppConfig {
    let mut config = config.clone();
    if let Some(version) = &source.standard_version {
        config.standard_version.clone_from(version);
    }
    if let Some(dir) = &source.cache_dir {
        config.codelist_cache_dir = Some(dir.clone());
    }
    config
}

fn codelist_source(config: &AppConfig, offline: bool) -> Result<Box<dyn CodelistSource>> {
    if offline {
        tracing::info!("Using bundled codelists");
        return Ok(Box::new(StaticCodelists::bundled()));
    }
    tracing::info!(
        "Reading codelists for standard {} from {}",
        config.standard_version,
        config.codelist_base_url
    );
    Ok(Box::new(RemoteCodelists::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_queries() {
        let cli = Cli::try_parse_from([
            "bodsight", "run", "--data-dir", "data", "-q", "q131", "-q", "q211", "--offline",
            "--threshold", "10",
        ])
        .expect("valid arguments");
        match cli.command {
            Commands::Run { battery, .. } => {
                assert_eq!(battery.queries, vec![QueryId::InterestTypes, QueryId::EntityNames]);
                assert!(battery.source.offline);
                assert_eq!(battery.threshold, Some(10.0));
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_parse_codelist_alias() {
        let cli = Cli::try_parse_from(["bodsight", "codelist", "interestType", "--case", "snake"])
            .expect("valid arguments");
        match cli.command {
            Commands::Codelist { name, case, .. } => {
                assert_eq!(name, Codelist::InterestType);
                assert_eq!(case, CodelistCase::Snake);
            }
            _ => panic!("expected the codelist command"),
        }
    }

    #[test]
    fn test_effective_config_overrides() {
        let source = SourceArgs {
            offline: false,
            standard_version: Some("0.3.0".to_owned()),
            cache_dir: None,
        };
        let config = effective_config(&AppConfig::default(), &source);
        assert_eq!(config.standard_version, "0.3.0");
    }

    fn battery_args(args: &[&str]) -> BatteryArgs {
        let base = ["bodsight", "run", "--data-dir", "data"];
        let cli = Cli::try_parse_from(base.iter().chain(args).copied()).expect("valid arguments");
        match cli.command {
            Commands::Run { battery, .. } => battery,
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_flags_win_over_config() {
        let stored = AppConfig {
            share_threshold: 50.0,
            top_jurisdictions: 3,
            standard_version: "0.2.0".to_owned(),
            ..AppConfig::default()
        };

        let config = battery_config(
            &stored,
            &battery_args(&["--threshold", "10", "--top", "7", "--standard-version", "0.4.0"]),
        )
        .expect("valid settings");
        assert!((config.share_threshold - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.top_jurisdictions, 7);
        assert_eq!(config.standard_version, "0.4.0");

        let config = battery_config(&stored, &battery_args(&[])).expect("valid settings");
        assert_eq!(config, stored);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let result = battery_config(&AppConfig::default(), &battery_args(&["--top", "0"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_save_config() {
        let cli = Cli::try_parse_from(["bodsight", "run", "-d", "data", "--save-config"])
            .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Run { save_config: true, .. }));
    }
}
