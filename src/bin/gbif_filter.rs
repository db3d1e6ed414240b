use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use gbif_filter::config::ConfigLoader;
use gbif_filter::error::FilterError;
use gbif_filter::gbif::GbifHttpClient;
use gbif_filter::output::{OutputMode, TableWriter};
use gbif_filter::pipeline::Pipeline;
use gbif_filter::table::Table;

#[derive(Parser)]
#[command(name = "gbif-filter")]
#[command(
    about = "Search for occurrences of taxa in a specific country or spatial area and return the taxa with known occurrences"
)]
#[command(version)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(value_name = "CONFIG")]
    config: Utf8PathBuf,

    /// Input file (CSV)
    #[arg(value_name = "INPUT")]
    input: Utf8PathBuf,

    /// Output file (CSV)
    #[arg(value_name = "OUTPUT")]
    output: Utf8PathBuf,

    /// Add a gbif_filter_tag column to the input table instead of filtering rows
    #[arg(short, long)]
    tag: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<FilterError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FilterError) -> u8 {
    if error.is_config() {
        2
    } else if error.is_provider() {
        3
    } else {
        1
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::resolve(cli.config.as_std_path())?;
    debug!(?config, "resolved configuration");

    let table = Table::read(cli.input.as_std_path(), config.sep)?;
    let taxa = table.taxon_refs(&config)?;
    info!("read {} rows from {}", table.len(), cli.input);

    let client = GbifHttpClient::new(&config.gbif_api_url)?;
    let mut pipeline = Pipeline::from_config(&config, client);
    let outcomes = pipeline.run(&taxa)?;

    let mode = if cli.tag {
        OutputMode::Tag
    } else {
        OutputMode::Filter
    };
    info!("write filtered data to {}", cli.output);
    let writer = TableWriter::new(config.sep, mode, config.resolve_to_rank);
    let written = writer.write_path(cli.output.as_std_path(), &table, &outcomes)?;
    info!("wrote {written} rows");
    Ok(())
}
