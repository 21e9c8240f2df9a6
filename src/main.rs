// Entry point: parse flags, resolve configuration, then hand stdin/stdout to
// the interactive dashboard session.
use clap::Parser;
use log::{error, info};
use production_dashboard::config::Config;
use production_dashboard::dashboard::Session;
use production_dashboard::loader::CsvDirectory;
use production_dashboard::logging::init_logger;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "production-dashboard", version, about = "Line utilization and demand fulfillment dashboard")]
struct Cli {
    /// Configuration file (defaults to ./dashboard.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory containing the CSV datasets
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Directory overall-view exports are written to
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Decimal places for displayed numbers
    #[arg(long, value_name = "N")]
    decimals: Option<usize>,

    /// Don't write CSV/JSON exports
    #[arg(long)]
    no_export: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// File values first, then any flag that was given.
fn resolve_config(cli: &Cli) -> production_dashboard::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(decimals) = cli.decimals {
        config.decimals = decimals;
    }
    if cli.no_export {
        config.export = false;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    let config = match resolve_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let source = CsvDirectory::new(&config.data_dir);
    info!("Data directory: {}", source.root().display());
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(stdin.lock(), stdout.lock(), &source, &config);
    match session.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Dashboard session failed: {e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
