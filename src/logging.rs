use env_logger::Env;
use log::{debug, LevelFilter};

/// Level forced by the command line, if any. `quiet` wins over `verbose`.
pub fn flag_level(verbose: bool, quiet: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if verbose {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}

/// Initialize the logger. Without `--verbose`/`--quiet` the `RUST_LOG`
/// filter applies, falling back to warnings so log lines don't interleave
/// with the menus.
pub fn init_logger(verbose: bool, quiet: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = flag_level(verbose, quiet) {
        builder.filter_level(level);
    }

    let _ = builder
        .format_timestamp(None)
        .format_target(false)
        .try_init();

    debug!("Logger initialized, max level: {:?}", log::max_level());
}
