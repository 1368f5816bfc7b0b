use stackcompose::cli::{run, CliArgs};
use stackcompose::util::logging::{self, LoggingConfig, LOG_LEVEL_ENV};
use stackcompose::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("stackcompose v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    std::process::exit(run(&args));
}

fn init_logging_from_args(args: &CliArgs) {
    let config = if let Some(level_str) = &args.log_level {
        LoggingConfig::with_level(logging::parse_level(level_str))
    } else if args.verbose {
        LoggingConfig::verbose()
    } else if args.quiet {
        LoggingConfig::with_level(Level::ERROR)
    } else if env::var(LOG_LEVEL_ENV).is_ok() {
        logging::init_from_env();
        return;
    } else {
        LoggingConfig::default()
    };
    logging::init_logging(config);
}
