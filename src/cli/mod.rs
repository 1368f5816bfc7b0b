pub mod commands;
pub mod handlers;

pub use commands::{CliArgs, PlatformArg, SummaryFormatArg};
pub use handlers::run;
