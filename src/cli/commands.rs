use crate::output::SummaryFormat;
use crate::postprocess::TargetPlatform;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Docker Compose generator for local projects
#[derive(Parser, Debug)]
#[command(
    name = "stackcompose",
    about = "Generate a docker-compose file for a local project",
    version,
    author,
    long_about = "stackcompose inspects a project directory for marker files, dependency \
                  manifests and environment files, merges the matching service templates \
                  into one docker-compose file, and tunes it for the host (platform, GPU, \
                  BuildKit cache).\n\n\
                  Examples:\n  \
                  stackcompose\n  \
                  stackcompose /path/to/project -o compose.yml\n  \
                  stackcompose . --include redis postgres --no-gpu\n  \
                  stackcompose --list-supported"
)]
pub struct CliArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the project directory (defaults to current directory)"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Output YAML file [default: docker-compose.generated.yml]"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'i',
        long,
        value_name = "ID",
        num_args = 1..,
        help = "Force-include extra templates (e.g. redis postgres)"
    )]
    pub include: Vec<String>,

    #[arg(short = 't', long, value_name = "ID", help = "Force a project type")]
    pub force_type: Option<String>,

    #[arg(
        short = 'e',
        long,
        value_name = "FILE",
        help = "Environment file consulted for <ID>_VERSION overrides"
    )]
    pub env_file: Option<PathBuf>,

    #[arg(short = 'l', long, help = "List all supported project types and exit")]
    pub list_supported: bool,

    #[arg(long, help = "Disable GPU detection and configuration")]
    pub no_gpu: bool,

    #[arg(long, help = "Disable docker-bake.hcl generation")]
    pub no_bake: bool,

    #[arg(long, help = "Remove Docker Compose watch (develop) sections")]
    pub no_watch: bool,

    #[arg(
        long,
        value_enum,
        default_value = "auto",
        help = "Target platform for image services"
    )]
    pub platform: PlatformArg,

    #[arg(long, help = "Add default resource limits to services")]
    pub resource_limits: bool,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory of extra <id>.yml templates layered over the built-in ones"
    )]
    pub template_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Summary format"
    )]
    pub format: SummaryFormatArg,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress the summary"
    )]
    pub quiet: bool,
}

impl CliArgs {
    /// `--include` ids followed by `--force-type`
    pub fn forced_keys(&self) -> Vec<&str> {
        self.include
            .iter()
            .chain(self.force_type.iter())
            .map(String::as_str)
            .collect()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformArg {
    Auto,
    Amd64,
    Arm64,
}

impl PlatformArg {
    /// `None` for `auto`
    pub fn target(self) -> Option<TargetPlatform> {
        match self {
            PlatformArg::Auto => None,
            PlatformArg::Amd64 => Some(TargetPlatform::Amd64),
            PlatformArg::Arm64 => Some(TargetPlatform::Arm64),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormatArg {
    Human,
    Json,
}

impl From<SummaryFormatArg> for SummaryFormat {
    fn from(arg: SummaryFormatArg) -> Self {
        match arg {
            SummaryFormatArg::Human => SummaryFormat::Human,
            SummaryFormatArg::Json => SummaryFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["stackcompose"]);

        assert!(args.project_root.is_none());
        assert!(args.output.is_none());
        assert!(args.include.is_empty());
        assert!(!args.list_supported);
        assert!(!args.no_gpu);
        assert!(!args.no_bake);
        assert!(!args.no_watch);
        assert!(!args.resource_limits);
        assert_eq!(args.platform, PlatformArg::Auto);
        assert_eq!(args.format, SummaryFormatArg::Human);
    }

    #[test]
    fn test_full_invocation() {
        let args = CliArgs::parse_from([
            "stackcompose",
            "/srv/shop",
            "-o",
            "compose.yml",
            "--include",
            "redis",
            "postgres",
            "-t",
            "node",
            "--platform",
            "arm64",
            "--no-gpu",
            "--no-watch",
        ]);

        assert_eq!(args.project_root, Some(PathBuf::from("/srv/shop")));
        assert_eq!(args.output, Some(PathBuf::from("compose.yml")));
        assert_eq!(args.forced_keys(), vec!["redis", "postgres", "node"]);
        assert_eq!(args.platform.target(), Some(TargetPlatform::Arm64));
        assert!(args.no_gpu);
        assert!(args.no_watch);
    }

    #[test]
    fn test_include_repeatable() {
        let args = CliArgs::parse_from(["stackcompose", "-i", "redis", "-i", "nginx"]);
        assert_eq!(args.include, vec!["redis", "nginx"]);
    }

    #[test]
    fn test_invalid_platform_rejected() {
        let result = CliArgs::try_parse_from(["stackcompose", "--platform", "s390x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let result = CliArgs::try_parse_from(["stackcompose", "-v", "-q"]);
        assert!(result.is_err());
    }
}
