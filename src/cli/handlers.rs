use super::commands::CliArgs;
use crate::config::GeneratorConfig;
use crate::fs::RealFileSystem;
use crate::generator::Generator;
use crate::output::{write_bake_file, write_compose, Summary};
use crate::postprocess::HostFacts;
use crate::stack::TechnologyId;
use crate::templates::TemplateLibrary;
use crate::version::Environment;
use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Entry point for one CLI invocation. Returns the process exit code.
pub fn run(args: &CliArgs) -> i32 {
    if args.list_supported {
        return handle_list_supported(args);
    }
    handle_generate(args)
}

pub fn handle_list_supported(args: &CliArgs) -> i32 {
    let library = match load_library(args.template_dir.as_deref()) {
        Ok(library) => library,
        Err(e) => return fail(&e),
    };

    println!("Supported project types:");
    for id in library.ids() {
        println!("  - {}", id);
    }
    0
}

pub fn handle_generate(args: &CliArgs) -> i32 {
    match generate(args) {
        Ok(()) => 0,
        Err(e) => fail(&e),
    }
}

fn fail(e: &anyhow::Error) -> i32 {
    debug!(error = ?e, "Generation failed");
    eprintln!("Error: {:#}", e);
    1
}

/// Environment defaults with command-line flags applied on top
pub fn resolve_config(args: &CliArgs) -> GeneratorConfig {
    let defaults = GeneratorConfig::default();
    GeneratorConfig {
        output: args.output.clone().unwrap_or(defaults.output),
        gpu: defaults.gpu && !args.no_gpu,
        bake: defaults.bake && !args.no_bake,
        watch: !args.no_watch,
        resource_limits: args.resource_limits,
        platform: args.platform.target().or(defaults.platform),
        template_dir: args.template_dir.clone().or(defaults.template_dir),
    }
}

fn load_library(template_dir: Option<&Path>) -> Result<TemplateLibrary> {
    let mut library = TemplateLibrary::builtin().context("Built-in templates are invalid")?;
    if let Some(dir) = template_dir {
        let loaded = library.load_dir(&RealFileSystem::new(), dir)?;
        info!(dir = %dir.display(), loaded, "Loaded extra templates");
    }
    Ok(library)
}

fn project_root(args: &CliArgs) -> Result<PathBuf> {
    let root = match &args.project_root {
        Some(path) => path.clone(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    if !root.is_dir() {
        bail!(
            "Folder {} doesn't exist or is not a directory.",
            root.display()
        );
    }
    root.canonicalize()
        .with_context(|| format!("Failed to canonicalize {}", root.display()))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(env::current_dir()
        .context("Failed to get current directory")?
        .join(path))
}

fn forced_technologies(args: &CliArgs, library: &TemplateLibrary) -> Result<Vec<TechnologyId>> {
    args.forced_keys()
        .into_iter()
        .map(|key| {
            let id = TechnologyId::parse(key);
            if !library.contains(&id) {
                bail!(
                    "Unknown project type '{}'. Run with --list-supported to see valid types.",
                    key
                );
            }
            Ok(id)
        })
        .collect()
}

fn generate(args: &CliArgs) -> Result<()> {
    let config = resolve_config(args);
    config.validate()?;
    debug!(%config, "Resolved configuration");

    let root = project_root(args)?;
    debug!(root = %root.display(), "Project root");

    let mut environment = Environment::from_process();
    if let Some(env_file) = &args.env_file {
        match environment.load_env_file(env_file) {
            Ok(count) => {
                info!(path = %env_file.display(), count, "Loaded environment file");
                if !args.quiet {
                    println!("✔ Loaded environment from: {}", env_file.display());
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not load environment file");
                eprintln!("Warning: Could not load environment file: {:#}", e);
            }
        }
    }

    let library = load_library(config.template_dir.as_deref())?;
    let forced = forced_technologies(args, &library)?;

    let generator = Generator::new(
        RealFileSystem::new(),
        library,
        environment,
        HostFacts::detect(config.gpu),
    );
    let report = generator.generate(&root, &forced, &config.pipeline_config())?;

    let output = absolute(&config.output)?;
    write_compose(&report.compose, &output)?;

    let bake_file = if config.bake {
        match write_bake_file(&root, &report.compose) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Bake file not written");
                eprintln!("Warning: Could not generate bake file: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    if !args.quiet {
        let summary = Summary::new(&report, &output, bake_file, config.bake);
        println!("{}", summary.render(args.format.into())?);
    }

    Ok(())
}
