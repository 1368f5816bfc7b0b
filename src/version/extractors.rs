//! Runtime version extraction from project metadata files.
//!
//! Each extractor returns `Ok(None)` when its inputs are absent or carry no
//! usable version, and `Err` when a file exists but cannot be read or parsed.
//! The resolver treats both as "fall through". Extractors with several
//! sources skip a failing source and keep checking the next one.

use crate::fs::FileSystem;
use crate::stack::TechnologyId;
use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Dispatches to the extractor for `runtime`, if one exists.
pub fn extract<F: FileSystem>(
    fs: &F,
    project_root: &Path,
    runtime: &TechnologyId,
) -> Result<Option<String>> {
    match runtime {
        TechnologyId::Node => node(fs, project_root),
        TechnologyId::Python => python(fs, project_root),
        TechnologyId::Php => php(fs, project_root),
        TechnologyId::Go => go(fs, project_root),
        TechnologyId::Ruby => ruby(fs, project_root),
        TechnologyId::DotNet => dotnet(fs, project_root),
        _ => Ok(None),
    }
}

fn read_if_present<F: FileSystem>(fs: &F, path: &Path) -> Result<Option<String>> {
    if !fs.is_file(path) {
        return Ok(None);
    }
    fs.read_to_string(path).map(Some)
}

fn read_json<F: FileSystem>(fs: &F, path: &Path) -> Result<Option<Value>> {
    match read_if_present(fs, path)? {
        Some(content) => {
            let value = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Result of one metadata source; a failure is logged and treated as no match.
fn attempt(source: &str, result: Result<Option<String>>) -> Option<String> {
    match result {
        Ok(version) => version,
        Err(e) => {
            debug!(source = source, error = %e, "Skipping unusable version source");
            None
        }
    }
}

/// `X.Y` from the start of a version string such as `3.11.4` or `3.12`
fn major_minor(version: &str) -> Option<String> {
    let re = Regex::new(r"^(\d+)\.(\d+)").expect("valid regex");
    re.captures(version.trim())
        .map(|caps| format!("{}.{}", &caps[1], &caps[2]))
}

pub fn node<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    Ok(attempt(".nvmrc", nvmrc(fs, project_root))
        .or_else(|| attempt("package.json", node_engines(fs, project_root))))
}

fn exact_node_version() -> Regex {
    Regex::new(r"^\d+(\.\d+){0,2}$").expect("valid regex")
}

fn nvmrc<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let Some(content) = read_if_present(fs, &project_root.join(".nvmrc"))? else {
        return Ok(None);
    };
    let version = content.trim().trim_start_matches('v');
    Ok(exact_node_version()
        .is_match(version)
        .then(|| format!("{}-alpine", version)))
}

fn node_engines<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let Some(package) = read_json(fs, &project_root.join("package.json"))? else {
        return Ok(None);
    };
    let Some(range) = package
        .get("engines")
        .and_then(|engines| engines.get("node"))
        .and_then(Value::as_str)
        .map(str::trim)
    else {
        return Ok(None);
    };

    let stripped = range.trim_start_matches(['>', '<', '=', '^', '~', 'v', ' ']);
    if stripped.len() != range.len() {
        let major: String = stripped.chars().take_while(char::is_ascii_digit).collect();
        if major.is_empty() {
            return Ok(None);
        }
        return Ok(Some(format!("{}-alpine", major)));
    }

    if exact_node_version().is_match(range) {
        return Ok(Some(format!("{}-alpine", range)));
    }
    Ok(None)
}

pub fn python<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    Ok(attempt(".python-version", python_version_file(fs, project_root))
        .or_else(|| attempt("pyproject.toml", pyproject_requires(fs, project_root)))
        .or_else(|| attempt("runtime.txt", runtime_txt(fs, project_root))))
}

fn python_version_file<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let Some(content) = read_if_present(fs, &project_root.join(".python-version"))? else {
        return Ok(None);
    };
    Ok(content
        .lines()
        .next()
        .and_then(major_minor)
        .map(|version| format!("{}-slim", version)))
}

fn pyproject_requires<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let path = project_root.join("pyproject.toml");
    let Some(content) = read_if_present(fs, &path)? else {
        return Ok(None);
    };
    let pyproject: toml::Value = toml::from_str(&content)
        .with_context(|| format!("Invalid TOML in {}", path.display()))?;

    let Some(requires) = pyproject
        .get("project")
        .and_then(|project| project.get("requires-python"))
        .and_then(toml::Value::as_str)
    else {
        return Ok(None);
    };

    let lower_bound = Regex::new(r">=\s*(\d+\.\d+)").expect("valid regex");
    Ok(lower_bound
        .captures(requires)
        .map(|caps| format!("{}-slim", &caps[1])))
}

fn runtime_txt<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let Some(content) = read_if_present(fs, &project_root.join("runtime.txt"))? else {
        return Ok(None);
    };
    Ok(content
        .trim()
        .strip_prefix("python-")
        .and_then(major_minor)
        .map(|version| format!("{}-slim", version)))
}

pub fn php<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let Some(composer) = read_json(fs, &project_root.join("composer.json"))? else {
        return Ok(None);
    };
    let Some(constraint) = composer
        .get("require")
        .and_then(|require| require.get("php"))
        .and_then(Value::as_str)
    else {
        return Ok(None);
    };

    let re = Regex::new(r"(\d+)\.(\d+)").expect("valid regex");
    Ok(re
        .captures(constraint)
        .map(|caps| format!("{}.{}-apache", &caps[1], &caps[2])))
}

pub fn go<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let Some(content) = read_if_present(fs, &project_root.join("go.mod"))? else {
        return Ok(None);
    };

    let re = Regex::new(r"(?m)^go\s+(\d+\.\d+)").expect("valid regex");
    Ok(re
        .captures(&content)
        .map(|caps| format!("{}-alpine", &caps[1])))
}

pub fn ruby<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    Ok(attempt(".ruby-version", ruby_version_file(fs, project_root))
        .or_else(|| attempt("Gemfile", gemfile_ruby(fs, project_root))))
}

fn ruby_version_file<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let Some(content) = read_if_present(fs, &project_root.join(".ruby-version"))? else {
        return Ok(None);
    };
    let version = content.trim();
    let version = version.strip_prefix("ruby-").unwrap_or(version);
    Ok(major_minor(version).map(|version| format!("{}-alpine", version)))
}

fn gemfile_ruby<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let Some(content) = read_if_present(fs, &project_root.join("Gemfile"))? else {
        return Ok(None);
    };
    let re = Regex::new(r#"(?m)^\s*ruby\s+['"](\d+)\.(\d+)"#).expect("valid regex");
    Ok(re
        .captures(&content)
        .map(|caps| format!("{}.{}-alpine", &caps[1], &caps[2])))
}

pub fn dotnet<F: FileSystem>(fs: &F, project_root: &Path) -> Result<Option<String>> {
    let projects = fs.find_files(project_root, &|name| name.ends_with(".csproj"))?;
    let Some(project) = projects.first() else {
        return Ok(None);
    };

    let content = fs.read_to_string(project)?;
    let doc = roxmltree::Document::parse(&content)
        .with_context(|| format!("Invalid XML in {}", project.display()))?;

    let framework = doc.descendants().find_map(|node| match node.tag_name().name() {
        "TargetFramework" => node.text().map(str::trim),
        "TargetFrameworks" => node
            .text()
            .and_then(|list| list.split(';').map(str::trim).find(|f| !f.is_empty())),
        _ => None,
    });

    Ok(framework.and_then(dotnet_tag))
}

/// `net8.0` → `8.0`, `netcoreapp3.1` → `3.1`; .NET Framework and
/// netstandard monikers have no matching runtime image.
fn dotnet_tag(moniker: &str) -> Option<String> {
    let core = Regex::new(r"^netcoreapp(\d+\.\d+)$").expect("valid regex");
    if let Some(caps) = core.captures(moniker) {
        return Some(caps[1].to_string());
    }

    let modern = Regex::new(r"^net(\d+)\.\d+(-[\w.]+)?$").expect("valid regex");
    modern
        .captures(moniker)
        .map(|caps| format!("{}.0", &caps[1]))
}
