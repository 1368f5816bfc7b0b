//! `docker-bake.hcl` rendering for services that build from source.

use crate::compose::ComposeFile;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

pub const BAKE_FILE_NAME: &str = "docker-bake.hcl";

const PRODUCTION_PLATFORMS: &str = r#"["linux/amd64", "linux/arm64"]"#;

/// Build context of a service: the `build` string, or `build.context`
/// (default `.`) when `build` is a mapping.
fn build_context(service: &Value) -> Option<&str> {
    match service.get("build")? {
        Value::String(context) => Some(context.as_str()),
        Value::Mapping(build) => Some(build.get("context").and_then(Value::as_str).unwrap_or(".")),
        _ => Some("."),
    }
}

/// Escapes text for an HCL quoted string; `${` and `%{` are literal.
fn hcl_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                escaped.push(c);
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

fn quoted_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let items: Vec<String> = items.into_iter().map(|item| format!("\"{}\"", item)).collect();
    format!("[{}]", items.join(", "))
}

/// Renders the bake file. Groups list the per-service targets; services
/// without `build` get no targets.
pub fn render_bake(compose: &ComposeFile) -> String {
    let buildable: Vec<(String, String)> = compose
        .services()
        .map(|services| {
            services
                .iter()
                .filter_map(|(name, service)| {
                    Some((hcl_escape(name.as_str()?), hcl_escape(build_context(service)?)))
                })
                .collect()
        })
        .unwrap_or_default();

    let development: Vec<String> = buildable
        .iter()
        .map(|(name, _)| format!("{}-development", name))
        .collect();
    let production: Vec<String> = buildable
        .iter()
        .map(|(name, _)| format!("{}-production", name))
        .collect();

    let mut out = String::new();
    out.push_str("// docker-bake.hcl - generated by stackcompose\n");
    out.push_str("// Run with: docker buildx bake\n\n");

    out.push_str("group \"default\" {\n  targets = [\"development\"]\n}\n\n");
    let _ = writeln!(
        out,
        "group \"production\" {{\n  targets = {}\n}}\n",
        quoted_list(production.iter().map(String::as_str))
    );
    let _ = writeln!(
        out,
        "group \"development\" {{\n  targets = {}\n}}\n",
        quoted_list(development.iter().map(String::as_str))
    );
    out.push_str("variable \"TAG\" {\n  default = \"latest\"\n}\n");

    for (name, context) in &buildable {
        let _ = write!(
            out,
            r#"
target "{name}-development" {{
  context = "{context}"
  tags = ["{name}:development"]
  cache-from = ["type=registry,ref={name}:buildcache"]
  cache-to = ["type=inline"]
  target = "development"
}}

target "{name}-production" {{
  context = "{context}"
  tags = ["{name}:${{TAG}}"]
  cache-from = ["type=registry,ref={name}:buildcache"]
  platforms = {platforms}
  target = "production"
}}
"#,
            platforms = PRODUCTION_PLATFORMS,
        );
    }

    out
}

/// Writes `docker-bake.hcl` into `project_root` and returns its path.
pub fn write_bake_file(project_root: &Path, compose: &ComposeFile) -> Result<PathBuf> {
    let path = project_root.join(BAKE_FILE_NAME);
    std::fs::write(&path, render_bake(compose))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Bake file written");
    Ok(path)
}
