//! Human-readable and JSON run summaries.

use crate::generator::GenerateReport;
use crate::postprocess::{GpuCapabilities, TargetPlatform};
use crate::stack::TechnologyId;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

fn keys(ids: &[TechnologyId]) -> Vec<String> {
    ids.iter().map(|id| id.key().to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    #[default]
    Human,
    Json,
}

/// What the CLI reports after a successful run
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub output: PathBuf,
    pub bake_file: Option<PathBuf>,
    pub detected: Vec<String>,
    pub applied: Vec<String>,
    pub missing: Vec<String>,
    pub platform: TargetPlatform,
    pub gpu: GpuCapabilities,
    pub services: Vec<String>,
    pub bake_enabled: bool,
}

impl Summary {
    pub fn new(report: &GenerateReport, output: &Path, bake_file: Option<PathBuf>, bake_enabled: bool) -> Self {
        Self {
            output: output.to_path_buf(),
            bake_file,
            detected: keys(&report.detected()),
            applied: keys(&report.applied),
            missing: keys(&report.missing),
            platform: report.platform,
            gpu: report.gpu,
            services: report
                .compose
                .service_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            bake_enabled,
        }
    }

    pub fn render(&self, format: SummaryFormat) -> Result<String> {
        match format {
            SummaryFormat::Human => Ok(self.render_human()),
            SummaryFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize summary to JSON")
            }
        }
    }

    fn render_human(&self) -> String {
        let mut lines = vec![format!("✔ Created file: {}", self.output.display())];

        if let Some(bake) = &self.bake_file {
            lines.push(format!("✔ Created bake file: {}", bake.display()));
        }
        if !self.detected.is_empty() {
            lines.push(format!("✔ Detected technologies: {}", self.detected.join(", ")));
        }
        lines.push(format!("✔ Target platform: {}", self.platform));

        if self.gpu.has_gpu() {
            lines.push(format!(
                "✔ GPU capabilities detected: {}",
                self.gpu.labels().join(", ")
            ));
            lines.push("  GPU passthrough enabled for compatible services".to_string());
        }

        let file_name = self
            .output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.output.display().to_string());

        lines.push("✔ Next steps:".to_string());
        lines.push(format!("  1. Review {}", self.output.display()));
        lines.push(format!("  2. Run with: docker compose -f {} up", file_name));
        if self.bake_enabled {
            lines.push("  3. Or build with: docker buildx bake".to_string());
        }

        lines.join("\n")
    }
}
