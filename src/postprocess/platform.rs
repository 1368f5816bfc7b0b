use super::stage::{for_each_service, PostProcessStage};
use crate::compose::ComposeFile;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Container platform written into `platform:` fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetPlatform {
    #[serde(rename = "linux/amd64")]
    Amd64,
    #[serde(rename = "linux/arm64")]
    Arm64,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported platform '{0}'. Valid options: amd64, arm64, linux/amd64, linux/arm64")]
pub struct ParsePlatformError(pub String);

impl TargetPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "linux/amd64",
            Self::Arm64 => "linux/arm64",
        }
    }

    /// `x86*` and `amd64` architectures map to amd64, everything else to arm64.
    pub fn from_arch(arch: &str) -> Self {
        let arch = arch.to_lowercase();
        if arch.contains("x86") || arch.contains("amd64") {
            Self::Amd64
        } else {
            Self::Arm64
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetPlatform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.strip_prefix("linux/").unwrap_or(&normalized) {
            "amd64" | "x86_64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            _ => Err(ParsePlatformError(s.to_string())),
        }
    }
}

/// Architecture and OS of the machine running the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub arch: String,
    pub os: String,
}

impl HostPlatform {
    pub fn detect() -> Self {
        Self {
            arch: std::env::consts::ARCH.to_string(),
            os: std::env::consts::OS.to_string(),
        }
    }

    pub fn is_arm(&self) -> bool {
        self.arch.contains("arm") || self.arch.contains("aarch")
    }

    pub fn target(&self) -> TargetPlatform {
        TargetPlatform::from_arch(&self.arch)
    }
}

/// Pins `platform:` on every service that runs an image.
pub struct PlatformStage {
    target: TargetPlatform,
}

impl PlatformStage {
    pub fn new(target: TargetPlatform) -> Self {
        Self { target }
    }
}

impl PostProcessStage for PlatformStage {
    fn name(&self) -> &'static str {
        "platform"
    }

    fn apply(&self, compose: &mut ComposeFile) {
        for_each_service(compose, |_, service| {
            if service.contains_key("image") {
                service.insert("platform".into(), Value::from(self.target.as_str()));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        x86_64 = { "x86_64", TargetPlatform::Amd64 },
        amd64 = { "AMD64", TargetPlatform::Amd64 },
        aarch64 = { "aarch64", TargetPlatform::Arm64 },
        armv7 = { "armv7l", TargetPlatform::Arm64 },
        riscv = { "riscv64", TargetPlatform::Arm64 },
    )]
    fn test_from_arch(arch: &str, expected: TargetPlatform) {
        assert_eq!(TargetPlatform::from_arch(arch), expected);
    }

    #[parameterized(
        short = { "amd64", TargetPlatform::Amd64 },
        qualified = { "linux/arm64", TargetPlatform::Arm64 },
        upper = { " Linux/AMD64 ", TargetPlatform::Amd64 },
    )]
    fn test_parse(input: &str, expected: TargetPlatform) {
        assert_eq!(input.parse::<TargetPlatform>(), Ok(expected));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("windows/amd64".parse::<TargetPlatform>().is_err());
        assert!("s390x".parse::<TargetPlatform>().is_err());
    }

    #[test]
    fn test_stage_tags_image_services_only() {
        let mut doc = ComposeFile::from_mapping(
            serde_yaml::from_str(
                "services:\n  app:\n    image: node:20-alpine\n  worker:\n    build: .\n",
            )
            .unwrap(),
        );
        PlatformStage::new(TargetPlatform::Arm64).apply(&mut doc);

        assert_eq!(
            doc.service("app").unwrap().get("platform"),
            Some(&Value::from("linux/arm64"))
        );
        assert!(doc.service("worker").unwrap().get("platform").is_none());
    }

    #[test]
    fn test_stage_without_services() {
        let mut doc = ComposeFile::new();
        PlatformStage::new(TargetPlatform::Amd64).apply(&mut doc);

        assert_eq!(doc, ComposeFile::new());
    }
}
