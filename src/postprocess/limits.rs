use super::stage::{for_each_service, mapping_entry, PostProcessStage};
use crate::compose::ComposeFile;
use serde_yaml::{Mapping, Value};

pub const DEFAULT_CPUS: &str = "1";
pub const DEFAULT_MEMORY: &str = "1G";

/// Gives services without `deploy.resources.limits` a default limit.
pub struct ResourceLimitsStage {
    cpus: String,
    memory: String,
}

impl ResourceLimitsStage {
    pub fn new(cpus: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpus: cpus.into(),
            memory: memory.into(),
        }
    }
}

impl Default for ResourceLimitsStage {
    fn default() -> Self {
        Self::new(DEFAULT_CPUS, DEFAULT_MEMORY)
    }
}

impl PostProcessStage for ResourceLimitsStage {
    fn name(&self) -> &'static str {
        "resource-limits"
    }

    fn apply(&self, compose: &mut ComposeFile) {
        for_each_service(compose, |_, service| {
            let Some(resources) = mapping_entry(service, "deploy")
                .and_then(|deploy| mapping_entry(deploy, "resources"))
            else {
                return;
            };
            if resources.contains_key("limits") {
                return;
            }
            let mut limits = Mapping::new();
            limits.insert("cpus".into(), Value::from(self.cpus.as_str()));
            limits.insert("memory".into(), Value::from(self.memory.as_str()));
            resources.insert("limits".into(), Value::Mapping(limits));
        });
    }
}
