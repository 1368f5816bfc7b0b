use super::stage::{for_each_service, mapping_entry, PostProcessStage};
use crate::compose::ComposeFile;
use serde_yaml::{Mapping, Value};

pub const INLINE_CACHE_ARG: &str = "BUILDKIT_INLINE_CACHE";

/// BuildKit cache hints for services that build an image.
pub struct BuildCacheStage;

impl PostProcessStage for BuildCacheStage {
    fn name(&self) -> &'static str {
        "build-cache"
    }

    fn apply(&self, compose: &mut ComposeFile) {
        for_each_service(compose, |name, service| {
            let Some(build) = service.get_mut("build") else {
                return;
            };
            if let Value::String(context) = build {
                let mut normalized = Mapping::new();
                normalized.insert("context".into(), Value::String(context.clone()));
                *build = Value::Mapping(normalized);
            }
            let Value::Mapping(build) = build else {
                return;
            };

            if !build.contains_key("cache_from") {
                build.insert(
                    "cache_from".into(),
                    Value::Sequence(vec![format!("type=registry,ref={}:buildcache", name).into()]),
                );
            }
            if !build.contains_key("cache_to") {
                build.insert("cache_to".into(), Value::Sequence(vec!["type=inline".into()]));
            }

            if let Some(Value::Sequence(args)) = build.get_mut("args") {
                if !args.iter().any(sets_inline_cache) {
                    args.push(format!("{}=1", INLINE_CACHE_ARG).into());
                }
                return;
            }
            if let Some(args) = mapping_entry(build, "args") {
                if !args.contains_key(INLINE_CACHE_ARG) {
                    args.insert(INLINE_CACHE_ARG.into(), "1".into());
                }
            }
        });
    }
}

/// `KEY=VALUE` or bare `KEY` item of a list-form `args`.
fn sets_inline_cache(item: &Value) -> bool {
    item.as_str()
        .and_then(|item| item.split('=').next())
        .is_some_and(|key| key.trim() == INLINE_CACHE_ARG)
}
