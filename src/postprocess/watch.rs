use super::stage::{for_each_service, PostProcessStage};
use crate::compose::ComposeFile;

const WATCH_KEY: &str = "develop";

/// Removes `develop` (compose watch) sections.
pub struct StripWatchStage;

impl PostProcessStage for StripWatchStage {
    fn name(&self) -> &'static str {
        "strip-watch"
    }

    fn apply(&self, compose: &mut ComposeFile) {
        for_each_service(compose, |_, service| {
            if !service.contains_key(WATCH_KEY) {
                return;
            }
            // rebuilt rather than removed in place to keep the remaining key order
            *service = std::mem::take(service)
                .into_iter()
                .filter(|(key, _)| key.as_str() != Some(WATCH_KEY))
                .collect();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_develop_removed() {
        let mut doc = ComposeFile::from_mapping(
            serde_yaml::from_str(
                "services:\n  app:\n    image: node:20-alpine\n    develop:\n      watch:\n        - path: .\n          action: sync\n",
            )
            .unwrap(),
        );
        StripWatchStage.apply(&mut doc);
        StripWatchStage.apply(&mut doc);

        let app = doc.service("app").unwrap();
        assert!(!app.contains_key("develop"));
        assert!(app.contains_key("image"));
    }
}
