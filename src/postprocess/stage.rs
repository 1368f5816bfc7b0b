use crate::compose::ComposeFile;
use serde_yaml::{Mapping, Value};

/// One post-processing pass over the merged document.
///
/// Stages must tolerate a missing `services` section and must be idempotent:
/// applying a stage twice leaves the document as after the first run.
pub trait PostProcessStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, compose: &mut ComposeFile);
}

/// Calls `f` with every service whose definition is a mapping.
pub(crate) fn for_each_service(compose: &mut ComposeFile, mut f: impl FnMut(&str, &mut Mapping)) {
    let Some(services) = compose.services_mut() else {
        return;
    };
    for (name, service) in services.iter_mut() {
        if let (Some(name), Value::Mapping(service)) = (name.as_str(), service) {
            f(name, service);
        }
    }
}

/// Mapping stored under `key`, created (or replacing a non-mapping value) if needed.
pub(crate) fn mapping_entry<'m>(parent: &'m mut Mapping, key: &str) -> Option<&'m mut Mapping> {
    let value = parent.entry(Value::from(key)).or_insert(Value::Null);
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    value.as_mapping_mut()
}
