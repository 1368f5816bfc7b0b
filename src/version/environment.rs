use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

/// Variables consulted for `<ID>_VERSION` overrides.
///
/// Captured once at the program boundary; nothing below the CLI reads the
/// process environment directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_process() -> Self {
        Self::from_os_pairs(std::env::vars_os())
    }

    /// Keeps only the pairs whose key and value are both valid UTF-8.
    pub fn from_os_pairs(pairs: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        Self::from_pairs(
            pairs
                .into_iter()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Overlays variables from a dotenv file; file values replace existing ones.
    pub fn load_env_file(&mut self, path: &Path) -> Result<usize> {
        let iter = dotenvy::from_path_iter(path)
            .with_context(|| format!("Failed to open env file {}", path.display()))?;

        let mut loaded = 0;
        for item in iter {
            let (key, value) =
                item.with_context(|| format!("Failed to parse env file {}", path.display()))?;
            self.vars.insert(key, value);
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`get`](Self::get), but blank values count as unset.
    /// Non-blank values are returned as stored.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }
}
