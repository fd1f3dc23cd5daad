use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// A flat `key = "value"` file. Keys are written in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Properties {
    /// Empty property set that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
        }
    }

    /// Load `path`, treating a missing file as empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PropertiesError> {
        let path = path.into();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::new(path)),
            Err(source) => return Err(PropertiesError::Io { path, source }),
        };

        let table: BTreeMap<String, toml::Value> = match toml::from_str(&contents) {
            Ok(table) => table,
            Err(source) => return Err(PropertiesError::Parse { path, source }),
        };

        let mut values = BTreeMap::new();
        for (key, value) in table {
            match value {
                toml::Value::String(text) => {
                    values.insert(key, text);
                }
                toml::Value::Integer(number) => {
                    values.insert(key, number.to_string());
                }
                toml::Value::Float(number) => {
                    values.insert(key, number.to_string());
                }
                toml::Value::Boolean(flag) => {
                    values.insert(key, flag.to_string());
                }
                other => warn!(?path, key, kind = other.type_str(), "skipping non-scalar property"),
            }
        }

        Ok(Self { path, values })
    }

    pub fn save(&self) -> Result<(), PropertiesError> {
        let contents = toml::to_string(&self.values)?;
        crate::write_atomic(&self.path, contents.as_bytes()).map_err(|source| {
            PropertiesError::Io {
                path: self.path.clone(),
                source,
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PropertiesError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse properties {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize properties: {0}")]
    Serialize(#[from] toml::ser::Error),
}
