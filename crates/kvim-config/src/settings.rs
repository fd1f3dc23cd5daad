use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "kvim";
const CONFIG_FILE: &str = "config.toml";
const RECENT_FILE: &str = "recent.properties";
const SESSION_FILE: &str = "session.properties";

/// User configuration read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub markers: MarkerConfig,
    pub highlight: HighlightConfig,
    pub store: StoreConfig,
}

/// Child entry names that identify project and VCS roots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MarkerConfig {
    pub project: String,
    pub vcs: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            project: ".kvim".into(),
            vcs: ".git".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HighlightConfig {
    pub mode: HighlightMode,
}

/// When keyword rescans run after an edit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    /// Rescan synchronously as part of every edit.
    #[default]
    Immediate,
    /// Queue the rescan; the caller pumps the queue from its event loop.
    Deferred,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Re-read annotation stores from disk around every mutation.
    pub reconcile: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { reconcile: true }
    }
}

impl SessionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(SettingsError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let contents = toml::to_string_pretty(self)?;
        crate::write_atomic(path.as_ref(), contents.as_bytes())?;
        Ok(())
    }
}

/// Locations of the per-user files owned by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    config_dir: PathBuf,
}

impl SessionPaths {
    /// `<platform config dir>/kvim`, or `None` when the platform has no
    /// config directory.
    pub fn from_user_config() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::with_config_dir(dir.join(APP_DIR)))
    }

    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn recent_file(&self) -> PathBuf {
        self.config_dir.join(RECENT_FILE)
    }

    pub fn session_file(&self) -> PathBuf {
        self.config_dir.join(SESSION_FILE)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = SessionConfig::load_or_default(dir.path().join("config.toml")).unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.markers.project, ".kvim");
        assert_eq!(config.markers.vcs, ".git");
        assert_eq!(config.highlight.mode, HighlightMode::Immediate);
        assert!(config.store.reconcile);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[highlight]\nmode = \"deferred\"\n\n[markers]\nvcs = \".hg\"\n").unwrap();

        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.highlight.mode, HighlightMode::Deferred);
        assert_eq!(config.markers.vcs, ".hg");
        assert_eq!(config.markers.project, ".kvim");
        assert!(config.store.reconcile);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kvim").join("config.toml");

        let mut config = SessionConfig::default();
        config.store.reconcile = false;
        config.save(&path).unwrap();

        assert_eq!(SessionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[highlight]\nmode = \"sometimes\"\n").unwrap();

        assert!(matches!(
            SessionConfig::load_or_default(&path),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn session_paths_live_under_config_dir() {
        let paths = SessionPaths::with_config_dir("/cfg/kvim");
        assert_eq!(paths.config_file(), PathBuf::from("/cfg/kvim/config.toml"));
        assert_eq!(paths.recent_file(), PathBuf::from("/cfg/kvim/recent.properties"));
        assert_eq!(paths.session_file(), PathBuf::from("/cfg/kvim/session.properties"));
    }
}
