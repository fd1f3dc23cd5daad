use crate::properties::{Properties, PropertiesError};
use std::path::{Path, PathBuf};

const HEIGHT: &str = "height";
const WIDTH: &str = "width";
const X: &str = "x";
const Y: &str = "y";
const LAST_OPEN_FILE: &str = "last_open_file";
const LAST_SAVE_FILE: &str = "last_save_file";

/// Window placement, consumed by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            width: 1200,
            height: 800,
        }
    }
}

/// Session-wide properties: window geometry and the last opened/saved files.
#[derive(Debug, Clone)]
pub struct SessionProperties {
    properties: Properties,
}

impl SessionProperties {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PropertiesError> {
        Ok(Self {
            properties: Properties::load(path)?,
        })
    }

    pub fn save(&self) -> Result<(), PropertiesError> {
        self.properties.save()
    }

    /// Stored geometry; fields that are missing or unparsable take their defaults.
    pub fn geometry(&self) -> WindowGeometry {
        let defaults = WindowGeometry::default();
        WindowGeometry {
            x: self.parsed(X).unwrap_or(defaults.x),
            y: self.parsed(Y).unwrap_or(defaults.y),
            width: self.parsed(WIDTH).unwrap_or(defaults.width),
            height: self.parsed(HEIGHT).unwrap_or(defaults.height),
        }
    }

    pub fn set_geometry(&mut self, geometry: WindowGeometry) {
        self.properties.set(X, geometry.x.to_string());
        self.properties.set(Y, geometry.y.to_string());
        self.properties.set(WIDTH, geometry.width.to_string());
        self.properties.set(HEIGHT, geometry.height.to_string());
    }

    pub fn last_open_file(&self) -> Option<PathBuf> {
        self.properties.get(LAST_OPEN_FILE).map(PathBuf::from)
    }

    pub fn set_last_open_file(&mut self, path: &Path) {
        self.properties
            .set(LAST_OPEN_FILE, path.to_string_lossy().into_owned());
    }

    pub fn last_save_file(&self) -> Option<PathBuf> {
        self.properties.get(LAST_SAVE_FILE).map(PathBuf::from)
    }

    pub fn set_last_save_file(&mut self, path: &Path) {
        self.properties
            .set(LAST_SAVE_FILE, path.to_string_lossy().into_owned());
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.properties.get(key)?.trim().parse().ok()
    }
}
