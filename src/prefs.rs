//! Client-local preferences that survive restarts.
//!
//! Only the sidebar width is stored. It lives in a small TOML file under the
//! platform data directory and is clamped to the configured bounds.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsFile {
    sidebar_width: Option<u16>,
}

/// Persisted sidebar width, bounded to `[min, max]`.
#[derive(Debug, Clone)]
pub struct Prefs {
    path: Option<PathBuf>,
    min: u16,
    max: u16,
    width: u16,
}

impl Prefs {
    /// `<data_local_dir>/notetree/prefs.toml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("notetree").join("prefs.toml"))
    }

    /// Read the stored width, falling back to `default` when the file or
    /// value is missing or unreadable. `path = None` keeps prefs in memory.
    pub fn load(path: Option<PathBuf>, (min, max): (u16, u16), default: u16) -> Self {
        let stored = path.as_deref().and_then(read_width);
        let width = stored.unwrap_or(default).clamp(min, max);
        Self {
            path,
            min,
            max,
            width,
        }
    }

    pub fn sidebar_width(&self) -> u16 {
        self.width
    }

    /// Clamp and store a new width. Returns the width actually kept.
    pub fn save_sidebar_width(&mut self, width: u16) -> Result<u16> {
        self.width = width.clamp(self.min, self.max);
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let body = toml::to_string(&PrefsFile {
                sidebar_width: Some(self.width),
            })
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
            fs::write(path, body)?;
            debug!(width = self.width, "saved sidebar width");
        }
        Ok(self.width)
    }
}

fn read_width(path: &Path) -> Option<u16> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str::<PrefsFile>(&content) {
        Ok(file) => file.sidebar_width,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable preferences");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Prefs::load(Some(dir.path().join("prefs.toml")), (100, 500), 250);
        assert_eq!(prefs.sidebar_width(), 250);
    }

    #[test]
    fn save_clamps_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.toml");
        let mut prefs = Prefs::load(Some(path.clone()), (100, 500), 250);

        assert_eq!(prefs.save_sidebar_width(40).unwrap(), 100);
        assert_eq!(prefs.save_sidebar_width(900).unwrap(), 500);
        assert_eq!(prefs.save_sidebar_width(321).unwrap(), 321);

        let reloaded = Prefs::load(Some(path), (100, 500), 250);
        assert_eq!(reloaded.sidebar_width(), 321);
    }

    #[test]
    fn invalid_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "sidebar_width = \"wide\"").unwrap();
        let prefs = Prefs::load(Some(path), (100, 500), 250);
        assert_eq!(prefs.sidebar_width(), 250);
    }

    #[test]
    fn stored_value_outside_new_bounds_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "sidebar_width = 90\n").unwrap();
        let prefs = Prefs::load(Some(path), (16, 80), 32);
        assert_eq!(prefs.sidebar_width(), 80);
    }

    #[test]
    fn in_memory_prefs_do_not_touch_disk() {
        let mut prefs = Prefs::load(None, (16, 80), 32);
        assert_eq!(prefs.save_sidebar_width(10).unwrap(), 16);
        assert_eq!(prefs.sidebar_width(), 16);
    }
}
