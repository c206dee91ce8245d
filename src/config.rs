//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--server`, `--no-mouse`)
//! 2. `$NOTETREE_CONFIG` environment variable (path to config file)
//! 3. Project-local `.notetree.toml` in the current working directory
//! 4. Global `~/.config/notetree/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable mouse support.
    pub mouse: Option<bool>,
}

/// Document store connection.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the file API, e.g. `http://127.0.0.1:8080`.
    pub url: Option<String>,
    /// Per-request timeout of the HTTP client.
    pub request_timeout_ms: Option<u64>,
}

/// Editor pane settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last keystroke before content is written.
    pub write_debounce_ms: Option<u64>,
}

/// Sidebar width bounds, in terminal columns.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SidebarConfig {
    pub min_width: Option<u16>,
    pub max_width: Option<u16>,
    pub default_width: Option<u16>,
}

/// Color scheme selection.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// `"dark"` (default), `"light"` or `"custom"`.
    pub scheme: Option<String>,
    /// Hex overrides applied on top of dark when `scheme = "custom"`.
    pub custom: Option<ThemeColorsConfig>,
}

/// Hex color overrides, e.g. `tree_dir_fg = "#89b4fa"`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub tree_focused_fg: Option<String>,
    pub editor_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub server: ServerConfig,
    pub editor: EditorConfig,
    pub sidebar: SidebarConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_WRITE_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_SIDEBAR_MIN: u16 = 16;
pub const DEFAULT_SIDEBAR_MAX: u16 = 80;
pub const DEFAULT_SIDEBAR_WIDTH: u16 = 32;

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("NOTETREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".notetree.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("notetree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: other.general.mouse.or(self.general.mouse),
            },
            server: ServerConfig {
                url: other.server.url.clone().or(self.server.url),
                request_timeout_ms: other
                    .server
                    .request_timeout_ms
                    .or(self.server.request_timeout_ms),
            },
            editor: EditorConfig {
                write_debounce_ms: other
                    .editor
                    .write_debounce_ms
                    .or(self.editor.write_debounce_ms),
            },
            sidebar: SidebarConfig {
                min_width: other.sidebar.min_width.or(self.sidebar.min_width),
                max_width: other.sidebar.max_width.or(self.sidebar.max_width),
                default_width: other.sidebar.default_width.or(self.sidebar.default_width),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher ones overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn server_url(&self) -> &str {
        self.server.url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.server
                .request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    pub fn write_debounce(&self) -> Duration {
        Duration::from_millis(
            self.editor
                .write_debounce_ms
                .unwrap_or(DEFAULT_WRITE_DEBOUNCE_MS),
        )
    }

    /// Sidebar `(min, max)` width; a reversed pair is put back in order.
    pub fn sidebar_bounds(&self) -> (u16, u16) {
        let min = self.sidebar.min_width.unwrap_or(DEFAULT_SIDEBAR_MIN);
        let max = self.sidebar.max_width.unwrap_or(DEFAULT_SIDEBAR_MAX);
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }

    /// Sidebar width used when no preference is stored, within bounds.
    pub fn sidebar_default_width(&self) -> u16 {
        let (min, max) = self.sidebar_bounds();
        self.sidebar
            .default_width
            .unwrap_or(DEFAULT_SIDEBAR_WIDTH)
            .clamp(min, max)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert!(cfg.mouse_enabled());
        assert_eq!(cfg.server_url(), "http://127.0.0.1:8080");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.write_debounce(), Duration::from_millis(500));
        assert_eq!(cfg.sidebar_bounds(), (16, 80));
        assert_eq!(cfg.sidebar_default_width(), 32);
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r##"
[general]
mouse = false

[server]
url = "http://notes.local:9000"
request_timeout_ms = 2500

[editor]
write_debounce_ms = 750

[sidebar]
min_width = 20
max_width = 60
default_width = 40

[theme]
scheme = "custom"

[theme.custom]
tree_dir_fg = "#112233"
"##;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert!(!cfg.mouse_enabled());
        assert_eq!(cfg.server_url(), "http://notes.local:9000");
        assert_eq!(cfg.request_timeout(), Duration::from_millis(2500));
        assert_eq!(cfg.write_debounce(), Duration::from_millis(750));
        assert_eq!(cfg.sidebar_bounds(), (20, 60));
        assert_eq!(cfg.sidebar_default_width(), 40);
        assert_eq!(cfg.theme.scheme.as_deref(), Some("custom"));
        assert_eq!(
            cfg.theme.custom.and_then(|c| c.tree_dir_fg).as_deref(),
            Some("#112233")
        );
    }

    #[test]
    fn test_toml_parsing_partial_and_empty() {
        let cfg: AppConfig = toml::from_str("[editor]\nwrite_debounce_ms = 100\n").unwrap();
        assert_eq!(cfg.write_debounce(), Duration::from_millis(100));
        assert_eq!(cfg.server_url(), DEFAULT_SERVER_URL);

        let cfg: AppConfig = toml::from_str("").expect("parse failed");
        assert!(cfg.mouse_enabled());
    }

    #[test]
    fn test_sidebar_default_is_clamped_and_bounds_ordered() {
        let cfg = AppConfig {
            sidebar: SidebarConfig {
                min_width: Some(50),
                max_width: Some(30),
                default_width: Some(10),
            },
            ..Default::default()
        };
        assert_eq!(cfg.sidebar_bounds(), (30, 50));
        assert_eq!(cfg.sidebar_default_width(), 30);
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            server: ServerConfig {
                url: Some("http://a".into()),
                request_timeout_ms: Some(1000),
            },
            ..Default::default()
        };
        let over = AppConfig {
            server: ServerConfig {
                url: Some("http://b".into()),
                // timeout not set, should keep base
                request_timeout_ms: None,
            },
            ..Default::default()
        };
        let merged = base.merge(&over);
        assert_eq!(merged.server_url(), "http://b");
        assert_eq!(merged.request_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_merge_none_does_not_clear_some() {
        let base = AppConfig {
            general: GeneralConfig { mouse: Some(false) },
            ..Default::default()
        };
        let merged = base.merge(&AppConfig::default());
        assert!(!merged.mouse_enabled());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[server]
url = "http://files.test"

[sidebar]
max_width = 50
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert_eq!(cfg.server_url(), "http://files.test");
        assert_eq!(cfg.sidebar_bounds(), (16, 50));
    }

    #[test]
    fn test_load_missing_or_invalid_file() {
        assert!(load_file(Path::new("/nonexistent/config.toml")).is_none());

        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[general]
mouse = false

[server]
url = "http://from-file"
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            server: ServerConfig {
                url: Some("http://from-cli".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        assert_eq!(cfg.server_url(), "http://from-cli");
        assert!(!cfg.mouse_enabled());
    }
}
