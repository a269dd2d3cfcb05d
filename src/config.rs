//! Configuration loading and merging.
//!
//! Partial configs stack on top of each other, highest priority last:
//! built-in defaults, then `~/.config/lazytree/config.toml`, then
//! `./.lazytree.toml`, then the file named by `$LAZYTREE_CONFIG`, then an
//! explicit `--config` file, then individual CLI flags. Every field is
//! optional so any layer may set just the keys it cares about.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Write tracing output to this file (stderr is owned by the TUI).
    pub log_file: Option<String>,
}

/// Which filesystem entries enter the tree.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    /// "files", "dirs", or "both".
    pub kind: Option<String>,
    /// Regular expression a display name must fully match.
    pub pattern: Option<String>,
    /// Allowed file extensions (leading dot optional, case-insensitive).
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Sort listings by name, directories first.
    pub sorted: Option<bool>,
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Per-slot color overrides for `scheme = "custom"`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_bg: Option<String>,
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// "dark", "light", or "custom".
    pub scheme: Option<String>,
    pub custom: Option<ThemeColorsConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub filter: FilterConfig,
    pub tree: TreeConfig,
    pub theme: ThemeConfig,
}

/// Config files probed when `--config` is not given, best first.
fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(env_path) = std::env::var("LAZYTREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".lazytree.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("lazytree").join("config.toml"));
    }
    paths
}

/// Parse one config file. Missing files are skipped silently; files that
/// exist but do not parse get a warning on stderr and are then skipped,
/// since this runs before the TUI takes over the terminal.
fn read_file(path: &Path) -> Option<AppConfig> {
    let text = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&text) {
        Ok(config) => Some(config),
        Err(err) => {
            eprintln!("warning: ignoring config {}: {err}", path.display());
            None
        }
    }
}

fn layer<T: Clone>(over: &Option<T>, base: Option<T>) -> Option<T> {
    over.clone().or(base)
}

impl AppConfig {
    /// Stack `over` on top of `self`; set keys in `over` win.
    pub fn merge(self, over: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: layer(&over.general.mouse, self.general.mouse),
                log_file: layer(&over.general.log_file, self.general.log_file),
            },
            filter: FilterConfig {
                kind: layer(&over.filter.kind, self.filter.kind),
                pattern: layer(&over.filter.pattern, self.filter.pattern),
                extensions: layer(&over.filter.extensions, self.filter.extensions),
            },
            tree: TreeConfig {
                sorted: layer(&over.tree.sorted, self.tree.sorted),
                use_icons: layer(&over.tree.use_icons, self.tree.use_icons),
            },
            theme: ThemeConfig {
                scheme: layer(&over.theme.scheme, self.theme.scheme),
                // A custom color block replaces the whole block rather than
                // merging slot by slot.
                custom: layer(&over.theme.custom, self.theme.custom),
            },
        }
    }

    /// Build the effective configuration from all layers.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();
        for path in search_paths().iter().rev() {
            if let Some(found) = read_file(path) {
                config = config.merge(&found);
            }
        }
        if let Some(path) = cli_config_path {
            if let Some(found) = read_file(path) {
                config = config.merge(&found);
            }
        }
        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }
        config
    }

    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn log_file(&self) -> Option<&str> {
        self.general.log_file.as_deref()
    }

    pub fn sorted(&self) -> bool {
        self.tree.sorted.unwrap_or(true)
    }

    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::default();
        assert!(config.mouse_enabled());
        assert!(config.sorted());
        assert!(config.use_icons());
        assert!(config.log_file().is_none());
        assert!(config.filter.kind.is_none());
    }

    #[test]
    fn filter_section_round_trips() {
        let config: AppConfig = toml::from_str(
            r#"
            [filter]
            kind = "files"
            pattern = ".*\\.rs"
            extensions = ["rs", "toml"]
        "#,
        )
        .unwrap();
        assert_eq!(config.filter.kind.as_deref(), Some("files"));
        assert_eq!(config.filter.pattern.as_deref(), Some(".*\\.rs"));
        assert_eq!(
            config.filter.extensions.as_deref(),
            Some(["rs".to_string(), "toml".to_string()].as_slice())
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = toml::from_str("[tree]\nsorted = false\n").unwrap();
        assert!(!config.sorted());
        assert!(config.use_icons());
    }

    #[test]
    fn merge_prefers_the_upper_layer() {
        let base: AppConfig = toml::from_str(
            r#"
            [filter]
            kind = "both"
            pattern = "a.*"
            [tree]
            sorted = true
        "#,
        )
        .unwrap();
        let upper: AppConfig = toml::from_str("[filter]\nkind = \"dirs\"\n").unwrap();

        let merged = base.merge(&upper);
        assert_eq!(merged.filter.kind.as_deref(), Some("dirs"));
        // Keys the upper layer leaves unset fall through to the base.
        assert_eq!(merged.filter.pattern.as_deref(), Some("a.*"));
        assert_eq!(merged.tree.sorted, Some(true));
    }

    #[test]
    fn custom_colors_replace_wholesale() {
        let base: AppConfig = toml::from_str(
            r##"
            [theme]
            scheme = "custom"
            [theme.custom]
            tree_fg = "#ffffff"
        "##,
        )
        .unwrap();
        let upper: AppConfig = toml::from_str("[theme.custom]\ntree_bg = \"#000000\"\n").unwrap();

        let custom = base.merge(&upper).theme.custom.unwrap();
        assert_eq!(custom.tree_bg.as_deref(), Some("#000000"));
        assert!(custom.tree_fg.is_none());
    }

    #[test]
    fn unparsable_file_is_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();
        assert!(read_file(&path).is_none());
    }

    #[test]
    fn missing_file_is_skipped() {
        assert!(read_file(Path::new("/nonexistent/config.toml")).is_none());
    }
}
