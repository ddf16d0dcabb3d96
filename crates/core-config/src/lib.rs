//! Configuration loading: parses `emil.toml`, falling back to defaults on
//! any I/O or parse failure so a broken config file never stops the editor
//! from starting.

use std::{fs, path::PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportContext {
    pub columns: u16,
    pub text_rows: u16,
}

impl ViewportContext {
    pub fn new(columns: u16, text_rows: u16) -> Self {
        Self { columns, text_rows }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditingConfig {
    #[serde(default = "EditingConfig::default_tab_stop")]
    pub tab_stop: u16,
    #[serde(default = "EditingConfig::default_indent_width")]
    pub indent_width: u16,
    #[serde(default = "EditingConfig::default_undo_limit")]
    pub undo_limit: usize,
    #[serde(default)]
    pub wrap_default: WrapDefault,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WrapDefault {
    #[default]
    On,
    Off,
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            tab_stop: Self::default_tab_stop(),
            indent_width: Self::default_indent_width(),
            undo_limit: Self::default_undo_limit(),
            wrap_default: WrapDefault::default(),
        }
    }
}

impl EditingConfig {
    const fn default_tab_stop() -> u16 {
        8
    }
    const fn default_indent_width() -> u16 {
        4
    }
    const fn default_undo_limit() -> usize {
        core_state::UNDO_LIMIT
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScrollConfig {
    #[serde(default)]
    pub margin: u16,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub editing: EditingConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub file: ConfigFile,
    pub effective_scroll_margin: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: ConfigFile::default(),
            effective_scroll_margin: 0,
        }
    }
}

/// Best-effort config path: prefer a local `emil.toml`, then the platform
/// config directory, matching the XDG / AppData convention.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("emil.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("emil").join("emil.toml");
    }
    PathBuf::from("emil.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config {
                file,
                effective_scroll_margin: 0,
            }),
            Err(e) => {
                info!(target: "config", error = %e, path = %path.display(), "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Clamp the configured scroll margin against the current viewport,
    /// never letting it exceed half the text area.
    pub fn apply_viewport(&mut self, ctx: ViewportContext) -> u16 {
        let raw = self.file.scroll.margin;
        let clamped = if ctx.text_rows <= 3 {
            0
        } else {
            raw.min((ctx.text_rows.saturating_sub(2)) / 2)
        };
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                text_rows = ctx.text_rows,
                "scroll_margin_clamped"
            );
        }
        self.effective_scroll_margin = clamped;
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_emil__.toml"))).unwrap();
        assert_eq!(cfg.file.editing.tab_stop, 8);
        assert_eq!(cfg.file.editing.undo_limit, core_state::UNDO_LIMIT);
    }

    #[test]
    fn falls_back_to_defaults_on_parse_error() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "not = [valid toml").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.editing.tab_stop, 8);
    }

    #[test]
    fn parses_editing_section() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[editing]\ntab_stop = 4\nindent_width = 2\nundo_limit = 50\nwrap_default = \"off\"\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.editing.tab_stop, 4);
        assert_eq!(cfg.file.editing.indent_width, 2);
        assert_eq!(cfg.file.editing.undo_limit, 50);
        assert_eq!(cfg.file.editing.wrap_default, WrapDefault::Off);
    }

    #[test]
    fn clamps_scroll_margin_to_viewport() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[scroll]\nmargin = 50\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let eff = cfg.apply_viewport(ViewportContext::new(80, 20));
        assert_eq!(eff, 9);
    }
}
