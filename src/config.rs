use crate::grid::{GridBounds, DEFAULT_COLS, DEFAULT_ROWS, MAX_SIDE};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub fps_cap: u32,
    pub enable_color: bool,
    pub grid_cols: i32,
    pub grid_rows: i32,
    /// How often the hover panel re-reads stage and remaining time.
    pub hover_refresh_ms: u64,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            grid_cols: DEFAULT_COLS,
            grid_rows: DEFAULT_ROWS,
            hover_refresh_ms: 1000,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Grid size from the settings, held to `1..=MAX_SIDE` per side.
    pub fn grid_bounds(&self) -> GridBounds {
        GridBounds::new(
            self.grid_cols.clamp(1, MAX_SIDE),
            self.grid_rows.clamp(1, MAX_SIDE),
        )
    }
}

pub struct Paths {
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "isogrove", "Isogrove")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("isogrove.log"),
        data_dir: dir,
    })
}

pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        match serde_json::from_str::<Settings>(&s) {
            Ok(v) => return v,
            Err(e) => warn!("ignoring malformed settings at {}: {e}", path.display()),
        }
    }
    Settings::default()
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // Rename over an existing file is not atomic on Windows; remove first.
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
        .with_context(|| format!("renaming {} to {}", from.display(), to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_in_defaults() {
        let s: Settings = serde_json::from_str(r#"{"grid_cols": 12}"#).unwrap();
        assert_eq!(s.grid_cols, 12);
        assert_eq!(s.grid_rows, DEFAULT_ROWS);
        assert_eq!(s.grid_bounds(), GridBounds::new(12, 10));
    }

    #[test]
    fn oversized_grids_are_clamped() {
        let s: Settings =
            serde_json::from_str(r#"{"grid_cols": 100000, "grid_rows": -3}"#).unwrap();
        assert_eq!(s.grid_bounds(), GridBounds::new(MAX_SIDE, 1));
    }

    #[test]
    fn missing_settings_file_gives_defaults() {
        let path = std::env::temp_dir().join("isogrove-no-such-settings.json");
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn settings_survive_an_atomic_save() {
        let dir = std::env::temp_dir().join(format!("isogrove-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        let s = Settings {
            enable_color: false,
            hover_refresh_ms: 250,
            ..Settings::default()
        };
        save_settings_atomic(&path, &s).unwrap();
        assert_eq!(load_settings(&path), s);
        fs::remove_dir_all(&dir).ok();
    }
}
