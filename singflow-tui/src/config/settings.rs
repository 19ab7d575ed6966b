use log::{debug, warn};
use serde::{Deserialize, Serialize};
use singflow_core::DisplayToggles;
use singflow_play::PlayerKind;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// 歌曲目录或 http(s) 地址，其中包含 `index.json`
    pub songs_root: String,
    pub player: PlayerKind,
    pub mpv_binary: String,
    pub sync_interval_ms: u64,
    pub default_toggles: DisplayToggles,
    /// 未设置时导出到数据目录下的 `exports`
    pub export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            songs_root: String::from("songs"),
            player: PlayerKind::Clock,
            mpv_binary: String::from("mpv"),
            sync_interval_ms: 200,
            default_toggles: DisplayToggles::default(),
            export_dir: None,
        }
    }
}

impl Settings {
    /// 文件不存在或损坏时使用默认值
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("failed to parse settings {:?}: {}. Using defaults.", path, e);
                Self::default()
            }),
            Err(_) => {
                debug!("no settings at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms.max(20))
    }
}
