use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "singflow";

#[allow(unused)]
pub struct Path {
    // 一级目录
    pub data: PathBuf,
    pub config: PathBuf,
    pub cache: PathBuf,

    // 二级目录
    pub settings: PathBuf,
    pub storage: PathBuf,
    pub exports: PathBuf,
    pub log_file: PathBuf,
    pub mpv_socket: PathBuf,
}

impl Path {
    pub fn new() -> Result<Self> {
        let data = app_dir(dirs_next::data_dir(), "data")?;
        let config = app_dir(dirs_next::config_dir(), "config")?;
        let cache = app_dir(dirs_next::cache_dir(), "cache")?;

        let settings = config.join("settings.json");

        let storage = data.join("storage.json");

        let exports = data.join("exports");
        if !exports.exists() {
            fs::create_dir(&exports)?;
        }

        let log_file = cache.join("singflow.log");

        let mpv_socket = cache.join("mpv.sock");

        Ok(Self {
            data,
            config,
            cache,
            settings,
            storage,
            exports,
            log_file,
            mpv_socket,
        })
    }
}

fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    let dir = base
        .ok_or_else(|| anyhow!("Couldn't locate the {} directory", kind))?
        .join(APP_NAME);
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}
