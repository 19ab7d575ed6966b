use crate::Result;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// 持久化键值存储
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 整个存储保存为一个 JSON 对象文件，每次写入后落盘
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// 文件不存在时为空；文件损坏时记录警告并从空开始
    pub fn open(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("failed to parse {:?}: {}. Starting empty.", path, e);
                    BTreeMap::new()
                }
            },
            Err(_) => {
                debug!("no storage at {:?}", path);
                BTreeMap::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        debug!("storage stored at {:?}", &self.path);
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut store = JsonFileStore::open(&path);
        store.set("singflow_lastSong", "mou.json").unwrap();
        store.set("singflow_hiddenLines_mou", r#"["1"]"#).unwrap();
        store.set("singflow_hiddenLines_mou", "[]").unwrap();
        drop(store);

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get("singflow_lastSong").as_deref(), Some("mou.json"));
        assert_eq!(store.get("singflow_hiddenLines_mou").as_deref(), Some("[]"));
        assert_eq!(store.get("singflow_practiceMode_mou"), None);
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ nope").unwrap();

        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.get("anything"), None);
        store.set("k", "v").unwrap();
        assert_eq!(JsonFileStore::open(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("2"));
        assert_eq!(store.get("b"), None);
    }
}
