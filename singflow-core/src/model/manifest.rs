use crate::model::deserialize_opt_id;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `index.json` 中的一项
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize, Clone)]
pub struct ManifestEntry {
    #[serde(default, deserialize_with = "deserialize_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// 歌曲文档位置（相对于歌曲根目录）
    pub file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

impl ManifestEntry {
    /// 列表中显示的名字
    pub fn display_name(&self) -> String {
        match (&self.title, &self.artist) {
            (Some(title), Some(artist)) => format!("{} - {}", title, artist),
            (Some(title), None) => title.clone(),
            _ => self.file_stem().to_string(),
        }
    }

    /// 持久化为“上次打开的歌曲”时使用的引用
    pub fn reference(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.file)
    }

    /// 去掉目录和扩展名的文件名
    pub fn file_stem(&self) -> &str {
        Path::new(&self.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file)
    }

    /// 大小写不敏感地匹配 id、文件名、或不带扩展名的文件名
    pub fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        if selector.is_empty() {
            return false;
        }

        let file_name = Path::new(&self.file)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file);

        self.id
            .as_deref()
            .is_some_and(|id| eq_ignore_case(id, selector))
            || eq_ignore_case(&self.file, selector)
            || eq_ignore_case(file_name, selector)
            || eq_ignore_case(self.file_stem(), selector)
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
