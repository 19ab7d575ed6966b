use crate::model::{ManifestEntry, Song};
use crate::{LyricError, Result};
use log::{debug, error};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "index.json";

/// 歌曲文档的来源：本地目录或静态 http 站点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongSource {
    Directory(PathBuf),
    Remote(String),
}

impl SongSource {
    pub fn from_root(root: &str) -> Self {
        if root.starts_with("http://") || root.starts_with("https://") {
            Self::Remote(root.trim_end_matches('/').to_string())
        } else {
            Self::Directory(PathBuf::from(root))
        }
    }

    /// 读取并解析 `index.json`
    pub async fn fetch_manifest(&self) -> Result<Vec<ManifestEntry>> {
        let text = self.fetch_text(MANIFEST_FILE).await.inspect_err(|e| {
            error!("failed to load {}: {}", MANIFEST_FILE, e);
        })?;

        let manifest = parse_manifest(&text)?;
        debug!("manifest: {} songs", manifest.len());

        Ok(manifest)
    }

    /// 读取并解析清单中某一项对应的歌曲文档
    pub async fn fetch_song(&self, entry: &ManifestEntry) -> Result<Song> {
        let text = self.fetch_text(&entry.file).await.inspect_err(|e| {
            error!("failed to load song {}: {}", entry.file, e);
        })?;

        parse_song(&text)
    }

    async fn fetch_text(&self, file: &str) -> Result<String> {
        match self {
            Self::Directory(root) => {
                let path = root.join(file);
                debug!("reading {:?}", path);
                Ok(tokio::fs::read_to_string(path).await?)
            }
            Self::Remote(base) => {
                let url = if file.starts_with("http://") || file.starts_with("https://") {
                    file.to_string()
                } else {
                    format!("{}/{}", base, file.trim_start_matches('/'))
                };
                debug!("fetching {}", url);
                let response = reqwest::get(&url).await?.error_for_status()?;
                Ok(response.text().await?)
            }
        }
    }
}

/// 清单必须是一个数组
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>> {
    Ok(serde_json::from_str(text)?)
}

/// 解析歌曲文档并校验最小结构
///
/// `lyrics` 缺失或不是数组、某行不是对象、时间戳为负数时返回 `InvalidSongFormat`
pub fn parse_song(text: &str) -> Result<Song> {
    let value: Value = serde_json::from_str(text)?;

    let Some(lyrics) = value.get("lyrics") else {
        return Err(LyricError::InvalidSongFormat(String::from(
            "missing `lyrics` array",
        )));
    };
    let Some(lines) = lyrics.as_array() else {
        return Err(LyricError::InvalidSongFormat(String::from(
            "`lyrics` is not an array",
        )));
    };
    if let Some(index) = lines.iter().position(|line| !line.is_object()) {
        return Err(LyricError::InvalidSongFormat(format!(
            "lyric line {} is not an object",
            index
        )));
    }

    let song: Song =
        serde_json::from_value(value).map_err(|e| LyricError::InvalidSongFormat(e.to_string()))?;

    for (index, line) in song.lyrics.iter().enumerate() {
        for t in [line.time, line.end_time].into_iter().flatten() {
            if !t.is_finite() || t < 0.0 {
                return Err(LyricError::InvalidSongFormat(format!(
                    "lyric line {} has invalid time {}",
                    index, t
                )));
            }
        }
    }

    Ok(song)
}

/// 从磁盘读取用户手动选择的歌曲文档
pub fn load_song_file(path: &Path) -> Result<Song> {
    let text = std::fs::read_to_string(path)?;
    crate::editor::load_document(&text)
}

pub fn find_entry(manifest: &[ManifestEntry], selector: &str) -> Option<usize> {
    manifest.iter().position(|entry| entry.matches(selector))
}

/// 启动时打开哪首歌：显式选择 > 上次打开 > 第一首
///
/// 显式选择没有匹配时照常退回，同时返回 `SongNotFound` 供调用方提示
pub fn initial_song(
    manifest: &[ManifestEntry],
    selector: Option<&str>,
    last_opened: Option<&str>,
) -> Result<(usize, Option<LyricError>)> {
    if manifest.is_empty() {
        return Err(LyricError::EmptyManifest);
    }

    let mut unmatched = None;
    if let Some(selector) = selector {
        match find_entry(manifest, selector) {
            Some(index) => return Ok((index, None)),
            None => unmatched = Some(LyricError::SongNotFound(selector.to_string())),
        }
    }

    let index = last_opened
        .and_then(|last| find_entry(manifest, last))
        .unwrap_or(0);
    Ok((index, unmatched))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SONG: &str = r#"{
        "title": "もう一度",
        "artist": "Tani Yuuki",
        "videoId": "uP8CtPMAd5Q",
        "lyrics": [
            { "kanji": "ねえ いつになれば君に会えるの？", "romaji": "Nee itsu ni nareba kimi ni aeru no?", "time": null },
            { "kanji": "ねえ いつになれば世界は戻るの？", "time": 12.5, "endTime": 15.0, "singer": "A" }
        ]
    }"#;

    fn manifest() -> Vec<ManifestEntry> {
        parse_manifest(
            r#"[
                { "id": "Mou-Ichido", "file": "songs/mou_ichido.json", "title": "もう一度" },
                { "file": "songs/Yoru_Ni_Kakeru.json" }
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_song() {
        let song = parse_song(SONG).unwrap();
        assert_eq!(song.title, "もう一度");
        assert_eq!(song.lyrics.len(), 2);
        assert_eq!(song.lyrics[0].time, None);
        assert_eq!(song.lyrics[1].time, Some(12.5));
        assert_eq!(song.lyrics[1].end_time, Some(15.0));
        assert_eq!(song.lyrics[1].extra.get("singer"), Some(&Value::from("A")));
    }

    #[test]
    fn test_missing_lyrics_is_invalid_format() {
        let err = parse_song(r#"{ "title": "x" }"#).unwrap_err();
        assert!(matches!(err, LyricError::InvalidSongFormat(_)));
    }

    #[test]
    fn test_lyrics_not_array_is_invalid_format() {
        let err = parse_song(r#"{ "lyrics": "la la la" }"#).unwrap_err();
        assert!(matches!(err, LyricError::InvalidSongFormat(_)));
    }

    #[test]
    fn test_line_not_object_is_invalid_format() {
        let err = parse_song(r#"{ "lyrics": [ {}, 3 ] }"#).unwrap_err();
        assert!(matches!(err, LyricError::InvalidSongFormat(msg) if msg.contains("line 1")));
    }

    #[test]
    fn test_negative_time_is_invalid_format() {
        let err = parse_song(r#"{ "lyrics": [ { "time": -1 } ] }"#).unwrap_err();
        assert!(matches!(err, LyricError::InvalidSongFormat(_)));
    }

    #[test]
    fn test_broken_json_is_json_error() {
        assert!(matches!(parse_song("{ lyrics"), Err(LyricError::Json(_))));
    }

    #[test]
    fn test_find_entry_case_insensitive() {
        let manifest = manifest();
        assert_eq!(find_entry(&manifest, "mou-ichido"), Some(0));
        assert_eq!(find_entry(&manifest, "MOU_ICHIDO.JSON"), Some(0));
        assert_eq!(find_entry(&manifest, "yoru_ni_kakeru"), Some(1));
        assert_eq!(find_entry(&manifest, "songs/yoru_ni_kakeru.json"), Some(1));
        assert_eq!(find_entry(&manifest, "gurenge"), None);
        assert_eq!(find_entry(&manifest, ""), None);
    }

    #[test]
    fn test_initial_song_precedence() {
        let manifest = manifest();
        let index = |selector, last| initial_song(&manifest, selector, last).unwrap().0;
        assert_eq!(index(None, None), 0);
        assert_eq!(index(None, Some("songs/Yoru_Ni_Kakeru.json")), 1);
        assert_eq!(index(None, Some("deleted-song")), 0);
        assert_eq!(index(Some("yoru_ni_kakeru"), Some("Mou-Ichido")), 1);
        assert!(matches!(initial_song(&[], None, None), Err(LyricError::EmptyManifest)));
    }

    #[test]
    fn test_unknown_selector_falls_back() {
        let manifest = manifest();

        let (index, unmatched) = initial_song(&manifest, Some("gurenge"), Some("yoru_ni_kakeru")).unwrap();
        assert_eq!(index, 1);
        assert!(matches!(unmatched, Some(LyricError::SongNotFound(ref s)) if s == "gurenge"));

        let (index, unmatched) = initial_song(&manifest, Some("gurenge"), None).unwrap();
        assert_eq!(index, 0);
        assert!(unmatched.is_some());

        let (_, unmatched) = initial_song(&manifest, Some("mou-ichido"), None).unwrap();
        assert!(unmatched.is_none());
    }

    #[test]
    fn test_source_from_root() {
        assert_eq!(
            SongSource::from_root("https://example.org/songs/"),
            SongSource::Remote(String::from("https://example.org/songs"))
        );
        assert_eq!(
            SongSource::from_root("./songs"),
            SongSource::Directory(PathBuf::from("./songs"))
        );
    }

    #[tokio::test]
    async fn test_directory_source_reads_manifest_and_song() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"[ { "id": "mou", "file": "mou.json" } ]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("mou.json"), SONG).unwrap();

        let source = SongSource::Directory(dir.path().to_path_buf());
        let manifest = source.fetch_manifest().await.unwrap();
        let song = source.fetch_song(&manifest[0]).await.unwrap();
        assert_eq!(song.artist, "Tani Yuuki");
    }

    #[tokio::test]
    async fn test_directory_source_missing_song_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = SongSource::Directory(dir.path().to_path_buf());
        let entry = ManifestEntry {
            id: None,
            file: String::from("missing.json"),
            title: None,
            artist: None,
        };
        assert!(matches!(source.fetch_song(&entry).await, Err(LyricError::Io(_))));
    }
}
