use crate::model::{deserialize_opt_id, Line};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref VIDEO_ID: Regex = Regex::new(r"(?:v=|youtu\.be/|embed/)([a-zA-Z0-9_-]{11})").unwrap();
}

#[derive(Debug, PartialEq, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// 显式 id（可选）
    #[serde(default, deserialize_with = "deserialize_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// 歌名
    #[serde(default)]
    pub title: String,

    /// 歌手
    #[serde(default)]
    pub artist: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// 歌词行，顺序即身份
    pub lyrics: Vec<Line>,
}

impl Song {
    /// 播放器需要加载的视频 id，`videoUrl` 优先
    pub fn video_ref(&self) -> Option<String> {
        let raw = self
            .video_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.video_id.as_deref())?;

        let id = extract_video_id(raw);
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// 标题栏显示
    pub fn heading(&self) -> String {
        match (self.title.is_empty(), self.artist.is_empty()) {
            (false, false) => format!("{} - {}", self.title, self.artist),
            (false, true) => self.title.clone(),
            _ => String::from("untitled"),
        }
    }
}

/// 从链接中提取 11 位视频 id；不匹配时原样返回
pub fn extract_video_id(url_or_id: &str) -> String {
    let url_or_id = url_or_id.trim();
    match VIDEO_ID.captures(url_or_id) {
        Some(caps) => caps[1].to_string(),
        None => url_or_id.to_string(),
    }
}

/// 歌曲身份，用作持久化 key 的作用域
///
/// 优先使用显式 id，否则使用文档的文件引用（清单中的 id/文件名，或手动加载的文件名）
pub fn song_identity(song: &Song, reference: &str) -> String {
    match song.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=uP8CtPMAd5Q"),
            "uP8CtPMAd5Q"
        );
    }

    #[test]
    fn test_extract_video_id_from_short_and_embed_urls() {
        assert_eq!(extract_video_id("https://youtu.be/uP8CtPMAd5Q?t=3"), "uP8CtPMAd5Q");
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/uP8CtPMAd5Q"),
            "uP8CtPMAd5Q"
        );
    }

    #[test]
    fn test_extract_video_id_passes_bare_id_through() {
        assert_eq!(extract_video_id("uP8CtPMAd5Q"), "uP8CtPMAd5Q");
        assert_eq!(extract_video_id("  local-clip  "), "local-clip");
    }

    #[test]
    fn test_video_url_wins_over_video_id() {
        let song = Song {
            video_id: Some("aaaaaaaaaaa".into()),
            video_url: Some("https://youtu.be/bbbbbbbbbbb".into()),
            ..Default::default()
        };
        assert_eq!(song.video_ref().as_deref(), Some("bbbbbbbbbbb"));
    }

    #[test]
    fn test_video_ref_missing() {
        assert_eq!(Song::default().video_ref(), None);
    }

    #[test]
    fn test_song_identity_prefers_explicit_id() {
        let mut song = Song {
            title: "Mou Ichido".into(),
            artist: "Tani Yuuki".into(),
            ..Default::default()
        };
        assert_eq!(song_identity(&song, "songs/mou.json"), "songs/mou.json");

        song.id = Some("mou-ichido".into());
        assert_eq!(song_identity(&song, "songs/mou.json"), "mou-ichido");

        song.id = Some("  ".into());
        assert_eq!(song_identity(&song, "other.json"), "other.json");
    }

    #[test]
    fn test_numeric_id_is_accepted() {
        let song: Song = serde_json::from_str(r#"{"id": 42, "lyrics": []}"#).unwrap();
        assert_eq!(song.id.as_deref(), Some("42"));
    }
}
