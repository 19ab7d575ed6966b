use crate::model::{Line, Song};
use crate::{loader, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// 点击歌词行时写入播放器当前时间
    Edit,
    /// 点击歌词行时跳转到该行时间戳
    #[default]
    Play,
}

impl EditorMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Edit => Self::Play,
            Self::Play => Self::Edit,
        }
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorMode::Edit => write!(f, "EDIT"),
            EditorMode::Play => write!(f, "PLAY"),
        }
    }
}

/// 点击歌词行产生的动作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineAction {
    Stamp { index: usize, time: f64 },
    Seek { time: f64 },
    Nothing,
}

pub fn line_action(mode: EditorMode, lines: &[Line], index: usize, now: f64) -> LineAction {
    let Some(line) = lines.get(index) else {
        return LineAction::Nothing;
    };

    match mode {
        EditorMode::Edit => LineAction::Stamp {
            index,
            time: now.max(0.0),
        },
        EditorMode::Play => match line.time {
            Some(time) => LineAction::Seek { time },
            None => LineAction::Nothing,
        },
    }
}

/// 写入时间戳，下标越界时返回 false
pub fn stamp(lines: &mut [Line], index: usize, time: f64) -> bool {
    match lines.get_mut(index) {
        Some(line) => {
            line.time = Some(time.max(0.0));
            true
        }
        None => false,
    }
}

/// 导出的文档只保留这几个字段
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SongDocument<'a> {
    title: &'a str,
    artist: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<&'a str>,
    lyrics: &'a [Line],
}

/// 将当前内存中的歌曲（包含编辑后的时间戳）序列化
pub fn export_document(song: &Song) -> Result<String> {
    let document = SongDocument {
        title: &song.title,
        artist: &song.artist,
        video_id: song.video_id.as_deref(),
        video_url: song.video_url.as_deref(),
        lyrics: &song.lyrics,
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

/// 空白替换为下划线
pub fn export_file_name(title: &str) -> String {
    let stem = title.split_whitespace().collect::<Vec<_>>().join("_");
    if stem.is_empty() {
        String::from("song.json")
    } else {
        format!("{}.json", stem)
    }
}

/// 手动加载文档，校验失败时不做任何修改
pub fn load_document(text: &str) -> Result<Song> {
    loader::parse_song(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LyricError;

    fn song() -> Song {
        loader::parse_song(
            r#"{
                "title": "Mou Ichido",
                "artist": "Tani Yuuki",
                "videoId": "uP8CtPMAd5Q",
                "videoUrl": "https://www.youtube.com/watch?v=uP8CtPMAd5Q",
                "lyrics": [
                    { "kanji": "ねえ", "time": null },
                    { "kanji": "いつになれば", "time": 4.0 }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_mode_toggle_is_two_way() {
        assert_eq!(EditorMode::Play.toggled(), EditorMode::Edit);
        assert_eq!(EditorMode::Edit.toggled().toggled(), EditorMode::Edit);
    }

    #[test]
    fn test_edit_click_stamps_current_time() {
        let song = song();
        assert_eq!(
            line_action(EditorMode::Edit, &song.lyrics, 0, 7.25),
            LineAction::Stamp { index: 0, time: 7.25 }
        );
    }

    #[test]
    fn test_play_click_on_unstamped_line_does_nothing() {
        let song = song();
        assert_eq!(line_action(EditorMode::Play, &song.lyrics, 0, 7.25), LineAction::Nothing);
        assert_eq!(
            line_action(EditorMode::Play, &song.lyrics, 1, 7.25),
            LineAction::Seek { time: 4.0 }
        );
    }

    #[test]
    fn test_click_out_of_range_does_nothing() {
        let song = song();
        assert_eq!(line_action(EditorMode::Edit, &song.lyrics, 9, 1.0), LineAction::Nothing);
    }

    #[test]
    fn test_exported_document_reflects_stamped_time_exactly() {
        let mut song = song();
        let t = 83.41666666666667;
        assert!(stamp(&mut song.lyrics, 0, t));

        let exported = export_document(&song).unwrap();
        let reloaded = load_document(&exported).unwrap();
        assert_eq!(reloaded.lyrics[0].time, Some(t));
        assert_eq!(reloaded.title, "Mou Ichido");
        assert_eq!(reloaded.video_id.as_deref(), Some("uP8CtPMAd5Q"));
    }

    #[test]
    fn test_export_keeps_unstamped_lines_as_null() {
        let exported = export_document(&song()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert!(value["lyrics"][0]["time"].is_null());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Mou  Ichido (Live)"), "Mou_Ichido_(Live).json");
        assert_eq!(export_file_name("   "), "song.json");
    }

    #[test]
    fn test_load_document_rejects_missing_lyrics() {
        assert!(matches!(
            load_document(r#"{ "title": "x", "artist": "y" }"#),
            Err(LyricError::InvalidSongFormat(_))
        ));
    }
}
