use crate::storage::KeyValueStore;
use crate::Result;
use log::warn;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

const KEY_PREFIX: &str = "singflow";

pub const LAST_SONG_KEY: &str = "singflow_lastSong";

pub fn hidden_lines_key(song_id: &str) -> String {
    format!("{}_hiddenLines_{}", KEY_PREFIX, song_id)
}

pub fn practice_mode_key(song_id: &str) -> String {
    format!("{}_practiceMode_{}", KEY_PREFIX, song_id)
}

pub fn practice_flag_value(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

pub fn parse_practice_flag(raw: Option<&str>) -> bool {
    raw == Some("1")
}

/// 背诵练习时被遮住的行（按下标）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenLines {
    indices: BTreeSet<usize>,
}

impl HiddenLines {
    /// 翻转某行的隐藏状态，返回翻转后是否隐藏
    pub fn toggle(&mut self, index: usize) -> bool {
        if !self.indices.remove(&index) {
            self.indices.insert(index);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// 存储格式：字符串数组，如 `["0","3"]`
    pub fn to_json(&self) -> String {
        let ids: Vec<String> = self.indices.iter().map(|i| i.to_string()).collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| String::from("[]"))
    }

    /// 无法解析的内容退化为空集合
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let values = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(values)) => values,
            Ok(_) => return Self::default(),
            Err(e) => {
                warn!("ignoring unreadable hidden-line set: {}", e);
                return Self::default();
            }
        };

        let indices = values
            .iter()
            .filter_map(|value| match value {
                Value::String(s) => s.trim().parse::<usize>().ok(),
                Value::Number(n) => n.as_u64().map(|n| n as usize),
                _ => None,
            })
            .collect();

        Self { indices }
    }
}

/// 切歌时从存储中读出的练习状态原始值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredPractice {
    pub hidden_lines: Option<String>,
    pub practice_mode: Option<String>,
}

impl StoredPractice {
    pub fn read(store: &dyn KeyValueStore, song_id: &str) -> Self {
        Self {
            hidden_lines: store.get(&hidden_lines_key(song_id)),
            practice_mode: store.get(&practice_mode_key(song_id)),
        }
    }
}

/// 一段练习录音
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clip {
    /// 交错排列的采样
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Clip {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }
}

/// 逐行录音，仅在本次会话内有效
///
/// 任意时刻最多只有一个正在进行的录音
#[derive(Debug, Default)]
pub struct Recordings {
    active: Option<usize>,
    clips: HashMap<usize, Clip>,
}

impl Recordings {
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_recording(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    /// 录音已开始；返回被顶替的行（调用方应已先停止它）
    pub fn begin(&mut self, index: usize) -> Option<usize> {
        self.active.replace(index)
    }

    /// 录音结束，保存到当前行并替换旧录音；没有进行中的录音时丢弃
    pub fn finish(&mut self, clip: Clip) -> Option<Clip> {
        let index = self.active.take()?;
        self.clips.insert(index, clip)
    }

    /// 录音失败或被放弃
    pub fn abort(&mut self) {
        self.active = None;
    }

    pub fn has_clip(&self, index: usize) -> bool {
        self.clips.contains_key(&index)
    }

    pub fn clip(&self, index: usize) -> Option<&Clip> {
        self.clips.get(&index)
    }

    /// 切歌时释放所有录音
    pub fn clear(&mut self) {
        self.active = None;
        self.clips.clear();
    }
}

/// 录音与回放设备
pub trait PracticeAudio {
    /// 开始录音；不支持录音时返回 `CaptureUnsupported`
    fn start(&mut self) -> Result<()>;

    /// 停止录音并返回录到的内容
    fn stop(&mut self) -> Result<Clip>;

    fn is_recording(&self) -> bool;

    fn play(&mut self, clip: &Clip) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn clip(len: usize) -> Clip {
        Clip {
            samples: vec![0.0; len],
            sample_rate: 48_000,
            channels: 1,
        }
    }

    #[test]
    fn test_double_toggle_restores_visibility() {
        let mut hidden = HiddenLines::default();
        assert!(hidden.toggle(3));
        assert!(hidden.contains(3));
        assert!(!hidden.toggle(3));
        assert!(!hidden.contains(3));
        assert!(hidden.is_empty());
    }

    #[test]
    fn test_hidden_set_json_round_trip_through_store() {
        let mut hidden = HiddenLines::default();
        hidden.toggle(0);
        hidden.toggle(7);
        assert_eq!(hidden.to_json(), r#"["0","7"]"#);

        let mut store = MemoryStore::default();
        store.set(&hidden_lines_key("mou"), &hidden.to_json()).unwrap();

        let stored = StoredPractice::read(&store, "mou");
        assert_eq!(HiddenLines::from_json(stored.hidden_lines.as_deref()), hidden);

        // 其他歌曲互不影响
        let other = StoredPractice::read(&store, "yoru");
        assert!(HiddenLines::from_json(other.hidden_lines.as_deref()).is_empty());
    }

    #[test]
    fn test_unreadable_hidden_set_degrades_to_empty() {
        assert!(HiddenLines::from_json(Some("not json")).is_empty());
        assert!(HiddenLines::from_json(Some(r#"{"0":true}"#)).is_empty());
        assert_eq!(HiddenLines::from_json(Some(r#"["2", 5, "x"]"#)).len(), 2);
    }

    #[test]
    fn test_practice_flag() {
        assert!(parse_practice_flag(Some("1")));
        assert!(!parse_practice_flag(Some("0")));
        assert!(!parse_practice_flag(None));
        assert_eq!(practice_flag_value(true), "1");
    }

    #[test]
    fn test_begin_reports_previous_recording() {
        let mut recordings = Recordings::default();
        assert_eq!(recordings.begin(1), None);
        assert_eq!(recordings.begin(4), Some(1));
        assert!(recordings.is_recording(4));
        assert!(!recordings.is_recording(1));
    }

    #[test]
    fn test_finish_replaces_prior_clip_for_same_line() {
        let mut recordings = Recordings::default();
        recordings.begin(2);
        assert_eq!(recordings.finish(clip(10)), None);
        recordings.begin(2);
        let released = recordings.finish(clip(20));
        assert_eq!(released.map(|c| c.samples.len()), Some(10));
        assert_eq!(recordings.clip(2).map(|c| c.samples.len()), Some(20));
        assert_eq!(recordings.active(), None);
    }

    #[test]
    fn test_finish_without_active_recording_drops_clip() {
        let mut recordings = Recordings::default();
        assert_eq!(recordings.finish(clip(10)), None);
        assert!(!recordings.has_clip(0));
    }

    #[test]
    fn test_clip_duration() {
        let clip = Clip {
            samples: vec![0.0; 96_000],
            sample_rate: 48_000,
            channels: 2,
        };
        assert_eq!(clip.duration(), Duration::from_secs(1));
        assert_eq!(Clip::default().duration(), Duration::ZERO);
    }
}
