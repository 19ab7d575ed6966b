use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Lyrics = Vec<Line>;

#[derive(Debug, PartialEq, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    /// 汉字（原文）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kanji: Option<String>,

    /// 假名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana: Option<String>,

    /// 罗马音
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romaji: Option<String>,

    /// 英文翻译
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,

    /// 词汇注释，`;` 分隔
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab: Option<String>,

    /// 日语释义，`;` 分隔
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub japanese_vocab: Option<String>,

    /// 时间戳（s），`None` 表示尚未打点
    #[serde(default)]
    pub time: Option<f64>,

    /// 结束时间（s）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,

    /// 未识别的字段，导出时原样写回
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Line {
    pub fn is_stamped(&self) -> bool {
        self.time.is_some()
    }
}
