//! 歌词视图模型
//!
//! 由 `(lyrics, toggles, hidden, practice)` 纯函数地构建出每一行要显示的内容，
//! 与具体的 UI 库无关

use crate::editor::EditorMode;
use crate::model::Line;
use crate::practice::{HiddenLines, Recordings};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 显示开关，只影响显示，不修改歌词数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToggles {
    pub kanji: bool,
    pub kana: bool,
    pub romaji: bool,
    pub english: bool,
    pub vocab: bool,
    pub japanese_vocab: bool,
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            kanji: true,
            kana: false,
            romaji: true,
            english: true,
            vocab: true,
            japanese_vocab: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Kanji,
    Kana,
    Romaji,
    English,
    Vocab,
    JapaneseVocab,
}

impl Toggle {
    pub const ALL: [Toggle; 6] = [
        Toggle::Kanji,
        Toggle::Kana,
        Toggle::Romaji,
        Toggle::English,
        Toggle::Vocab,
        Toggle::JapaneseVocab,
    ];

    /// 是否只影响词汇面板
    pub fn is_vocab(self) -> bool {
        matches!(self, Toggle::Vocab | Toggle::JapaneseVocab)
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Toggle::Kanji => write!(f, "漢字"),
            Toggle::Kana => write!(f, "かな"),
            Toggle::Romaji => write!(f, "Romaji"),
            Toggle::English => write!(f, "English"),
            Toggle::Vocab => write!(f, "Vocab"),
            Toggle::JapaneseVocab => write!(f, "定義"),
        }
    }
}

impl DisplayToggles {
    pub fn get(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Kanji => self.kanji,
            Toggle::Kana => self.kana,
            Toggle::Romaji => self.romaji,
            Toggle::English => self.english,
            Toggle::Vocab => self.vocab,
            Toggle::JapaneseVocab => self.japanese_vocab,
        }
    }

    pub fn flip(&mut self, toggle: Toggle) {
        let flag = match toggle {
            Toggle::Kanji => &mut self.kanji,
            Toggle::Kana => &mut self.kana,
            Toggle::Romaji => &mut self.romaji,
            Toggle::English => &mut self.english,
            Toggle::Vocab => &mut self.vocab,
            Toggle::JapaneseVocab => &mut self.japanese_vocab,
        };
        *flag = !*flag;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Kanji,
    Kana,
    Romaji,
    English,
    /// 没有任何可显示内容时的占位空行
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
}

/// 练习模式下每行的工具状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTools {
    pub recording: bool,
    pub has_recording: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineView {
    pub index: usize,
    pub fragments: Vec<Fragment>,
    /// 编辑模式下已打点行显示的时间，如 `(12.3s)`
    pub time_label: Option<String>,
    pub hidden: bool,
    pub active: bool,
    /// 仅练习模式下存在
    pub tools: Option<LineTools>,
}

impl LineView {
    /// 占用的行数
    pub fn height(&self) -> usize {
        self.fragments.len().max(1)
    }
}

pub struct RenderContext<'a> {
    pub toggles: &'a DisplayToggles,
    pub hidden: &'a HiddenLines,
    pub practice: bool,
    pub mode: EditorMode,
    pub active: Option<usize>,
    pub recordings: &'a Recordings,
}

pub fn build_line_views(lines: &[Line], ctx: &RenderContext) -> Vec<LineView> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| build_line_view(index, line, ctx))
        .collect()
}

fn build_line_view(index: usize, line: &Line, ctx: &RenderContext) -> LineView {
    let candidates = [
        (ctx.toggles.kanji, FragmentKind::Kanji, &line.kanji),
        (ctx.toggles.kana, FragmentKind::Kana, &line.kana),
        (ctx.toggles.romaji, FragmentKind::Romaji, &line.romaji),
        (ctx.toggles.english, FragmentKind::English, &line.english),
    ];

    let mut fragments: Vec<Fragment> = candidates
        .into_iter()
        .filter(|(enabled, _, _)| *enabled)
        .filter_map(|(_, kind, text)| {
            let text = sanitize(text.as_deref()?);
            if text.trim().is_empty() {
                None
            } else {
                Some(Fragment { kind, text })
            }
        })
        .collect();

    if fragments.is_empty() {
        fragments.push(Fragment {
            kind: FragmentKind::Blank,
            text: String::from(" "),
        });
    }

    let time_label = match (ctx.mode, line.time) {
        (EditorMode::Edit, Some(t)) => Some(format!("({:.1}s)", t)),
        _ => None,
    };

    let tools = ctx.practice.then(|| LineTools {
        recording: ctx.recordings.is_recording(index),
        has_recording: ctx.recordings.has_clip(index),
    });

    LineView {
        index,
        fragments,
        time_label,
        hidden: ctx.practice && ctx.hidden.contains(index),
        active: ctx.active == Some(index),
        tools,
    }
}

/// 清理来自歌曲文档的不可信文本：去掉控制字符（包括终端转义符），制表符换成空格
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabEntry {
    pub text: String,
    /// 日语释义
    pub japanese: bool,
}

/// 词汇面板内容：`vocab` 在前，`japaneseVocab` 在后，按 `;` 切分
pub fn vocab_entries(line: Option<&Line>, toggles: &DisplayToggles) -> Vec<VocabEntry> {
    let Some(line) = line else {
        return Vec::new();
    };

    let split = |raw: &Option<String>, japanese: bool| -> Vec<VocabEntry> {
        raw.as_deref()
            .unwrap_or("")
            .split(';')
            .map(|word| sanitize(word.trim()))
            .filter(|word| !word.is_empty())
            .map(|text| VocabEntry { text, japanese })
            .collect()
    };

    let mut entries = Vec::new();
    if toggles.vocab {
        entries.extend(split(&line.vocab, false));
    }
    if toggles.japanese_vocab {
        entries.extend(split(&line.japanese_vocab, true));
    }
    entries
}

/// 使当前行位于可视区域约三分之一处的滚动偏移（以行下标计）
///
/// 接近底部时不再滚动，避免下方留白
pub fn scroll_offset(active: usize, heights: &[usize], viewport: usize) -> usize {
    if active >= heights.len() {
        return 0;
    }

    let lead = viewport / 3;
    let mut offset = active;
    let mut above = 0;
    while offset > 0 && above + heights[offset - 1] <= lead {
        offset -= 1;
        above += heights[offset];
    }

    let mut max_offset = heights.len();
    let mut tail = 0;
    while max_offset > 0 && tail + heights[max_offset - 1] <= viewport {
        max_offset -= 1;
        tail += heights[max_offset];
    }

    offset.min(max_offset)
}
