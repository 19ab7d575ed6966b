use crate::config::ScreenEnum;
use anyhow::{anyhow, Result};
use singflow_core::{EditorMode, Toggle};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    GotoScreen(ScreenEnum),
    EnterCommand,
    Esc,
    //
    Down,
    Up,
    GoToTop,
    GoToBottom,
    /// 对选中行执行当前模式下的动作（打时间戳 / 跳转）
    LineAction,
    //
    ToggleMode,
    SetMode(EditorMode),
    PlayOrPause,
    ToggleDisplay(Toggle),
    SpeedUp,
    SpeedDown,
    SetSpeed(f64),
    PrevSong,
    NextSong,
    OpenSong(String),
    LoadFile(PathBuf),
    Export(Option<PathBuf>),
    // 练习
    TogglePractice,
    PlayLine,
    ToggleHidden,
    Record,
    PlayRecording,
    RevealAll,
    //
    SyncTick,
    Nop,
}

/// 可补全的命令名
pub const COMMAND_NAMES: [&str; 17] = [
    "quit", "exit", "screen", "help", "main", "open", "load", "export", "speed", "rate", "mode",
    "practice", "reveal", "next", "prev", "top", "bottom",
];

/// 补全命令行输入：第一个词补全命令名，`open` 之后补全歌曲
///
/// 唯一匹配的命令名后追加空格；多个匹配时补全到公共前缀
pub fn complete(input: &str, songs: &[String]) -> Option<String> {
    match input.split_once(' ') {
        None => {
            let (word, unique) = complete_word(input, COMMAND_NAMES.iter().copied())?;
            Some(if unique { format!("{} ", word) } else { word })
        }
        Some((cmd @ ("o" | "open"), rest)) => {
            let (song, _) = complete_word(rest.trim_start(), songs.iter().map(String::as_str))?;
            Some(format!("{} {}", cmd, song))
        }
        Some(_) => None,
    }
}

fn complete_word<'s>(
    prefix: &str,
    candidates: impl Iterator<Item = &'s str>,
) -> Option<(String, bool)> {
    let lower = prefix.to_lowercase();
    let matches: Vec<&str> = candidates
        .filter(|candidate| candidate.to_lowercase().starts_with(&lower))
        .collect();
    let (first, others) = matches.split_first()?;

    let mut common: Vec<char> = first.chars().collect();
    for other in others {
        let len = common
            .iter()
            .zip(other.chars())
            .take_while(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
            .count();
        common.truncate(len);
    }

    // 公共前缀比已输入的短时保留输入
    if common.len() < prefix.chars().count() {
        return None;
    }
    Some((common.into_iter().collect(), others.is_empty()))
}

/// 命令名之后的全部内容（保留路径里的空格）
fn rest_of(cmd_str: &str) -> Option<&str> {
    cmd_str
        .trim()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty())
}

impl Command {
    pub fn parse(cmd_str: &str) -> Result<Self> {
        let mut tokens = cmd_str.split_whitespace();

        match tokens.next() {
            Some("q" | "quit" | "exit") => Ok(Self::Quit),
            Some("screen") => match tokens.next() {
                Some("1" | "main") => Ok(Self::GotoScreen(ScreenEnum::Main)),
                Some("0" | "help") => Ok(Self::GotoScreen(ScreenEnum::Help)),
                Some(other) => Err(anyhow!("screen: Invalid screen identifier: {}", other)),
                None => Err(anyhow!("screen: Missing argument SCREEN_ID")),
            },
            Some("h" | "help") => Ok(Self::GotoScreen(ScreenEnum::Help)),
            Some("main") => Ok(Self::GotoScreen(ScreenEnum::Main)),
            Some("o" | "open") => match rest_of(cmd_str) {
                Some(song) => Ok(Self::OpenSong(song.to_string())),
                None => Err(anyhow!("open: Missing argument SONG")),
            },
            Some("l" | "load") => match rest_of(cmd_str) {
                Some(path) => Ok(Self::LoadFile(path.into())),
                None => Err(anyhow!("load: Missing argument PATH")),
            },
            Some("export") => Ok(Self::Export(rest_of(cmd_str).map(PathBuf::from))),
            Some("speed" | "rate") => match tokens.next() {
                Some(num) => match num.trim_end_matches('x').parse::<f64>() {
                    Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(Self::SetSpeed(rate)),
                    _ => Err(anyhow!("speed: Invalid argument RATE")),
                },
                None => Err(anyhow!("speed: Missing argument RATE")),
            },
            Some("mode") => match tokens.next() {
                Some("edit" | "e") => Ok(Self::SetMode(EditorMode::Edit)),
                Some("play" | "p") => Ok(Self::SetMode(EditorMode::Play)),
                Some(other) => Err(anyhow!("mode: Invalid mode: {}", other)),
                None => Ok(Self::ToggleMode),
            },
            Some("practice") => Ok(Self::TogglePractice),
            Some("reveal") => Ok(Self::RevealAll),
            Some("next") => Ok(Self::NextSong),
            Some("prev") => Ok(Self::PrevSong),
            Some("top") => Ok(Self::GoToTop),
            Some("bottom") => Ok(Self::GoToBottom),
            Some(other) => Err(anyhow!("Invalid command: {}", other)),
            None => Ok(Self::Nop),
        }
    }
}
