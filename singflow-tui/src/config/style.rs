use ratatui::prelude::{Modifier, Style};
use ratatui::style::palette::tailwind;

pub const PANEL_BORDER_STYLE: Style = Style::new().fg(tailwind::RED.c700);

pub const ITEM_SELECTED_STYLE: Style = Style::new().bg(tailwind::SLATE.c700).add_modifier(Modifier::BOLD);

pub const LYRIC_FOCUSED_STYLE: Style = Style::new().fg(tailwind::RED.c500).add_modifier(Modifier::BOLD);

pub const KANA_STYLE: Style = Style::new().fg(tailwind::SLATE.c300);

pub const ROMAJI_STYLE: Style = Style::new().fg(tailwind::SKY.c300).add_modifier(Modifier::ITALIC);

pub const ENGLISH_STYLE: Style = Style::new().fg(tailwind::STONE.c400);

pub const HIDDEN_STYLE: Style = Style::new().fg(tailwind::SLATE.c600);

pub const TIME_LABEL_STYLE: Style = Style::new().fg(tailwind::AMBER.c400);

pub const RECORDING_STYLE: Style = Style::new().fg(tailwind::RED.c400).add_modifier(Modifier::BOLD);

pub const TOGGLE_ON_STYLE: Style = Style::new().fg(tailwind::WHITE).bg(tailwind::RED.c600);

pub const TOGGLE_OFF_STYLE: Style = Style::new().fg(tailwind::SLATE.c500);
