use crate::config::style::*;
use crate::config::{complete, Command, ScreenEnum};
use crate::ui::{Controller, Session};
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::prelude::*;
use ratatui::style::palette::tailwind;
use ratatui::text::Line;
use ratatui::widgets::Tabs;
use ratatui::Frame;
use tui_textarea::{CursorMove, TextArea};
use unicode_width::UnicodeWidthStr;

const NORMAL_TEXT: &str = " NORMAL ";
const COMMAND_TEXT: &str = " COMMAND ";
const HISTORY_LIMIT: usize = 50;

/// 底部命令行：普通模式下显示提示，命令模式下编辑命令
pub struct CommandLine<'a> {
    // model
    command_mode: bool,
    /// 当前内容是一条错误提示
    showing_error: bool,
    history: Vec<String>,
    /// 正在浏览的历史记录下标
    history_cursor: Option<usize>,
    /// 可用于 `open` 补全的歌曲
    songs: Vec<String>,

    // view
    mode_label: Line<'a>,
    colon_line: Line<'a>,
    interactive_area: TextArea<'a>,
    tabs: Tabs<'a>,
}

impl<'a> CommandLine<'a> {
    pub fn new() -> Self {
        Self {
            command_mode: false,
            showing_error: false,
            history: Vec::new(),
            history_cursor: None,
            songs: Vec::new(),
            mode_label: Line::default(),
            colon_line: Line::default(),
            interactive_area: TextArea::default(),
            tabs: Tabs::new(vec!["main", "0.help"])
                .highlight_style(ITEM_SELECTED_STYLE)
                .padding("", "")
                .select(0)
                .italic(),
        }
    }
}

/// public
impl<'a> CommandLine<'a> {
    pub fn set_to_normal_mode(&mut self) {
        self.clear_content();
        self.command_mode = false;
        self.history_cursor = None;
    }

    pub fn set_to_command_line_mode(&mut self) {
        self.clear_content();
        self.command_mode = true;
        self.history_cursor = None;
    }

    pub fn is_command_line_mode(&self) -> bool {
        self.command_mode
    }

    pub fn get_content(&self) -> String {
        self.interactive_area.lines().first().cloned().unwrap_or_default()
    }

    pub fn set_content(&mut self, content: &str) {
        self.clear_content();
        self.interactive_area.insert_str(content);
    }

    pub fn show_error(&mut self, message: &str) {
        self.set_content(message);
        self.showing_error = true;
    }

    pub fn clear_content(&mut self) {
        self.showing_error = false;
        self.interactive_area.move_cursor(CursorMove::End);
        while self.interactive_area.delete_char() {}
    }

    pub fn is_content_empty(&self) -> bool {
        self.interactive_area.is_empty()
    }

    pub fn input(&mut self, input: KeyEvent) {
        self.showing_error = false;
        self.interactive_area.input(input);
    }

    /// 记录一条执行过的命令，连续重复的只保留一条
    pub fn push_history(&mut self, cmd: &str) {
        let cmd = cmd.trim();
        if !cmd.is_empty() && self.history.last().map(String::as_str) != Some(cmd) {
            self.history.push(cmd.to_string());
            if self.history.len() > HISTORY_LIMIT {
                self.history.remove(0);
            }
        }
        self.history_cursor = None;
    }

    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_cursor {
            Some(index) => index.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_cursor = Some(index);
        let entry = self.history[index].clone();
        self.set_content(&entry);
    }

    pub fn history_next(&mut self) {
        match self.history_cursor {
            Some(index) if index + 1 < self.history.len() => {
                self.history_cursor = Some(index + 1);
                let entry = self.history[index + 1].clone();
                self.set_content(&entry);
            }
            Some(_) => {
                // 越过最新一条时回到空输入
                self.history_cursor = None;
                self.clear_content();
            }
            None => {}
        }
    }

    /// Tab 补全命令名或歌曲
    pub fn complete(&mut self) {
        let content = self.get_content();
        if let Some(completed) = complete(&content, &self.songs) {
            if completed != content {
                self.set_content(&completed);
            }
        }
    }
}

impl<'a> Controller for CommandLine<'a> {
    fn update_model(&mut self, session: &Session) -> bool {
        let manifest = &session.state.manifest;
        if manifest.len() == self.songs.len() {
            return false;
        }

        self.songs = manifest
            .iter()
            .map(|entry| entry.reference().to_string())
            .collect();
        true
    }

    fn handle_event(&mut self, cmd: &Command) -> bool {
        if let Command::GotoScreen(to_screen) = cmd {
            self.tabs = self.tabs.to_owned().select(match to_screen {
                ScreenEnum::Main => 0,
                ScreenEnum::Help => 1,
            });
            return true;
        }
        false
    }

    fn update_view(&mut self, style: &Style) {
        let (mode_text, mode_color) = if self.command_mode {
            (COMMAND_TEXT, tailwind::YELLOW.c600)
        } else {
            (NORMAL_TEXT, tailwind::RED.c600)
        };
        self.mode_label = Line::from(mode_text).bold().italic().fg(mode_color);

        self.colon_line = Line::from(if self.command_mode { ": " } else { "" })
            .style(style.add_modifier(Modifier::BOLD));

        let text_style = if self.showing_error {
            style.fg(tailwind::RED.c400)
        } else {
            *style
        };
        self.interactive_area.set_style(text_style);
        self.interactive_area.set_cursor_line_style(text_style);
        if self.command_mode {
            self.interactive_area
                .set_cursor_style(Style::default().bg(tailwind::SLATE.c700));
        } else {
            self.interactive_area
                .set_cursor_style(Style::default().add_modifier(Modifier::HIDDEN));
        }
    }

    fn draw(&self, frame: &mut Frame, chunk: Rect) {
        let mode_text = if self.command_mode { COMMAND_TEXT } else { NORMAL_TEXT };
        let colon_width = if self.command_mode { 2 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(UnicodeWidthStr::width(mode_text) as u16),
                Constraint::Length(colon_width),
                Constraint::Fill(1),
                Constraint::Max(14),
            ])
            .split(chunk);

        frame.render_widget(&self.mode_label, chunks[0]);

        frame.render_widget(&self.colon_line, chunks[1]);

        frame.render_widget(&self.interactive_area, chunks[2]);

        frame.render_widget(&self.tabs, chunks[3]);
    }
}
