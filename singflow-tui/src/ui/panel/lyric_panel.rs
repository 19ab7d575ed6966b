use crate::config::style::*;
use crate::config::Command;
use crate::ui::{Controller, Session};
use ratatui::layout::Rect;
use ratatui::prelude::{Line, Span, Style, Text};
use ratatui::widgets::{Block, Borders, HighlightSpacing, List, ListItem, ListState};
use ratatui::Frame;
use singflow_core::render::{scroll_offset, FragmentKind, LineView};
use singflow_core::EditorMode;
use unicode_width::UnicodeWidthStr;

pub struct LyricPanel<'a> {
    // model
    heading: Option<String>,
    mode: EditorMode,
    practice: bool,
    hidden_count: usize,
    views: Vec<LineView>,
    /// 光标是否跟随当前演唱行，用户手动移动光标后停止跟随，`Esc` 恢复
    follow: bool,
    lyric_list_items: Vec<ListItem<'a>>,
    lyric_list_state: ListState,

    // view
    lyric_list: List<'a>,
}

impl<'a> LyricPanel<'a> {
    pub fn new() -> Self {
        Self {
            heading: None,
            mode: EditorMode::default(),
            practice: false,
            hidden_count: 0,
            views: Vec::new(),
            follow: true,
            lyric_list_items: vec![ListItem::new(Text::from(
                Line::from("输入`:open <song>`打开歌曲").centered(),
            ))],
            lyric_list_state: ListState::default(),
            lyric_list: List::default(),
        }
    }

    /// 当前选中的歌词行
    pub fn selected(&self) -> Option<usize> {
        if self.views.is_empty() {
            None
        } else {
            self.lyric_list_state.selected()
        }
    }

    /// 当前行变化时滚动
    pub fn scroll_to(&mut self, index: usize) {
        if self.follow {
            self.lyric_list_state.select(Some(index));
        }
    }

    fn active(&self) -> Option<usize> {
        self.views.iter().position(|view| view.active)
    }
}

impl<'a> Controller for LyricPanel<'a> {
    fn update_model(&mut self, session: &Session) -> bool {
        let state = &session.state;
        let heading = state.song.as_ref().map(|song| song.heading());
        let views = state.line_views();

        let song_changed = heading != self.heading;
        if !song_changed
            && views == self.views
            && state.mode == self.mode
            && state.practice == self.practice
        {
            return false;
        }

        self.heading = heading;
        self.mode = state.mode;
        self.practice = state.practice;
        self.hidden_count = state.hidden.len();
        self.views = views;
        self.lyric_list_items = self.views.iter().map(line_item).collect();

        // 换歌后从头开始，防止悬空
        if song_changed || self.lyric_list_state.selected().is_none() {
            self.follow = true;
            self.lyric_list_state.select(Some(0));
        }
        if let Some(selected) = self.lyric_list_state.selected() {
            if selected >= self.views.len() {
                self.lyric_list_state.select(self.views.len().checked_sub(1));
            }
        }

        true
    }

    fn handle_event(&mut self, cmd: &Command) -> bool {
        let len = self.views.len();
        if len == 0 {
            return false;
        }

        match cmd {
            Command::Down => {
                // 直接使用 select_next() 存在越界问题
                self.follow = false;
                if let Some(selected) = self.lyric_list_state.selected() {
                    if selected < len - 1 {
                        self.lyric_list_state.select_next();
                    }
                }
            }
            Command::Up => {
                self.follow = false;
                self.lyric_list_state.select_previous();
            }
            Command::GoToTop => {
                self.follow = false;
                self.lyric_list_state.select_first();
            }
            Command::GoToBottom => {
                // 使用 select_last() 会越界
                self.follow = false;
                self.lyric_list_state.select(Some(len - 1));
            }
            Command::Esc => {
                self.follow = true;
                if let Some(active) = self.active() {
                    self.lyric_list_state.select(Some(active));
                }
            }
            _ => return false,
        }

        true
    }

    fn update_view(&mut self, style: &Style) {
        let mut block = Block::default().borders(Borders::ALL).border_style(PANEL_BORDER_STYLE);
        block = match &self.heading {
            Some(heading) => block
                .title(Line::from(format!("\u{1F3B5}{}", heading)).left_aligned())
                .title(Line::from(format!(" {} ", self.mode)).right_aligned()),
            None => block.title("\u{1F3B6}no song loaded"),
        };
        if self.practice {
            block = block.title_bottom(
                Line::from(format!("practice · {} hidden", self.hidden_count)).centered(),
            );
        }

        self.lyric_list = List::new(self.lyric_list_items.clone())
            .style(*style)
            .block(block)
            .highlight_style(ITEM_SELECTED_STYLE)
            .highlight_spacing(HighlightSpacing::WhenSelected);
    }

    fn draw(&self, frame: &mut Frame, chunk: Rect) {
        let mut lyric_list_state = self.lyric_list_state.clone();

        // 当前行位于可视区域约三分之一处
        if let Some(selected) = lyric_list_state.selected() {
            let heights: Vec<usize> = self.views.iter().map(LineView::height).collect();
            let viewport = chunk.height.saturating_sub(2) as usize;
            *lyric_list_state.offset_mut() = scroll_offset(selected, &heights, viewport);
        }

        frame.render_stateful_widget(&self.lyric_list, chunk, &mut lyric_list_state);
    }
}

fn fragment_style(kind: FragmentKind) -> Style {
    match kind {
        FragmentKind::Kanji | FragmentKind::Blank => Style::default(),
        FragmentKind::Kana => KANA_STYLE,
        FragmentKind::Romaji => ROMAJI_STYLE,
        FragmentKind::English => ENGLISH_STYLE,
    }
}

/// 隐藏的行保留宽度，只遮住文字
fn mask(text: &str) -> String {
    "░".repeat(text.width().max(1))
}

/// 第一行前的标记：时间戳、录音状态
fn markers(view: &LineView) -> Vec<Span<'static>> {
    let mut markers = Vec::new();
    if let Some(label) = &view.time_label {
        markers.push(Span::styled(format!("{} ", label), TIME_LABEL_STYLE));
    }
    if let Some(tools) = view.tools {
        if tools.recording {
            markers.push(Span::styled("● REC ", RECORDING_STYLE));
        } else if tools.has_recording {
            markers.push(Span::styled("♪ ", TIME_LABEL_STYLE));
        }
    }
    markers
}

fn line_item(view: &LineView) -> ListItem<'static> {
    let mut lines: Vec<Line> = view
        .fragments
        .iter()
        .map(|fragment| {
            if view.hidden && fragment.kind != FragmentKind::Blank {
                Line::from(Span::styled(mask(&fragment.text), HIDDEN_STYLE)).centered()
            } else {
                Line::from(Span::styled(fragment.text.clone(), fragment_style(fragment.kind)))
                    .centered()
            }
        })
        .collect();

    let mut prefix = markers(view);
    if let Some(first) = lines.first_mut() {
        if !prefix.is_empty() {
            prefix.append(&mut first.spans);
            first.spans = prefix;
        }
    }

    let item = ListItem::new(Text::from(lines));
    if view.active {
        item.style(LYRIC_FOCUSED_STYLE)
    } else {
        item
    }
}
