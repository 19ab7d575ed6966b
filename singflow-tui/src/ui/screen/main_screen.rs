use crate::config::Command;
use crate::ui::panel::{LyricPanel, VocabPanel};
use crate::ui::{Controller, Session};
use ratatui::layout::Rect;
use ratatui::prelude::*;
use ratatui::Frame;

pub struct MainScreen<'a> {
    // view
    lyric_panel: LyricPanel<'a>,
    vocab_panel: VocabPanel<'a>,
}

impl<'a> MainScreen<'a> {
    pub fn new(_normal_style: &Style) -> Self {
        Self {
            lyric_panel: LyricPanel::new(),
            vocab_panel: VocabPanel::new(),
        }
    }

    /// 歌词面板光标所在行，即行操作与练习工具的目标
    pub fn selected_line(&self) -> Option<usize> {
        self.lyric_panel.selected()
    }

    pub fn scroll_to(&mut self, index: usize) {
        self.lyric_panel.scroll_to(index);
    }
}

impl<'a> Controller for MainScreen<'a> {
    fn update_model(&mut self, session: &Session) -> bool {
        // 两个面板都需要更新，不能短路
        let lyric_changed = self.lyric_panel.update_model(session);
        let vocab_changed = self.vocab_panel.update_model(session);
        lyric_changed || vocab_changed
    }

    fn handle_event(&mut self, cmd: &Command) -> bool {
        self.lyric_panel.handle_event(cmd)
    }

    fn update_view(&mut self, style: &Style) {
        self.lyric_panel.update_view(style);
        self.vocab_panel.update_view(style);
    }

    fn draw(&self, frame: &mut Frame, chunk: Rect) {
        // 左侧歌词，右侧词汇
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
            .split(chunk);

        self.lyric_panel.draw(frame, chunks[0]);

        self.vocab_panel.draw(frame, chunks[1]);
    }
}
