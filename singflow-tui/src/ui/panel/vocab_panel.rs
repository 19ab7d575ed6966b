use crate::config::style::*;
use crate::config::Command;
use crate::ui::{Controller, Session};
use ratatui::layout::Rect;
use ratatui::prelude::{Line, Style, Text};
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Frame;
use singflow_core::render::VocabEntry;

/// 当前演唱行的词汇释义
pub struct VocabPanel<'a> {
    // model
    entries: Vec<VocabEntry>,
    enabled: bool,

    // view
    vocab_list: List<'a>,
}

impl<'a> VocabPanel<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            enabled: true,
            vocab_list: List::default(),
        }
    }
}

impl<'a> Controller for VocabPanel<'a> {
    fn update_model(&mut self, session: &Session) -> bool {
        let toggles = &session.state.toggles;
        let enabled = toggles.vocab || toggles.japanese_vocab;
        let entries = session.state.vocab();

        if enabled == self.enabled && entries == self.entries {
            return false;
        }

        self.enabled = enabled;
        self.entries = entries;
        true
    }

    fn handle_event(&mut self, _cmd: &Command) -> bool {
        false
    }

    fn update_view(&mut self, style: &Style) {
        let items: Vec<ListItem> = if !self.enabled {
            vec![ListItem::new(Text::from(Line::from("(5/6 显示词汇)").centered()))]
        } else {
            self.entries
                .iter()
                .map(|entry| {
                    let line = Line::from(format!(" {}", entry.text));
                    ListItem::new(if entry.japanese {
                        line.style(KANA_STYLE)
                    } else {
                        line
                    })
                })
                .collect()
        };

        self.vocab_list = List::new(items).style(*style).block(
            Block::default()
                .title("Vocab")
                .borders(Borders::ALL)
                .border_style(PANEL_BORDER_STYLE),
        );
    }

    fn draw(&self, frame: &mut Frame, chunk: Rect) {
        frame.render_widget(&self.vocab_list, chunk);
    }
}
