use crate::config::style::*;
use crate::config::Command;
use crate::ui::{Controller, Session};
use ratatui::layout::{Layout, Rect};
use ratatui::prelude::{Constraint, Direction, Style};
use ratatui::style::palette::tailwind;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;
use singflow_core::player::format_rate;
use singflow_core::{EditorMode, Toggle};

pub struct BottomBar<'a> {
    // model
    info_bar_text: Text<'a>,
    //
    stamped_ratio: f64,
    progress_label: String,
    song_position: Option<String>,
    //
    toggles: Vec<(Toggle, bool)>,

    // view
    control_bar: Paragraph<'a>,
    progress_bar: Gauge<'a>,
    toggle_bar: Paragraph<'a>,
}

impl<'a> BottomBar<'a> {
    pub fn new(_normal_style: &Style) -> Self {
        Self {
            info_bar_text: Text::default(),
            stamped_ratio: 0.0,
            progress_label: String::new(),
            song_position: None,
            toggles: Vec::new(),
            control_bar: Paragraph::default(),
            progress_bar: Gauge::default(),
            toggle_bar: Paragraph::default(),
        }
    }
}

/// 123.4 → `02:03.4`
pub fn format_position(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    format!(
        "{:02}:{:02}.{}",
        tenths / 600,
        tenths / 10 % 60,
        tenths % 10
    )
}

impl<'a> Controller for BottomBar<'a> {
    fn update_model(&mut self, session: &Session) -> bool {
        let state = &session.state;

        // control_bar
        let mut spans = vec![
            Span::styled(
                format!(" {} ", state.mode),
                match state.mode {
                    EditorMode::Edit => RECORDING_STYLE,
                    EditorMode::Play => LYRIC_FOCUSED_STYLE,
                },
            ),
            Span::raw(format!(
                " {} {} ",
                session.play_state(),
                format_rate(state.playback_rate)
            )),
        ];
        if state.practice {
            spans.push(Span::styled("P", TOGGLE_ON_STYLE));
        }
        if session.is_recording() {
            spans.push(Span::styled(" ●", RECORDING_STYLE));
        }
        self.info_bar_text = Text::from(Line::from(spans).centered());

        // progress_bar：已打时间戳的行数
        let lines = state.lines();
        let stamped = lines.iter().filter(|line| line.is_stamped()).count();
        self.stamped_ratio = if lines.is_empty() {
            0.0
        } else {
            stamped as f64 / lines.len() as f64
        };
        self.progress_label = format!(
            "{}  ·  stamped {}/{}",
            format_position(session.position()),
            stamped,
            lines.len()
        );
        self.song_position = state
            .current_index
            .map(|index| format!("{}/{}", index + 1, state.manifest.len()));

        // toggle_bar
        self.toggles = Toggle::ALL
            .iter()
            .map(|toggle| (*toggle, state.toggles.get(*toggle)))
            .collect();

        // bottom_bar 一直保持更新
        true
    }

    fn handle_event(&mut self, _cmd: &Command) -> bool {
        true
    }

    fn update_view(&mut self, style: &Style) {
        self.control_bar = Paragraph::new(self.info_bar_text.clone())
            .block(Block::default().borders(Borders::ALL))
            .style(*style);

        self.progress_bar = Gauge::default()
            .block({
                let mut block = Block::default().borders(Borders::ALL).style(*style);
                if let Some(song_position) = &self.song_position {
                    block = block.title_top(Line::from(song_position.clone()).right_aligned());
                }
                block
            })
            .gauge_style(tailwind::PINK.c300)
            .ratio(self.stamped_ratio.clamp(0.0, 1.0))
            .label(self.progress_label.clone());

        let spans: Vec<Span> = self
            .toggles
            .iter()
            .enumerate()
            .flat_map(|(i, (toggle, on))| {
                [
                    Span::styled(
                        format!("{}.{}", i + 1, toggle),
                        if *on { TOGGLE_ON_STYLE } else { TOGGLE_OFF_STYLE },
                    ),
                    Span::raw(" "),
                ]
            })
            .collect();
        self.toggle_bar = Paragraph::new(Line::from(spans).centered())
            .block(Block::default().borders(Borders::ALL))
            .style(*style);
    }

    fn draw(&self, frame: &mut Frame, chunk: Rect) {
        let bottom_bar_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(22), Constraint::Min(10), Constraint::Length(54)].as_ref())
            .split(chunk);

        // control_bar
        frame.render_widget(&self.control_bar, bottom_bar_chunks[0]);

        // progress_bar
        frame.render_widget(&self.progress_bar, bottom_bar_chunks[1]);

        // toggle_bar
        frame.render_widget(&self.toggle_bar, bottom_bar_chunks[2]);
    }
}
