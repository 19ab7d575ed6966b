use crate::config::Command;
use crate::ui::{Controller, Session};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

pub struct HelpScreen<'a> {
    // view
    normal_mode_help_page: Paragraph<'a>,
    commandline_mode_help_page: Paragraph<'a>,
}

impl<'a> HelpScreen<'a> {
    pub fn new(normal_style: &Style) -> Self {
        let normal_mode_help_text = Text::from(format!(
            "\
            Up / Down:                              {}\n\
            Top / Bottom:                           {}\n\
            Line Action (stamp or seek):            {}\n\
            Follow Current Line:                    {}\n\
            Toggle Edit / Play Mode:                {}\n\
            Play/Pause:                             {}\n\
            Toggle 漢字/かな/Romaji/English:         {}\n\
            Toggle Vocab / 定義:                     {}\n\
            Toggle Practice Mode:                   {}\n\
            |_ Play Line:                           {}\n\
            |_ Hide / Show Line:                    {}\n\
            |_ Record / Stop:                       {}\n\
            |_ Play Recording:                      {}\n\
            Reveal All Lines:                       {}\n\
            Speed Down / Up:                        {}\n\
            Previous / Next Song:                   {}\n\
            Go To Help Screen (Here):               {}\n\
            *Switch To Command Line Mode:           {}\n\
            Quit:                                   {}",
            "↑ / k, ↓ / j",
            "g / G",
            "Enter",
            "Esc",
            "e",
            "\u{2423} (Space)",
            "1 / 2 / 3 / 4",
            "5 / 6",
            "P",
            "s",
            "x",
            "r",
            "p",
            "R",
            "[ / ]",
            ", / .",
            "0 / F1",
            ":",
            "q",
        ));
        let normal_mode_help_page = Paragraph::new(normal_mode_help_text)
            .block(Block::default().title("普通模式").borders(Borders::ALL))
            .style(*normal_style);

        let commandline_mode_help_text = Text::from(format!(
            "\
            Quit:                                   {}\n\
            Switch Screen:                          {}\n\
            Go To Help Screen (Here):               {}\n\
            Open Song From List:                    {} (id or file name)\n\
            Load Song Document:                     {}\n\
            Export Edited Timestamps:               {}\n\
            Set Playback Speed:                     {} (e.g. `speed 0.75`)\n\
            Set Mode:                               {}\n\
            Toggle Practice Mode:                   {}\n\
            Reveal All Lines:                       {}\n\
            Previous / Next Song:                   {}\n\
            Jump To Top / Bottom:                   {}\n\
            *Command History / Complete:            {}",
            "q / quit / exit",
            "screen 0 / 1, main",
            "h / help",
            "open <song>",
            "load <path>",
            "export [path]",
            "speed / rate",
            "mode edit / play",
            "practice",
            "reveal",
            "prev / next",
            "top / bottom",
            "↑ ↓ / Tab",
        ));
        let commandline_mode_help_page = Paragraph::new(commandline_mode_help_text)
            .block(Block::default().title("命令行模式").borders(Borders::ALL))
            .style(*normal_style);

        Self {
            normal_mode_help_page,
            commandline_mode_help_page,
        }
    }
}

impl<'a> Controller for HelpScreen<'a> {
    fn update_model(&mut self, _session: &Session) -> bool {
        false
    }

    fn handle_event(&mut self, _cmd: &Command) -> bool {
        false
    }

    fn update_view(&mut self, _style: &Style) {}

    fn draw(&self, frame: &mut Frame, chunk: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
            .split(chunk);

        frame.render_widget(&self.normal_mode_help_page, chunks[0]);

        frame.render_widget(&self.commandline_mode_help_page, chunks[1]);
    }
}
