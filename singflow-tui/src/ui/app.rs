use crate::ui::widget::{BottomBar, CommandLine};
use crate::{
    config::{AppMode, Command, ScreenEnum},
    ui::{screen::*, Controller, Session},
    COMMAND_QUEUE,
};
use anyhow::Result;
use crossterm::{
    event,
    event::{Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};
use log::debug;
use ratatui::prelude::*;
use singflow_core::{Action, Toggle};
use std::io::Stdout;

const PRACTICE_OFF_HINT: &str = "Practice tools are off, press P to turn them on";

pub struct App<'a> {
    // model
    current_screen: ScreenEnum,
    current_mode: AppMode,
    need_re_update_view: bool,
    session: Session,

    // view
    main_screen: MainScreen<'a>,
    help_screen: HelpScreen<'a>,
    command_line: CommandLine<'a>,
    bottom_bar: BottomBar<'a>,

    // const
    terminal: Terminal<CrosstermBackend<Stdout>>,
    normal_style: Style,
}

/// public
impl<'a> App<'a> {
    pub fn new(terminal: Terminal<CrosstermBackend<Stdout>>, session: Session) -> Self {
        let normal_style = Style::default();

        Self {
            current_screen: ScreenEnum::Main,
            current_mode: AppMode::Normal,
            need_re_update_view: true,
            session,
            main_screen: MainScreen::new(&normal_style),
            help_screen: HelpScreen::new(&normal_style),
            command_line: CommandLine::new(),
            bottom_bar: BottomBar::new(&normal_style),
            terminal,
            normal_style,
        }
    }

    /// 读取歌曲清单并打开初始歌曲
    pub async fn start(&mut self, selector: Option<&str>) {
        self.session.start(selector).await;
        self.collect_session_output();

        if self.session.state.song.is_none() && self.command_line.is_content_empty() {
            self.command_line
                .set_content("按下`:`进行命令输入，输入`open <song>`打开歌曲");
        }
    }

    /// 启动前的提示（例如播放器退回到时间轴）
    pub fn notify(&mut self, message: impl Into<String>) {
        self.session.notify(message);
        self.collect_session_output();
    }

    pub fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;

        Ok(())
    }
}

/// app routine （与 Controller 略有区别）
impl<'a> App<'a> {
    pub fn update_model(&mut self) {
        let session_dirty = self.session.take_dirty();

        // screen
        let screen_changed = match self.current_screen {
            ScreenEnum::Help => false,
            ScreenEnum::Main => self.main_screen.update_model(&self.session),
        };
        self.need_re_update_view = screen_changed || session_dirty || self.need_re_update_view;

        // bottom_bar
        self.bottom_bar.update_model(&self.session);

        // command_line 补全用的歌曲列表
        self.command_line.update_model(&self.session);
    }

    /// 解析按键
    pub async fn parse_key_to_event(&mut self) -> Result<()> {
        if let Event::Key(key_event) = event::read()? {
            if key_event.kind == KeyEventKind::Press || key_event.kind == KeyEventKind::Repeat {
                match (&self.current_mode, key_event.code) {
                    // Normal 模式
                    (AppMode::Normal, _) => {
                        self.get_command_from_key(key_event.modifiers, key_event.code)
                            .await
                    }

                    // CommandLine 模式
                    (AppMode::CommandLine, KeyCode::Enter) => {
                        self.parse_command().await;
                    }
                    (AppMode::CommandLine, KeyCode::Esc) => {
                        self.back_to_normal_mode();
                    }
                    (AppMode::CommandLine, KeyCode::Up) => {
                        self.command_line.history_prev();
                    }
                    (AppMode::CommandLine, KeyCode::Down) => {
                        self.command_line.history_next();
                    }
                    (AppMode::CommandLine, KeyCode::Tab) => {
                        self.command_line.complete();
                    }
                    (AppMode::CommandLine, KeyCode::Backspace) => {
                        if self.command_line.is_content_empty() {
                            self.back_to_normal_mode();
                        } else {
                            self.command_line.input(key_event);
                        }
                    }
                    (AppMode::CommandLine, _) => {
                        self.command_line.input(key_event);
                    }
                }
            }
        }

        Ok(())
    }

    /// 事件处理（事件包括按键触发的事件和定时同步产生的事件）
    ///
    /// 返回 false 时退出程序
    pub async fn handle_event(&mut self) -> Result<bool> {
        loop {
            let mut command_queue_guard = COMMAND_QUEUE.lock().await;
            let Some(cmd) = command_queue_guard.pop_front() else {
                return Ok(true);
            };
            if !command_queue_guard.is_empty() {
                debug!("command queue: {:?}", command_queue_guard);
            }

            // 避免死锁
            drop(command_queue_guard);

            if !self.handle_command(cmd).await {
                return Ok(false);
            }

            self.collect_session_output();
        }
    }

    pub fn update_view(&mut self) {
        // screen 只在 need_re_update_view 为 true 时更新view
        if self.need_re_update_view {
            match self.current_screen {
                ScreenEnum::Help => {}
                ScreenEnum::Main => self.main_screen.update_view(&self.normal_style),
            }
            self.need_re_update_view = false;
        }

        // bottom_bar
        self.bottom_bar.update_view(&self.normal_style);

        // command_line
        self.command_line.update_view(&self.normal_style);
    }

    pub fn draw(&mut self) -> Result<()> {
        self.update_view();

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Min(3),
                        Constraint::Length(3),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(frame.area());

            // render screen
            match self.current_screen {
                ScreenEnum::Help => self.help_screen.draw(frame, chunks[0]),
                ScreenEnum::Main => self.main_screen.draw(frame, chunks[0]),
            }

            // 渲染 bottom_bar
            self.bottom_bar.draw(frame, chunks[1]);

            // render command_line
            self.command_line.draw(frame, chunks[2]);
        })?;

        Ok(())
    }
}

/// private
impl<'a> App<'a> {
    /// 返回 false 表示退出
    async fn handle_command(&mut self, cmd: Command) -> bool {
        // app响应的事件
        match cmd.clone() {
            Command::Quit => return false,
            Command::GotoScreen(to_screen) => self.switch_screen(to_screen),
            Command::EnterCommand => self.switch_to_command_line_mode(),
            Command::SyncTick => self.session.tick().await,
            Command::LineAction => {
                if let Some(index) = self.main_screen.selected_line() {
                    self.session.click_line(index).await;
                }
            }
            Command::PlayOrPause => self.session.toggle_play(),
            Command::ToggleMode => self.session.dispatch(Action::ToggleMode).await,
            Command::SetMode(mode) => self.session.dispatch(Action::SetMode(mode)).await,
            Command::ToggleDisplay(toggle) => {
                self.session.dispatch(Action::ToggleDisplay(toggle)).await
            }
            Command::SpeedUp => self.session.step_rate(true).await,
            Command::SpeedDown => self.session.step_rate(false).await,
            Command::SetSpeed(rate) => self.session.set_rate(rate).await,
            Command::PrevSong => self.session.dispatch(Action::PrevSong).await,
            Command::NextSong => self.session.dispatch(Action::NextSong).await,
            Command::OpenSong(selector) => self.session.dispatch(Action::OpenSong(selector)).await,
            Command::LoadFile(path) => self.session.load_file(&path).await,
            Command::Export(target) => self.session.export(target).await,
            Command::TogglePractice => self.session.dispatch(Action::TogglePractice).await,
            Command::RevealAll => self.session.dispatch(Action::RevealAll).await,
            Command::PlayLine | Command::ToggleHidden | Command::Record | Command::PlayRecording => {
                self.line_tool(&cmd).await
            }
            _ => {}
        }

        // 需要向下传递的事件
        match cmd {
            Command::Down
            | Command::Up
            | Command::GoToTop
            | Command::GoToBottom
            | Command::Esc => {
                // 先 update_model(), 再 handle_event()
                self.need_re_update_view = match self.current_screen {
                    ScreenEnum::Main => self.main_screen.handle_event(&cmd),
                    ScreenEnum::Help => self.help_screen.handle_event(&cmd),
                } || self.need_re_update_view;

                // 帮助页面按 Esc 返回
                if cmd == Command::Esc && self.current_screen == ScreenEnum::Help {
                    self.switch_screen(ScreenEnum::Main);
                }
            }
            Command::GotoScreen(_) => {
                self.command_line.handle_event(&cmd);
            }
            _ => {}
        }

        true
    }

    /// 练习工具只作用于光标所在行
    async fn line_tool(&mut self, cmd: &Command) {
        if !self.session.state.practice {
            self.command_line.show_error(PRACTICE_OFF_HINT);
            return;
        }
        let Some(index) = self.main_screen.selected_line() else {
            return;
        };

        let action = match cmd {
            Command::PlayLine => Action::PlayLine(index),
            Command::ToggleHidden => Action::ToggleHidden(index),
            Command::Record => Action::Record(index),
            Command::PlayRecording => Action::PlayRecording(index),
            _ => return,
        };
        self.session.dispatch(action).await;
    }

    /// 把 session 中的提示和滚动请求交给界面
    fn collect_session_output(&mut self) {
        if let Some(notice) = self.session.take_notice() {
            // 输入命令时不覆盖输入框
            if !self.command_line.is_command_line_mode() {
                self.command_line.set_content(&notice);
            }
        }

        if let Some(index) = self.session.take_scroll() {
            self.main_screen.scroll_to(index);
            self.need_re_update_view = true;
        }
    }

    async fn get_command_from_key(&mut self, key_modifiers: KeyModifiers, key_code: KeyCode) {
        if key_modifiers.contains(KeyModifiers::CONTROL) && key_code == KeyCode::Char('c') {
            COMMAND_QUEUE.lock().await.push_back(Command::Quit);
            return;
        }

        let cmd = match key_code {
            KeyCode::Down => Command::Down,
            KeyCode::Char('j') => Command::Down,
            KeyCode::Up => Command::Up,
            KeyCode::Char('k') => Command::Up,
            KeyCode::Char('g') => Command::GoToTop,
            KeyCode::Char('G') => Command::GoToBottom,
            KeyCode::Enter => Command::LineAction,
            KeyCode::Esc => Command::Esc,
            KeyCode::Char(' ') => Command::PlayOrPause,
            KeyCode::Char('e') => Command::ToggleMode,
            KeyCode::Char(c @ '1'..='6') => {
                Command::ToggleDisplay(Toggle::ALL[(c as u8 - b'1') as usize])
            }
            KeyCode::Char('P') => Command::TogglePractice,
            KeyCode::Char('s') => Command::PlayLine,
            KeyCode::Char('x') => Command::ToggleHidden,
            KeyCode::Char('r') => Command::Record,
            KeyCode::Char('p') => Command::PlayRecording,
            KeyCode::Char('R') => Command::RevealAll,
            KeyCode::Char(']') | KeyCode::Char('】') => Command::SpeedUp,
            KeyCode::Char('[') | KeyCode::Char('【') => Command::SpeedDown,
            KeyCode::Char('.') | KeyCode::Char('。') => Command::NextSong,
            KeyCode::Char(',') | KeyCode::Char('，') => Command::PrevSong,
            KeyCode::Char('0') => Command::GotoScreen(ScreenEnum::Help),
            KeyCode::F(1) => Command::GotoScreen(ScreenEnum::Help),
            KeyCode::Char(':') | KeyCode::Char('：') => Command::EnterCommand,
            KeyCode::Char('q') => Command::Quit,
            _ => Command::Nop,
        };

        COMMAND_QUEUE.lock().await.push_back(cmd);
    }

    async fn parse_command(&mut self) {
        let input_cmd = self.command_line.get_content();
        self.command_line.push_history(&input_cmd);

        self.back_to_normal_mode();

        match Command::parse(&input_cmd) {
            Ok(cmd) => {
                COMMAND_QUEUE.lock().await.push_back(cmd);
            }
            Err(e) => {
                self.command_line.show_error(format!("{e}").as_str());
            }
        }
    }

    fn back_to_normal_mode(&mut self) {
        self.current_mode = AppMode::Normal;
        self.command_line.set_to_normal_mode();
    }

    fn switch_to_command_line_mode(&mut self) {
        self.current_mode = AppMode::CommandLine;
        self.command_line.set_to_command_line_mode();
    }

    fn switch_screen(&mut self, to_screen: ScreenEnum) {
        if to_screen == ScreenEnum::Main && self.current_screen != ScreenEnum::Main {
            self.command_line.set_content("按0或F1键查看help页面");
        }

        self.need_re_update_view = true;
        self.current_screen = to_screen;
    }
}
