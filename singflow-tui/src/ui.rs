mod app;
mod panel;
pub mod screen;
mod session;
pub mod widget;

pub use app::App;
pub use session::Session;

use crate::config::Command;
use ratatui::prelude::*;

trait Controller {
    /// 从 session 同步 model，model 未变化的情况下返回 false，此时无需重新更新 view
    fn update_model(&mut self, session: &Session) -> bool;

    /// 响应向下传递的命令，model 未变化的情况下返回 false
    fn handle_event(&mut self, cmd: &Command) -> bool;

    /// 从 model 更新 view
    fn update_view(&mut self, style: &Style);

    /// 渲染到屏幕
    fn draw(&self, frame: &mut Frame, chunk: Rect);
}
