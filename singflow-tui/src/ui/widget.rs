mod bottom_bar;
mod command_line;

pub use bottom_bar::BottomBar;
pub use command_line::CommandLine;
