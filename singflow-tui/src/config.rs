mod command;
mod path;
mod settings;
pub mod style;
mod ui;

pub use command::*;
pub use path::*;
pub use settings::*;
pub use ui::*;
