mod lyric_panel;
mod vocab_panel;

pub use lyric_panel::*;
pub use vocab_panel::*;
