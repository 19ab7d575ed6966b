//! singflow 的核心逻辑：歌曲模型、加载、歌词同步、时间戳编辑与练习状态
//!
//! 不依赖任何 UI 或播放器实现，播放器与存储通过 trait 注入

pub mod controller;
pub mod editor;
pub mod error;
pub mod loader;
pub mod model;
pub mod player;
pub mod practice;
pub mod render;
pub mod storage;
pub mod sync;

pub use controller::{update, Action, AppState, Effect};
pub use editor::EditorMode;
pub use error::{LyricError, Result};
pub use loader::SongSource;
pub use model::{Line, Lyrics, ManifestEntry, Song};
pub use player::VideoPlayer;
pub use practice::{Clip, PracticeAudio};
pub use render::{DisplayToggles, Toggle};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
