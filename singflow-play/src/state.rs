use std::fmt;

/// 底部栏显示的播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    /// 未加载视频
    #[default]
    Stopped,

    /// 暂停
    Paused,

    /// 播放中
    Playing,
}

impl PlayState {
    pub fn is_playing(self) -> bool {
        self == PlayState::Playing
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayState::Stopped => write!(f, "■"),
            PlayState::Paused => write!(f, "⏸"),
            PlayState::Playing => write!(f, "▶"),
        }
    }
}
