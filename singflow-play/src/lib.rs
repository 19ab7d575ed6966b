mod audio;
mod clock;
#[cfg(unix)]
mod mpv;
mod state;

pub use audio::NoAudio;
#[cfg(feature = "mic")]
pub use audio::MicRecorder;
pub use clock::ClockPlayer;
#[cfg(unix)]
pub use mpv::{video_target, MpvIpc, MpvPlayer};
pub use state::PlayState;

use serde::{Deserialize, Serialize};
use singflow_core::practice::PracticeAudio;
use singflow_core::{LyricError, Result, VideoPlayer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// 无画面的时间轴
    #[default]
    Clock,
    /// 外部 mpv 进程
    Mpv,
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerKind::Clock => write!(f, "clock"),
            PlayerKind::Mpv => write!(f, "mpv"),
        }
    }
}

impl FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clock" => Ok(PlayerKind::Clock),
            "mpv" => Ok(PlayerKind::Mpv),
            other => Err(format!("unknown player `{}` (expected clock or mpv)", other)),
        }
    }
}

/// 按配置创建播放器
pub fn open_player(kind: PlayerKind, mpv_binary: &str, socket: &Path) -> Result<Box<dyn VideoPlayer>> {
    match kind {
        PlayerKind::Clock => Ok(Box::new(ClockPlayer::new())),
        #[cfg(unix)]
        PlayerKind::Mpv => Ok(Box::new(MpvPlayer::spawn(mpv_binary, socket)?)),
        #[cfg(not(unix))]
        PlayerKind::Mpv => {
            let _ = (mpv_binary, socket);
            Err(LyricError::Player(String::from("mpv backend requires a unix platform")))
        }
    }
}

/// 录音设备：启用 `mic` 特性时使用默认麦克风
pub fn default_audio() -> Box<dyn PracticeAudio> {
    #[cfg(feature = "mic")]
    {
        Box::new(MicRecorder::new())
    }
    #[cfg(not(feature = "mic"))]
    {
        Box::new(NoAudio)
    }
}

/// 播放器失败时退回到时间轴播放器
pub fn open_player_or_clock(kind: PlayerKind, mpv_binary: &str, socket: &Path) -> (Box<dyn VideoPlayer>, Option<LyricError>) {
    match open_player(kind, mpv_binary, socket) {
        Ok(player) => (player, None),
        Err(e) => {
            log::error!("failed to open {} player: {}", kind, e);
            (Box::new(ClockPlayer::new()), Some(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_kind_parse() {
        assert_eq!("MPV".parse::<PlayerKind>(), Ok(PlayerKind::Mpv));
        assert_eq!("clock".parse::<PlayerKind>(), Ok(PlayerKind::Clock));
        assert!("vlc".parse::<PlayerKind>().is_err());
        assert_eq!(serde_json::to_string(&PlayerKind::Mpv).unwrap(), r#""mpv""#);
    }

    #[test]
    fn test_missing_mpv_falls_back_to_clock() {
        let dir = tempfile::tempdir().unwrap();
        let (mut player, err) = open_player_or_clock(
            PlayerKind::Mpv,
            "/nonexistent/singflow-mpv",
            &dir.path().join("mpv.sock"),
        );
        assert!(err.is_some());
        assert_eq!(player.current_time().unwrap(), 0.0);
    }
}
