use thiserror::Error;

pub type Result<T> = std::result::Result<T, LyricError>;

#[derive(Debug, Error)]
pub enum LyricError {
    /// 歌曲文档结构不合法（缺少 `lyrics` 数组等）
    #[error("Invalid song format: {0}")]
    InvalidSongFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No song matches `{0}`")]
    SongNotFound(String),

    #[error("Song manifest is empty")]
    EmptyManifest,

    /// 宿主环境不支持录音
    #[error("Microphone recording isn't supported in this build")]
    CaptureUnsupported,

    /// 设备或权限问题，录音未开始
    #[error("Could not record: {0}")]
    CaptureFailed(String),

    #[error("Player error: {0}")]
    Player(String),
}
