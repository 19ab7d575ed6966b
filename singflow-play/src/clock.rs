use crate::state::PlayState;
use log::debug;
use singflow_core::player::{VideoPlayer, DEFAULT_PLAYBACK_RATES};
use singflow_core::Result;
use std::time::Instant;

/// 无画面的播放器，只维护一条按倍速推进的时间轴
///
/// 没有安装外部播放器时用于对时间戳、练习跟唱
#[derive(Debug)]
pub struct ClockPlayer {
    state: PlayState,
    /// 最近一次暂停/跳转时的位置（s）
    base: f64,
    /// 开始播放的时刻，暂停时为 `None`
    started_at: Option<Instant>,
    rate: f64,
}

impl Default for ClockPlayer {
    fn default() -> Self {
        Self {
            state: PlayState::Stopped,
            base: 0.0,
            started_at: None,
            rate: 1.0,
        }
    }
}

impl ClockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|t| t.elapsed().as_secs_f64() * self.rate)
            .unwrap_or(0.0);
        self.base + elapsed
    }

    /// 冻结当前位置
    fn freeze(&mut self) {
        self.base = self.position();
        self.started_at = None;
    }
}

impl VideoPlayer for ClockPlayer {
    fn load_video_by_id(&mut self, video_id: &str) -> Result<()> {
        debug!("clock player loaded {}", video_id);
        self.base = 0.0;
        self.started_at = None;
        self.state = PlayState::Paused;
        Ok(())
    }

    fn seek_to(&mut self, seconds: f64, _allow_seek_ahead: bool) -> Result<()> {
        self.base = seconds.max(0.0);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn play_video(&mut self) -> Result<()> {
        if !self.state.is_playing() {
            self.started_at = Some(Instant::now());
            self.state = PlayState::Playing;
        }
        Ok(())
    }

    fn pause_video(&mut self) -> Result<()> {
        if self.state.is_playing() {
            self.freeze();
            self.state = PlayState::Paused;
        }
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        self.state.is_playing()
    }

    fn current_time(&mut self) -> Result<f64> {
        Ok(self.position())
    }

    fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        // 先按旧倍速结算已走过的时间
        if self.started_at.is_some() {
            self.freeze();
            self.started_at = Some(Instant::now());
        }
        self.rate = rate;
        Ok(())
    }

    fn available_playback_rates(&self) -> Vec<f64> {
        DEFAULT_PLAYBACK_RATES.to_vec()
    }
}
