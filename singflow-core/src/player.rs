use crate::Result;

/// 播放器不报告可用倍速时使用
pub const DEFAULT_PLAYBACK_RATES: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// 外部视频播放器
///
/// 视频本身由播放器负责，这里只消费它的时间轴
pub trait VideoPlayer {
    fn load_video_by_id(&mut self, video_id: &str) -> Result<()>;

    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) -> Result<()>;

    fn play_video(&mut self) -> Result<()>;

    fn pause_video(&mut self) -> Result<()>;

    fn is_playing(&mut self) -> bool;

    /// 当前播放位置（s）
    fn current_time(&mut self) -> Result<f64>;

    fn set_playback_rate(&mut self, rate: f64) -> Result<()>;

    fn available_playback_rates(&self) -> Vec<f64>;
}

/// 将请求的倍速吸附到最接近的可用倍速，距离相同时取靠前的
pub fn snap_playback_rate(requested: f64, available: &[f64]) -> f64 {
    let available = if available.is_empty() {
        &DEFAULT_PLAYBACK_RATES[..]
    } else {
        available
    };

    let mut best = available[0];
    let mut best_diff = (requested - best).abs();
    for &rate in available {
        let diff = (requested - rate).abs();
        if diff < best_diff {
            best = rate;
            best_diff = diff;
        }
    }
    best
}

/// 1 → `1x`，1.5 → `1.5x`，1.25 → `1.25x`
pub fn format_rate(rate: f64) -> String {
    let fixed = format!("{:.2}", rate);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{}x", trimmed)
}

/// 按可用倍速列表上调/下调一档
pub fn step_playback_rate(current: f64, available: &[f64], up: bool) -> f64 {
    let mut rates: Vec<f64> = if available.is_empty() {
        DEFAULT_PLAYBACK_RATES.to_vec()
    } else {
        available.to_vec()
    };
    rates.sort_by(|a, b| a.total_cmp(b));

    let current = snap_playback_rate(current, &rates);
    let position = rates.iter().position(|r| *r == current).unwrap_or(0);
    let next = if up {
        (position + 1).min(rates.len() - 1)
    } else {
        position.saturating_sub(1)
    };
    rates[next]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_nearest_rate() {
        assert_eq!(snap_playback_rate(1.1, &DEFAULT_PLAYBACK_RATES), 1.0);
        assert_eq!(snap_playback_rate(1.2, &DEFAULT_PLAYBACK_RATES), 1.25);
        assert_eq!(snap_playback_rate(9.0, &DEFAULT_PLAYBACK_RATES), 2.0);
        assert_eq!(snap_playback_rate(0.0, &DEFAULT_PLAYBACK_RATES), 0.5);
    }

    #[test]
    fn test_snap_tie_keeps_first() {
        assert_eq!(snap_playback_rate(0.625, &DEFAULT_PLAYBACK_RATES), 0.5);
    }

    #[test]
    fn test_snap_with_empty_list_uses_defaults() {
        assert_eq!(snap_playback_rate(0.7, &[]), 0.75);
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(1.0), "1x");
        assert_eq!(format_rate(1.5), "1.5x");
        assert_eq!(format_rate(1.25), "1.25x");
        assert_eq!(format_rate(0.5), "0.5x");
        assert_eq!(format_rate(2.0), "2x");
    }

    #[test]
    fn test_step_rate() {
        assert_eq!(step_playback_rate(1.0, &[], true), 1.25);
        assert_eq!(step_playback_rate(1.0, &[], false), 0.75);
        assert_eq!(step_playback_rate(2.0, &[], true), 2.0);
        assert_eq!(step_playback_rate(0.5, &[], false), 0.5);
    }
}
