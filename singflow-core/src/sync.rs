use crate::model::Line;
use std::time::Duration;

/// 轮询播放器时间的周期
pub const SYNC_INTERVAL: Duration = Duration::from_millis(200);

/// 当前正在演唱的歌词行
///
/// 取时间戳不为空且 `time <= now` 的最大下标，而不是最接近的一行；
/// 未打点的行永远不会成为当前行
pub fn active_line_index(lines: &[Line], now: f64) -> Option<usize> {
    let mut active = None;
    for (index, line) in lines.iter().enumerate() {
        if matches!(line.time, Some(t) if t <= now) {
            active = Some(index);
        }
    }
    active
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// 与上一次轮询结果相同，什么都不做
    Unchanged,
    /// 当前行发生变化
    Changed(Option<usize>),
}

/// 记录上一次轮询的结果，只在变化时上报
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    active: Option<usize>,
}

impl SyncState {
    pub fn observe(&mut self, lines: &[Line], now: f64) -> Tick {
        let index = active_line_index(lines, now);
        if index == self.active {
            Tick::Unchanged
        } else {
            self.active = index;
            Tick::Changed(index)
        }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// 切歌时调用
    pub fn reset(&mut self) {
        self.active = None;
    }
}
