//! 应用状态与状态迁移
//!
//! 所有迁移都是 `update(&mut AppState, Action) -> Vec<Effect>`：只修改状态并描述需要执行的副作用，
//! 不做任何 IO。副作用（渲染、跳转、持久化、录音）由调用方执行，结果再以 `Action` 的形式送回

use crate::editor::{self, EditorMode, LineAction};
use crate::loader;
use crate::model::{Line, ManifestEntry, Song};
use crate::player::{snap_playback_rate, step_playback_rate};
use crate::practice::{
    self, hidden_lines_key, parse_practice_flag, practice_flag_value, practice_mode_key, Clip,
    HiddenLines, Recordings, StoredPractice,
};
use crate::render::{self, DisplayToggles, LineView, RenderContext, Toggle, VocabEntry};
use crate::sync::{SyncState, Tick};
use log::{debug, info};

#[derive(Debug, Default)]
pub struct AppState {
    pub manifest: Vec<ManifestEntry>,
    /// 当前歌曲在清单中的位置，手动加载的文档为 `None`
    pub current_index: Option<usize>,
    pub song: Option<Song>,
    pub song_id: Option<String>,
    pub toggles: DisplayToggles,
    pub mode: EditorMode,
    pub practice: bool,
    pub hidden: HiddenLines,
    pub recordings: Recordings,
    pub sync: SyncState,
    pub playback_rate: f64,
}

impl AppState {
    pub fn new(toggles: DisplayToggles) -> Self {
        Self {
            toggles,
            playback_rate: 1.0,
            ..Default::default()
        }
    }

    pub fn lines(&self) -> &[Line] {
        self.song.as_ref().map(|s| s.lyrics.as_slice()).unwrap_or(&[])
    }

    pub fn active_line(&self) -> Option<usize> {
        self.sync.active()
    }

    pub fn line_views(&self) -> Vec<LineView> {
        render::build_line_views(
            self.lines(),
            &RenderContext {
                toggles: &self.toggles,
                hidden: &self.hidden,
                practice: self.practice,
                mode: self.mode,
                active: self.sync.active(),
                recordings: &self.recordings,
            },
        )
    }

    pub fn vocab(&self) -> Vec<VocabEntry> {
        let line = self.sync.active().and_then(|i| self.lines().get(i));
        render::vocab_entries(line, &self.toggles)
    }

    pub fn has_prev_song(&self) -> bool {
        matches!(self.current_index, Some(i) if i > 0)
    }

    pub fn has_next_song(&self) -> bool {
        matches!(self.current_index, Some(i) if i + 1 < self.manifest.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ManifestLoaded(Vec<ManifestEntry>),
    SongLoaded {
        index: Option<usize>,
        song: Song,
        /// 持久化 key 的作用域，见 `song_identity`
        song_id: String,
        stored: StoredPractice,
    },
    LoadFailed(String),
    /// 定时轮询，`now` 为播放器当前时间
    Tick { now: f64 },
    /// 点击歌词行内容
    LineClicked { index: usize, now: f64 },
    /// 工具按钮：播放这一行
    PlayLine(usize),
    ToggleMode,
    SetMode(EditorMode),
    ToggleDisplay(Toggle),
    TogglePractice,
    ToggleHidden(usize),
    RevealAll,
    Record(usize),
    RecordingStarted(usize),
    RecordingStopped(Clip),
    RecordingFailed(String),
    PlayRecording(usize),
    ChangeRate { requested: f64, available: Vec<f64> },
    StepRate { up: bool, available: Vec<f64> },
    Export,
    PrevSong,
    NextSong,
    OpenSong(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// 重建歌词视图
    Render,
    LoadVideo(String),
    /// `seek_to(t, true)` 后 `play_video()`
    Seek(f64),
    SetPlaybackRate(f64),
    /// 高亮当前行（`None` 取消高亮）
    Highlight(Option<usize>),
    ScrollTo(usize),
    RefreshVocab(Option<usize>),
    Persist { key: String, value: String },
    StartRecording(usize),
    StopRecording,
    PlayClip(usize),
    FetchSong(usize),
    WriteExport { file_name: String, contents: String },
    Notify(String),
}

pub fn update(state: &mut AppState, action: Action) -> Vec<Effect> {
    match action {
        Action::ManifestLoaded(manifest) => {
            info!("manifest loaded: {} songs", manifest.len());
            state.manifest = manifest;
            vec![Effect::Render]
        }
        Action::SongLoaded {
            index,
            song,
            song_id,
            stored,
        } => song_loaded(state, index, song, song_id, stored),
        Action::LoadFailed(message) => vec![Effect::Notify(message)],
        Action::Tick { now } => tick(state, now),
        Action::LineClicked { index, now } => line_clicked(state, index, now),
        Action::PlayLine(index) => match state.lines().get(index).and_then(|l| l.time) {
            Some(time) => vec![Effect::Seek(time)],
            None => Vec::new(),
        },
        Action::ToggleMode => set_mode(state, state.mode.toggled()),
        Action::SetMode(mode) => set_mode(state, mode),
        Action::ToggleDisplay(toggle) => {
            state.toggles.flip(toggle);
            if toggle.is_vocab() {
                vec![Effect::RefreshVocab(state.sync.active())]
            } else {
                vec![Effect::Render]
            }
        }
        Action::TogglePractice => {
            state.practice = !state.practice;
            let mut effects = Vec::new();
            if let Some(song_id) = &state.song_id {
                effects.push(Effect::Persist {
                    key: practice_mode_key(song_id),
                    value: practice_flag_value(state.practice).to_string(),
                });
            }
            effects.push(Effect::Render);
            effects
        }
        Action::ToggleHidden(index) => {
            if index >= state.lines().len() {
                return Vec::new();
            }
            let hidden = state.hidden.toggle(index);
            debug!("line {} hidden: {}", index, hidden);
            let mut effects = persist_hidden(state);
            effects.push(Effect::Render);
            effects
        }
        Action::RevealAll => {
            state.hidden.clear();
            let mut effects = persist_hidden(state);
            effects.push(Effect::Render);
            effects
        }
        Action::Record(index) => record(state, index),
        Action::RecordingStarted(index) => {
            state.recordings.begin(index);
            vec![Effect::Render]
        }
        Action::RecordingStopped(clip) => {
            if state.recordings.finish(clip).is_some() {
                debug!("released previous recording");
            }
            vec![Effect::Render]
        }
        Action::RecordingFailed(message) => {
            state.recordings.abort();
            vec![Effect::Notify(message), Effect::Render]
        }
        Action::PlayRecording(index) => {
            if state.recordings.has_clip(index) {
                vec![Effect::PlayClip(index)]
            } else {
                Vec::new()
            }
        }
        Action::ChangeRate {
            requested,
            available,
        } => {
            state.playback_rate = snap_playback_rate(requested, &available);
            vec![Effect::SetPlaybackRate(state.playback_rate)]
        }
        Action::StepRate { up, available } => {
            state.playback_rate = step_playback_rate(state.playback_rate, &available, up);
            vec![Effect::SetPlaybackRate(state.playback_rate)]
        }
        Action::Export => export(state),
        Action::PrevSong => match state.current_index {
            Some(i) if i > 0 => vec![Effect::FetchSong(i - 1)],
            _ => Vec::new(),
        },
        Action::NextSong => match state.current_index {
            Some(i) if i + 1 < state.manifest.len() => vec![Effect::FetchSong(i + 1)],
            _ => Vec::new(),
        },
        Action::OpenSong(selector) => match loader::find_entry(&state.manifest, &selector) {
            Some(index) => vec![Effect::FetchSong(index)],
            None => vec![Effect::Notify(format!("No song matches `{}`", selector))],
        },
    }
}

fn song_loaded(
    state: &mut AppState,
    index: Option<usize>,
    song: Song,
    song_id: String,
    stored: StoredPractice,
) -> Vec<Effect> {
    let mut effects = Vec::new();

    // 先停止进行中的录音，再丢弃上一首歌的录音
    if state.recordings.active().is_some() {
        effects.push(Effect::StopRecording);
    }
    state.recordings.clear();
    state.sync.reset();

    info!("song loaded: {} ({})", song.heading(), song_id);

    state.hidden = HiddenLines::from_json(stored.hidden_lines.as_deref());
    state.practice = parse_practice_flag(stored.practice_mode.as_deref());

    if let Some(video_id) = song.video_ref() {
        effects.push(Effect::LoadVideo(video_id));
    }
    if let Some(entry) = index.and_then(|i| state.manifest.get(i)) {
        effects.push(Effect::Persist {
            key: practice::LAST_SONG_KEY.to_string(),
            value: entry.reference().to_string(),
        });
    }

    effects.push(Effect::Notify(format!("Loaded song: {}", song.heading())));

    state.current_index = index;
    state.song_id = Some(song_id);
    state.song = Some(song);

    effects.extend([
        Effect::Render,
        Effect::Highlight(None),
        Effect::RefreshVocab(None),
    ]);
    effects
}

fn tick(state: &mut AppState, now: f64) -> Vec<Effect> {
    let Some(song) = &state.song else {
        return Vec::new();
    };

    match state.sync.observe(&song.lyrics, now) {
        Tick::Unchanged => Vec::new(),
        Tick::Changed(index) => {
            let mut effects = vec![Effect::Highlight(index)];
            if let Some(index) = index {
                effects.push(Effect::ScrollTo(index));
            }
            effects.push(Effect::RefreshVocab(index));
            effects
        }
    }
}

fn line_clicked(state: &mut AppState, index: usize, now: f64) -> Vec<Effect> {
    let Some(song) = state.song.as_mut() else {
        return Vec::new();
    };

    match editor::line_action(state.mode, &song.lyrics, index, now) {
        LineAction::Stamp { index, time } => {
            editor::stamp(&mut song.lyrics, index, time);
            debug!("line {} stamped at {:.3}s", index, time);
            vec![Effect::Render]
        }
        LineAction::Seek { time } => vec![Effect::Seek(time)],
        LineAction::Nothing => Vec::new(),
    }
}

fn set_mode(state: &mut AppState, mode: EditorMode) -> Vec<Effect> {
    if state.mode == mode {
        return Vec::new();
    }
    state.mode = mode;
    vec![Effect::Render]
}

fn persist_hidden(state: &AppState) -> Vec<Effect> {
    match &state.song_id {
        Some(song_id) => vec![Effect::Persist {
            key: hidden_lines_key(song_id),
            value: state.hidden.to_json(),
        }],
        None => Vec::new(),
    }
}

/// 同一行再次录音即停止；其他行正在录音时先停止它
fn record(state: &mut AppState, index: usize) -> Vec<Effect> {
    if index >= state.lines().len() {
        return Vec::new();
    }

    match state.recordings.active() {
        Some(active) if active == index => vec![Effect::StopRecording],
        Some(_) => vec![Effect::StopRecording, Effect::StartRecording(index)],
        None => vec![Effect::StartRecording(index)],
    }
}

fn export(state: &AppState) -> Vec<Effect> {
    let Some(song) = &state.song else {
        return vec![Effect::Notify(String::from("No song to export"))];
    };

    match editor::export_document(song) {
        Ok(contents) => vec![Effect::WriteExport {
            file_name: editor::export_file_name(&song.title),
            contents,
        }],
        Err(e) => vec![Effect::Notify(format!("Export failed: {}", e))],
    }
}
