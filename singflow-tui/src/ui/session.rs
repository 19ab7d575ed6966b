//! 执行 `update()` 产生的副作用
//!
//! 播放器、存储和录音设备都在这里被调用，结果（录音开始/结束、歌曲加载完成）
//! 作为新的 `Action` 送回状态机，按到达顺序依次处理

use log::{debug, error, info, warn};
use singflow_core::loader::{self, SongSource};
use singflow_core::model::song_identity;
use singflow_core::practice::{PracticeAudio, StoredPractice, LAST_SONG_KEY};
use singflow_core::{update, Action, AppState, Effect, KeyValueStore, Song, VideoPlayer};
use singflow_play::PlayState;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Session {
    pub state: AppState,

    player: Box<dyn VideoPlayer>,
    store: Box<dyn KeyValueStore>,
    audio: Box<dyn PracticeAudio>,
    source: SongSource,
    export_dir: PathBuf,
    export_target: Option<PathBuf>,

    // 最近一次轮询的播放器状态
    position: f64,
    playing: bool,

    notice: Option<String>,
    scroll_request: Option<usize>,
    dirty: bool,
}

impl Session {
    pub fn new(
        state: AppState,
        player: Box<dyn VideoPlayer>,
        store: Box<dyn KeyValueStore>,
        audio: Box<dyn PracticeAudio>,
        source: SongSource,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            state,
            player,
            store,
            audio,
            source,
            export_dir,
            export_target: None,
            position: 0.0,
            playing: false,
            notice: None,
            scroll_request: None,
            dirty: true,
        }
    }

    /// 读取歌曲清单并打开初始歌曲
    pub async fn start(&mut self, selector: Option<&str>) {
        let manifest = match self.source.fetch_manifest().await {
            Ok(manifest) => manifest,
            Err(e) => {
                self.notify(format!("Failed to load song list: {}", e));
                return;
            }
        };
        self.dispatch(Action::ManifestLoaded(manifest)).await;

        let last_opened = self.store.get(LAST_SONG_KEY);
        match loader::initial_song(&self.state.manifest, selector, last_opened.as_deref()) {
            Ok((index, unmatched)) => {
                let action = self.fetch_song(index).await;
                self.dispatch(action).await;
                if let Some(e) = unmatched {
                    warn!("{}", e);
                    // 退回的歌曲也加载失败时保留失败提示
                    if let Some(song) = &self.state.song {
                        let message = format!("{}, opened {}", e, song.heading());
                        self.notify(message);
                    }
                }
            }
            Err(e) => {
                error!("{}", e);
                self.notify(e.to_string());
            }
        }
    }

    pub async fn dispatch(&mut self, action: Action) {
        let mut pending = VecDeque::from([action]);

        while let Some(action) = pending.pop_front() {
            for effect in update(&mut self.state, action) {
                if let Some(next) = self.execute(effect).await {
                    pending.push_back(next);
                }
            }
        }
    }

    /// 定时轮询播放器
    pub async fn tick(&mut self) {
        match self.player.current_time() {
            Ok(now) => {
                self.position = now;
                self.playing = self.player.is_playing();
                self.dispatch(Action::Tick { now }).await;
            }
            Err(e) => warn!("failed to poll player: {}", e),
        }
    }

    /// 播放器当前时间，读取失败时使用上一次轮询的结果
    pub fn now(&mut self) -> f64 {
        match self.player.current_time() {
            Ok(now) => {
                self.position = now;
                now
            }
            Err(e) => {
                warn!("failed to read player time: {}", e);
                self.position
            }
        }
    }

    pub async fn click_line(&mut self, index: usize) {
        let now = self.now();
        self.dispatch(Action::LineClicked { index, now }).await;
    }

    pub fn toggle_play(&mut self) {
        let result = if self.player.is_playing() {
            self.player.pause_video()
        } else {
            self.player.play_video()
        };
        match result {
            Ok(()) => self.playing = self.player.is_playing(),
            Err(e) => self.notify(e.to_string()),
        }
        self.dirty = true;
    }

    pub async fn set_rate(&mut self, requested: f64) {
        let available = self.player.available_playback_rates();
        self.dispatch(Action::ChangeRate {
            requested,
            available,
        })
        .await;
    }

    pub async fn step_rate(&mut self, up: bool) {
        let available = self.player.available_playback_rates();
        self.dispatch(Action::StepRate { up, available }).await;
    }

    /// 手动加载歌曲文档，校验失败时保留当前歌曲
    pub async fn load_file(&mut self, path: &Path) {
        let action = match loader::load_song_file(path) {
            Ok(song) => {
                let reference = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.song_loaded(None, song, &reference)
            }
            Err(e) => {
                error!("failed to load {:?}: {}", path, e);
                Action::LoadFailed(format!("Failed to load {}: {}", path.display(), e))
            }
        };
        self.dispatch(action).await;
    }

    pub async fn export(&mut self, target: Option<PathBuf>) {
        self.export_target = target;
        self.dispatch(Action::Export).await;
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn take_scroll(&mut self) -> Option<usize> {
        self.scroll_request.take()
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// 未加载歌曲时为 `Stopped`
    pub fn play_state(&self) -> PlayState {
        match (&self.state.song, self.playing) {
            (None, _) => PlayState::Stopped,
            (Some(_), true) => PlayState::Playing,
            (Some(_), false) => PlayState::Paused,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.audio.is_recording()
    }
}

/// private
impl Session {
    async fn execute(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::Render | Effect::Highlight(_) | Effect::RefreshVocab(_) => {
                self.dirty = true;
            }
            Effect::ScrollTo(index) => {
                self.scroll_request = Some(index);
            }
            Effect::LoadVideo(video_id) => {
                info!("loading video {}", video_id);
                if let Err(e) = self.player.load_video_by_id(&video_id) {
                    error!("failed to load video {}: {}", video_id, e);
                    self.notify(e.to_string());
                }
            }
            Effect::Seek(time) => {
                let result = self
                    .player
                    .seek_to(time, true)
                    .and_then(|_| self.player.play_video());
                if let Err(e) = result {
                    self.notify(e.to_string());
                }
                self.position = time;
            }
            Effect::SetPlaybackRate(rate) => {
                if let Err(e) = self.player.set_playback_rate(rate) {
                    self.notify(e.to_string());
                }
                self.dirty = true;
            }
            Effect::Persist { key, value } => {
                if let Err(e) = self.store.set(&key, &value) {
                    error!("failed to persist {}: {}", key, e);
                }
            }
            Effect::StartRecording(index) => {
                return Some(match self.audio.start() {
                    Ok(()) => {
                        debug!("recording line {}", index);
                        Action::RecordingStarted(index)
                    }
                    Err(e) => Action::RecordingFailed(e.to_string()),
                });
            }
            Effect::StopRecording => {
                if !self.audio.is_recording() {
                    return None;
                }
                return Some(match self.audio.stop() {
                    Ok(clip) => {
                        debug!("recorded {:?}", clip.duration());
                        Action::RecordingStopped(clip)
                    }
                    Err(e) => Action::RecordingFailed(e.to_string()),
                });
            }
            Effect::PlayClip(index) => {
                if let Some(clip) = self.state.recordings.clip(index) {
                    if let Err(e) = self.audio.play(clip) {
                        self.notify(e.to_string());
                    }
                }
            }
            Effect::FetchSong(index) => {
                return Some(self.fetch_song(index).await);
            }
            Effect::WriteExport {
                file_name,
                contents,
            } => {
                let path = self
                    .export_target
                    .take()
                    .unwrap_or_else(|| self.export_dir.join(&file_name));
                match fs::write(&path, contents) {
                    Ok(()) => {
                        info!("exported to {:?}", path);
                        self.notify(format!("Exported to {}", path.display()));
                    }
                    Err(e) => {
                        error!("failed to export {:?}: {}", path, e);
                        self.notify(format!("Export failed: {}", e));
                    }
                }
            }
            Effect::Notify(message) => {
                self.notify(message);
            }
        }

        None
    }

    async fn fetch_song(&mut self, index: usize) -> Action {
        let Some(entry) = self.state.manifest.get(index).cloned() else {
            return Action::LoadFailed(format!("No song at position {}", index));
        };

        match self.source.fetch_song(&entry).await {
            Ok(song) => self.song_loaded(Some(index), song, entry.reference()),
            Err(e) => Action::LoadFailed(format!(
                "Failed to load {}: {}",
                entry.display_name(),
                e
            )),
        }
    }

    /// 切歌前读出新歌的练习状态
    fn song_loaded(&self, index: Option<usize>, song: Song, reference: &str) -> Action {
        let song_id = song_identity(&song, reference);
        let stored = StoredPractice::read(self.store.as_ref(), &song_id);
        Action::SongLoaded {
            index,
            song,
            song_id,
            stored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use singflow_core::practice::Clip;
    use singflow_core::{DisplayToggles, EditorMode, LyricError, MemoryStore, Result};
    use singflow_play::NoAudio;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakePlayerState {
        time: f64,
        playing: bool,
        calls: Vec<String>,
    }

    struct FakePlayer(Rc<RefCell<FakePlayerState>>);

    impl VideoPlayer for FakePlayer {
        fn load_video_by_id(&mut self, video_id: &str) -> Result<()> {
            self.0.borrow_mut().calls.push(format!("load {}", video_id));
            Ok(())
        }

        fn seek_to(&mut self, seconds: f64, _allow_seek_ahead: bool) -> Result<()> {
            let mut state = self.0.borrow_mut();
            state.time = seconds;
            state.calls.push(format!("seek {}", seconds));
            Ok(())
        }

        fn play_video(&mut self) -> Result<()> {
            let mut state = self.0.borrow_mut();
            state.playing = true;
            state.calls.push(String::from("play"));
            Ok(())
        }

        fn pause_video(&mut self) -> Result<()> {
            self.0.borrow_mut().playing = false;
            Ok(())
        }

        fn is_playing(&mut self) -> bool {
            self.0.borrow().playing
        }

        fn current_time(&mut self) -> Result<f64> {
            Ok(self.0.borrow().time)
        }

        fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
            self.0.borrow_mut().calls.push(format!("rate {}", rate));
            Ok(())
        }

        fn available_playback_rates(&self) -> Vec<f64> {
            Vec::new()
        }
    }

    #[derive(Default)]
    struct MockRecorderState {
        recording: bool,
        events: Vec<String>,
        deny: bool,
    }

    struct MockRecorder(Rc<RefCell<MockRecorderState>>);

    impl PracticeAudio for MockRecorder {
        fn start(&mut self) -> Result<()> {
            let mut state = self.0.borrow_mut();
            if state.deny {
                return Err(LyricError::CaptureFailed(String::from("permission denied")));
            }
            state.recording = true;
            state.events.push(String::from("start"));
            Ok(())
        }

        fn stop(&mut self) -> Result<Clip> {
            let mut state = self.0.borrow_mut();
            state.recording = false;
            state.events.push(String::from("stop"));
            Ok(Clip {
                samples: vec![0.1; 480],
                sample_rate: 48_000,
                channels: 1,
            })
        }

        fn is_recording(&self) -> bool {
            self.0.borrow().recording
        }

        fn play(&mut self, _clip: &Clip) -> Result<()> {
            self.0.borrow_mut().events.push(String::from("play"));
            Ok(())
        }
    }

    const MOU: &str = r#"{
        "id": "mou",
        "title": "Mou Ichido",
        "artist": "Tani Yuuki",
        "videoId": "uP8CtPMAd5Q",
        "lyrics": [
            { "kanji": "ねえ", "time": 0 },
            { "kanji": "いつになれば", "time": 12.5 },
            { "kanji": "君に会えるの", "time": null },
            { "kanji": "世界は戻るの", "time": 40 }
        ]
    }"#;

    struct Fixture {
        session: Session,
        player: Rc<RefCell<FakePlayerState>>,
        recorder: Rc<RefCell<MockRecorderState>>,
        dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.json"),
            r#"[{ "id": "mou", "file": "mou.json" }, { "id": "yoru", "file": "yoru.json" }]"#,
        )
        .unwrap();
        fs::write(dir.path().join("mou.json"), MOU).unwrap();
        fs::write(dir.path().join("yoru.json"), r#"{ "title": "broken" }"#).unwrap();

        let player = Rc::new(RefCell::new(FakePlayerState::default()));
        let recorder = Rc::new(RefCell::new(MockRecorderState::default()));
        let session = Session::new(
            AppState::new(DisplayToggles::default()),
            Box::new(FakePlayer(Rc::clone(&player))),
            Box::new(MemoryStore::default()),
            Box::new(MockRecorder(Rc::clone(&recorder))),
            SongSource::Directory(dir.path().to_path_buf()),
            dir.path().to_path_buf(),
        );

        Fixture {
            session,
            player,
            recorder,
            dir,
        }
    }

    #[tokio::test]
    async fn test_start_loads_song_and_video() {
        let mut f = fixture();
        f.session.start(None).await;

        assert_eq!(f.session.state.lines().len(), 4);
        assert_eq!(f.player.borrow().calls, vec!["load uP8CtPMAd5Q"]);
        assert_eq!(f.session.store.get(LAST_SONG_KEY).as_deref(), Some("mou"));
        assert_eq!(
            f.session.take_notice().as_deref(),
            Some("Loaded song: Mou Ichido - Tani Yuuki")
        );
    }

    #[tokio::test]
    async fn test_unknown_selector_opens_fallback_song() {
        let mut f = fixture();
        f.session.start(Some("gurenge")).await;

        assert_eq!(f.session.state.song_id.as_deref(), Some("mou"));
        assert_eq!(
            f.session.take_notice().as_deref(),
            Some("No song matches `gurenge`, opened Mou Ichido - Tani Yuuki")
        );
    }

    #[tokio::test]
    async fn test_broken_song_keeps_previous() {
        let mut f = fixture();
        f.session.start(None).await;
        f.session.dispatch(Action::NextSong).await;

        assert_eq!(f.session.state.current_index, Some(0));
        assert_eq!(f.session.state.lines().len(), 4);
        assert!(f.session.take_notice().unwrap().contains("Invalid song format"));
    }

    #[tokio::test]
    async fn test_tick_requests_scroll_once() {
        let mut f = fixture();
        f.session.start(None).await;
        f.player.borrow_mut().time = 20.0;

        f.session.tick().await;
        assert_eq!(f.session.take_scroll(), Some(1));
        f.session.tick().await;
        assert_eq!(f.session.take_scroll(), None);
    }

    #[tokio::test]
    async fn test_edit_click_then_export() {
        let mut f = fixture();
        f.session.start(None).await;
        f.session.dispatch(Action::SetMode(EditorMode::Edit)).await;
        f.player.borrow_mut().time = 27.25;

        f.session.click_line(2).await;
        f.session.export(None).await;

        let exported = fs::read_to_string(f.dir.path().join("Mou_Ichido.json")).unwrap();
        let song = loader::parse_song(&exported).unwrap();
        assert_eq!(song.lyrics[2].time, Some(27.25));
    }

    #[tokio::test]
    async fn test_play_click_seeks_and_plays() {
        let mut f = fixture();
        f.session.start(None).await;

        f.session.click_line(1).await;
        f.session.click_line(2).await;
        assert_eq!(
            f.player.borrow().calls,
            vec!["load uP8CtPMAd5Q", "seek 12.5", "play"]
        );
    }

    #[tokio::test]
    async fn test_recording_switch_stops_previous_first() {
        let mut f = fixture();
        f.session.start(None).await;

        f.session.dispatch(Action::Record(0)).await;
        f.session.dispatch(Action::Record(3)).await;

        assert_eq!(f.recorder.borrow().events, vec!["start", "stop", "start"]);
        assert!(f.session.state.recordings.has_clip(0));
        assert_eq!(f.session.state.recordings.active(), Some(3));

        f.session.dispatch(Action::Record(3)).await;
        f.session.dispatch(Action::PlayRecording(3)).await;
        assert_eq!(
            f.recorder.borrow().events,
            vec!["start", "stop", "start", "stop", "play"]
        );
    }

    #[tokio::test]
    async fn test_denied_recording_is_reported() {
        let mut f = fixture();
        f.session.start(None).await;
        f.session.take_notice();
        f.recorder.borrow_mut().deny = true;

        f.session.dispatch(Action::Record(1)).await;
        assert_eq!(f.session.state.recordings.active(), None);
        assert_eq!(
            f.session.take_notice().as_deref(),
            Some("Could not record: permission denied")
        );
    }

    #[tokio::test]
    async fn test_recording_unsupported_without_mic() {
        let mut f = fixture();
        f.session.audio = Box::new(NoAudio);
        f.session.start(None).await;
        f.session.take_notice();

        f.session.dispatch(Action::Record(0)).await;
        assert_eq!(
            f.session.take_notice().as_deref(),
            Some("Microphone recording isn't supported in this build")
        );
    }

    #[tokio::test]
    async fn test_manual_load_rejects_invalid_document() {
        let mut f = fixture();
        f.session.start(None).await;

        f.session.load_file(&f.dir.path().join("yoru.json")).await;
        assert_eq!(f.session.state.song_id.as_deref(), Some("mou"));

        f.session.load_file(&f.dir.path().join("missing.json")).await;
        assert_eq!(f.session.state.lines().len(), 4);
    }

    #[tokio::test]
    async fn test_hidden_lines_survive_reopen() {
        let mut f = fixture();
        f.session.start(None).await;
        f.session.dispatch(Action::ToggleHidden(2)).await;

        f.session.dispatch(Action::OpenSong(String::from("mou"))).await;
        assert!(f.session.state.hidden.contains(2));
    }

    #[tokio::test]
    async fn test_play_state_follows_player() {
        let mut f = fixture();
        assert_eq!(f.session.play_state(), PlayState::Stopped);

        f.session.start(None).await;
        assert_eq!(f.session.play_state(), PlayState::Paused);

        f.session.toggle_play();
        assert_eq!(f.session.play_state(), PlayState::Playing);
        assert_eq!(f.session.play_state().to_string(), "▶");
    }

    #[tokio::test]
    async fn test_anonymous_documents_keep_separate_hidden_lines() {
        let mut f = fixture();
        let anonymous = |title: &str| {
            format!(
                r#"{{ "title": "{}", "lyrics": [
                    {{ "kanji": "一", "time": 0 }},
                    {{ "kanji": "二", "time": 5 }},
                    {{ "kanji": "三", "time": 10 }}
                ] }}"#,
                title
            )
        };
        let first = f.dir.path().join("first.json");
        let other = f.dir.path().join("other.json");
        fs::write(&first, anonymous("Untitled")).unwrap();
        fs::write(&other, anonymous("Untitled")).unwrap();

        f.session.load_file(&other).await;
        assert_eq!(f.session.state.song_id.as_deref(), Some("other.json"));
        f.session.dispatch(Action::ToggleHidden(2)).await;

        f.session.load_file(&first).await;
        assert_eq!(f.session.state.song_id.as_deref(), Some("first.json"));
        assert!(!f.session.state.hidden.contains(2));

        f.session.load_file(&other).await;
        assert!(f.session.state.hidden.contains(2));
    }
}
