mod config;
mod ui;

use crate::config::{Command, Path, Settings};
use crate::ui::{App, Session};
use anyhow::Result;
use clap::Parser;
use crossterm::terminal::{enable_raw_mode, EnterAlternateScreen};
use crossterm::{event, execute};
use lazy_static::lazy_static;
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use singflow_core::{AppState, JsonFileStore, SongSource};
use singflow_play::PlayerKind;
use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

const POLL_DURATION: Duration = Duration::from_millis(100);

lazy_static! {
    static ref COMMAND_QUEUE: Mutex<VecDeque<Command>> = Mutex::new(VecDeque::new());
}

#[derive(Parser)]
#[command(name = "singflow", version, about = "Sing along with timed Japanese lyrics")]
struct Cli {
    /// 歌曲目录或 http(s) 地址（包含 index.json）
    #[arg(long)]
    root: Option<String>,

    /// 启动时打开的歌曲（id 或文件名）
    #[arg(long)]
    song: Option<String>,

    /// 视频播放器：clock / mpv
    #[arg(long)]
    player: Option<PlayerKind>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = Path::new()?;
    init_logger(cli.verbose, &path)?;

    let settings = Settings::load(&path.settings);
    let player_kind = cli.player.unwrap_or(settings.player);
    let songs_root = cli.root.unwrap_or_else(|| settings.songs_root.clone());
    info!("starting with {} player, songs from {}", player_kind, songs_root);

    let (player, player_error) =
        singflow_play::open_player_or_clock(player_kind, &settings.mpv_binary, &path.mpv_socket);
    let session = Session::new(
        AppState::new(settings.default_toggles),
        player,
        Box::new(JsonFileStore::open(&path.storage)),
        singflow_play::default_audio(),
        SongSource::from_root(&songs_root),
        settings.export_dir.clone().unwrap_or_else(|| path.exports.clone()),
    );

    let mut app = App::new(create_terminal()?, session);
    app.draw()?;
    app.start(cli.song.as_deref()).await;
    if let Some(e) = player_error {
        app.notify(format!("{} player unavailable ({}), using clock", player_kind, e));
    }

    // 定时同步播放进度，队列中已有未处理的同步时跳过
    let sync_interval = settings.sync_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sync_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let mut queue = COMMAND_QUEUE.lock().await;
            if !queue.contains(&Command::SyncTick) {
                queue.push_back(Command::SyncTick);
            }
        }
    });

    loop {
        // 根据 Controller 流程，先执行 update_model()，再执行 handle_event()
        app.update_model();

        if event::poll(POLL_DURATION)? {
            app.parse_key_to_event().await?;
        }

        if !app.handle_event().await? {
            return app.restore_terminal();
        }

        // 渲染
        app.draw()?;
    }
}

/// 终端被界面占用，日志写入缓存目录下的文件
fn init_logger(verbose: u8, path: &Path) -> Result<()> {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let file = File::create(&path.log_file)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    Ok(())
}

fn create_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}
