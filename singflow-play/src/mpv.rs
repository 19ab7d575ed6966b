//! 通过 JSON IPC 控制 mpv 播放视频
//!
//! mpv 以 `--idle` 模式作为子进程启动，监听一个 unix socket，
//! 每条命令一行 JSON，响应按 `request_id` 匹配，中间夹杂的事件行直接跳过

use log::{debug, error, warn};
use serde_json::{json, Value};
use singflow_core::player::{VideoPlayer, DEFAULT_PLAYBACK_RATES};
use singflow_core::{LyricError, Result};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

const CONNECT_RETRIES: usize = 30;
const CONNECT_INTERVAL: Duration = Duration::from_millis(200);
const READ_TIMEOUT: Duration = Duration::from_secs(2);
/// 未加载文件时读取 time-pos 等属性的错误
const PROPERTY_UNAVAILABLE: &str = "property unavailable";

/// 一条 mpv IPC 连接
pub struct MpvIpc {
    writer: UnixStream,
    reader: BufReader<UnixStream>,
    next_request_id: u64,
}

impl MpvIpc {
    pub fn connect(socket: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket)?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let reader = BufReader::new(stream.try_clone()?);

        Ok(Self {
            writer: stream,
            reader,
            next_request_id: 1,
        })
    }

    /// 发送命令并等待对应的响应，返回其中的 `data`
    pub fn command(&mut self, args: Value) -> Result<Value> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let mut line = json!({ "command": args, "request_id": request_id }).to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;

        loop {
            let mut response = String::new();
            if self.reader.read_line(&mut response)? == 0 {
                return Err(LyricError::Player(String::from("mpv closed the IPC connection")));
            }

            let value: Value = serde_json::from_str(response.trim())?;
            if value.get("request_id").and_then(Value::as_u64) != Some(request_id) {
                // 事件或其他请求的响应
                continue;
            }

            return match value.get("error").and_then(Value::as_str) {
                Some("success") => Ok(value.get("data").cloned().unwrap_or(Value::Null)),
                Some(other) => Err(LyricError::Player(format!("{}: {}", args, other))),
                None => Err(LyricError::Player(format!("{}: malformed response", args))),
            };
        }
    }

    pub fn get_property(&mut self, name: &str) -> Result<Value> {
        self.command(json!(["get_property", name]))
    }

    pub fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
        self.command(json!(["set_property", name, value]))?;
        Ok(())
    }

    /// 当前播放位置，未加载文件时为 0，连接断开等错误照常返回
    pub fn time_pos(&mut self) -> Result<f64> {
        match self.get_property("time-pos") {
            Ok(value) => Ok(value.as_f64().unwrap_or(0.0)),
            Err(LyricError::Player(msg)) if msg.ends_with(PROPERTY_UNAVAILABLE) => Ok(0.0),
            Err(e) => Err(e),
        }
    }
}

pub struct MpvPlayer {
    child: Child,
    ipc: MpvIpc,
    socket: PathBuf,
}

impl MpvPlayer {
    /// 启动 mpv 子进程，等待 IPC socket 可用
    pub fn spawn(binary: &str, socket: &Path) -> Result<Self> {
        if socket.exists() {
            std::fs::remove_file(socket)?;
        }

        let mut child = Command::new(binary)
            .arg("--idle=yes")
            .arg("--force-window=yes")
            .arg("--keep-open=yes")
            .arg("--pause")
            .arg(format!("--input-ipc-server={}", socket.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LyricError::Player(format!("failed to start `{}`: {}", binary, e)))?;

        for _ in 0..CONNECT_RETRIES {
            thread::sleep(CONNECT_INTERVAL);

            if let Ok(Some(status)) = child.try_wait() {
                return Err(LyricError::Player(format!("`{}` exited early: {}", binary, status)));
            }

            if let Ok(ipc) = MpvIpc::connect(socket) {
                debug!("connected to mpv at {:?}", socket);
                return Ok(Self {
                    child,
                    ipc,
                    socket: socket.to_path_buf(),
                });
            }
        }

        let _ = child.kill();
        Err(LyricError::Player(format!(
            "mpv IPC socket {:?} never became available",
            socket
        )))
    }
}

impl Drop for MpvPlayer {
    /// 退出时终止 mpv 子进程
    fn drop(&mut self) {
        if let Err(e) = self.ipc.command(json!(["quit"])) {
            debug!("mpv quit: {}", e);
        }
        if let Err(e) = self.child.kill() {
            debug!("mpv kill: {}", e);
        }
        if let Err(e) = self.child.wait() {
            error!("failed to reap mpv: {}", e);
        }
        let _ = std::fs::remove_file(&self.socket);
    }
}

/// 11 位视频 id 转换为可直接打开的链接，其他内容（本地路径、完整链接）原样使用
pub fn video_target(video_id: &str) -> String {
    let is_id = video_id.len() == 11
        && video_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if is_id {
        format!("https://www.youtube.com/watch?v={}", video_id)
    } else {
        video_id.to_string()
    }
}

impl VideoPlayer for MpvPlayer {
    fn load_video_by_id(&mut self, video_id: &str) -> Result<()> {
        self.ipc
            .command(json!(["loadfile", video_target(video_id), "replace"]))?;
        Ok(())
    }

    fn seek_to(&mut self, seconds: f64, _allow_seek_ahead: bool) -> Result<()> {
        self.ipc
            .command(json!(["seek", seconds.max(0.0), "absolute"]))?;
        Ok(())
    }

    fn play_video(&mut self) -> Result<()> {
        self.ipc.set_property("pause", json!(false))
    }

    fn pause_video(&mut self) -> Result<()> {
        self.ipc.set_property("pause", json!(true))
    }

    fn is_playing(&mut self) -> bool {
        match self.ipc.get_property("pause") {
            Ok(value) => value == json!(false),
            Err(e) => {
                warn!("mpv pause state: {}", e);
                false
            }
        }
    }

    fn current_time(&mut self) -> Result<f64> {
        self.ipc.time_pos()
    }

    fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        self.ipc.set_property("speed", json!(rate))
    }

    fn available_playback_rates(&self) -> Vec<f64> {
        DEFAULT_PLAYBACK_RATES.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    /// 假的 mpv：先推送一条事件，再回应请求
    fn fake_mpv(socket: &Path, reply: impl Fn(&Value) -> Value + Send + 'static) {
        let listener = UnixListener::bind(socket).unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let reader = BufReader::new(stream);
            for line in reader.lines() {
                let Ok(line) = line else { break };
                let request: Value = serde_json::from_str(&line).unwrap();
                writeln!(writer, r#"{{"event":"playback-restart"}}"#).unwrap();
                let mut response = reply(&request["command"]);
                response["request_id"] = request["request_id"].clone();
                writeln!(writer, "{}", response).unwrap();
            }
        });
    }

    #[test]
    fn test_ipc_skips_events_and_matches_request_id() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("mpv.sock");
        fake_mpv(&socket, |command| {
            if command[1] == "time-pos" {
                json!({ "data": 27.5, "error": "success" })
            } else {
                json!({ "error": "property unavailable" })
            }
        });

        let mut ipc = MpvIpc::connect(&socket).unwrap();
        assert_eq!(ipc.get_property("time-pos").unwrap(), json!(27.5));
        assert!(matches!(
            ipc.get_property("duration"),
            Err(LyricError::Player(_))
        ));
        assert_eq!(ipc.get_property("time-pos").unwrap(), json!(27.5));
    }

    #[test]
    fn test_time_pos_zero_only_when_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("mpv.sock");
        fake_mpv(&socket, |_| json!({ "error": "property unavailable" }));

        let mut ipc = MpvIpc::connect(&socket).unwrap();
        assert_eq!(ipc.time_pos().unwrap(), 0.0);
    }

    #[test]
    fn test_time_pos_reports_closed_connection() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("mpv.sock");
        let listener = UnixListener::bind(&socket).unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let mut ipc = MpvIpc::connect(&socket).unwrap();
        server.join().unwrap();
        assert!(ipc.time_pos().is_err());
    }

    #[test]
    fn test_video_target() {
        assert_eq!(
            video_target("uP8CtPMAd5Q"),
            "https://www.youtube.com/watch?v=uP8CtPMAd5Q"
        );
        assert_eq!(video_target("/tmp/mou.mp4"), "/tmp/mou.mp4");
    }
}
