//! External media playback

use async_trait::async_trait;
use serde_json::{json, Value};
use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        unix::{OwnedReadHalf, OwnedWriteHalf},
        UnixStream,
    },
    process::{Child, Command},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info, warn};

pub const DEFAULT_PLAYER_BINARY: &str = "mpv";

pub const DEFAULT_VOLUME: u8 = 70;

const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(20);

// Property observer ids
const OBSERVE_TIME_POS: u64 = 1;
const OBSERVE_DURATION: u64 = 2;
const OBSERVE_PAUSE: u64 = 3;

/// What happened to the loaded media since the last poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaStatus {
    /// Still playing, paused, or nothing loaded
    Running,
    /// Played through to the end
    Ended,
    /// The player gave up on the media
    Failed(String),
}

/// Operations the queue needs from a player backend
#[async_trait]
pub trait MediaPlayer: Send {
    /// Replace the current source. Does not start playback.
    async fn load(&mut self, path: &Path, duration: Duration) -> Result<(), String>;
    async fn play(&mut self) -> Result<(), String>;
    async fn pause(&mut self) -> Result<(), String>;
    async fn stop(&mut self) -> Result<(), String>;
    async fn seek(&mut self, position: Duration) -> Result<(), String>;
    async fn set_volume(&mut self, volume: u8) -> Result<(), String>;

    fn position(&self) -> Duration;
    fn duration(&self) -> Duration;
    fn is_playing(&self) -> bool;
    fn volume(&self) -> u8;

    /// Reports `Ended` or `Failed` exactly once per finished source
    fn poll_media_status(&mut self) -> MediaStatus;
}

/// Playback state fed by mpv's event stream
#[derive(Debug, Default)]
struct PlayerShared {
    connected: bool,
    /// A source is loaded and has not finished
    active: bool,
    paused: bool,
    position: Duration,
    duration: Duration,
    outcome: Option<MediaStatus>,
}

fn lock(shared: &Mutex<PlayerShared>) -> MutexGuard<'_, PlayerShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn seconds(value: Option<&Value>) -> Option<Duration> {
    value
        .and_then(Value::as_f64)
        .and_then(|secs| Duration::try_from_secs_f64(secs.max(0.0)).ok())
}

/// Fold one IPC message into the shared state
fn apply_event(shared: &mut PlayerShared, message: &Value) {
    match message.get("event").and_then(Value::as_str) {
        Some("property-change") => match message.get("name").and_then(Value::as_str) {
            Some("time-pos") => {
                if let Some(position) = seconds(message.get("data")) {
                    shared.position = position;
                }
            }
            Some("duration") => {
                if let Some(duration) = seconds(message.get("data")) {
                    shared.duration = duration;
                }
            }
            Some("pause") => {
                if let Some(paused) = message.get("data").and_then(Value::as_bool) {
                    shared.paused = paused;
                }
            }
            _ => {}
        },
        // "stop" and "redirect" follow our own commands and are not outcomes
        Some("end-file") if shared.active => match message.get("reason").and_then(Value::as_str) {
            Some("eof") => {
                shared.active = false;
                shared.outcome = Some(MediaStatus::Ended);
            }
            Some("error") => {
                let detail = message
                    .get("file_error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                shared.active = false;
                shared.outcome = Some(MediaStatus::Failed(detail.to_string()));
            }
            _ => {}
        },
        Some(_) => {}
        None => {
            if let Some(error) = message.get("error").and_then(Value::as_str) {
                if error != "success" {
                    debug!("Player rejected command: {}", error);
                }
            }
        }
    }
}

async fn read_events(reader: OwnedReadHalf, shared: Arc<Mutex<PlayerShared>>) {
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match serde_json::from_str::<Value>(&line) {
                Ok(message) => apply_event(&mut lock(&shared), &message),
                Err(e) => debug!("Unparsable player message {:?}: {}", line, e),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Player connection failed: {}", e);
                break;
            }
        }
    }

    let mut state = lock(&shared);
    state.connected = false;
    if state.active {
        state.active = false;
        state.outcome = Some(MediaStatus::Failed("Player process exited".to_string()));
    }
    info!("Player connection closed");
}

/// A live connection to one player process
struct Session {
    _child: Option<Child>,
    writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Plays files through one long-lived mpv process controlled over its JSON IPC
/// socket. Pause, seek and volume are property changes on the running process;
/// position and end of media come back as events.
pub struct MpvPlayer {
    binary: String,
    socket_path: PathBuf,
    session: Option<Session>,
    shared: Arc<Mutex<PlayerShared>>,
    source: Option<PathBuf>,
    volume: u8,
}

impl MpvPlayer {
    pub fn new(binary: impl Into<String>, socket_path: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            socket_path: socket_path.into(),
            session: None,
            shared: Arc::new(Mutex::new(PlayerShared::default())),
            source: None,
            volume: DEFAULT_VOLUME,
        }
    }

    fn is_connected(&self) -> bool {
        self.session.is_some() && lock(&self.shared).connected
    }

    fn has_live_source(&self) -> bool {
        let active = lock(&self.shared).active;
        active && self.is_connected()
    }

    async fn ensure_session(&mut self) -> Result<(), String> {
        if self.is_connected() {
            return Ok(());
        }
        self.session = None;

        // A stale socket from an earlier run would refuse connections
        let _ = std::fs::remove_file(&self.socket_path);

        let mut child = Command::new(&self.binary)
            .arg("--idle=yes")
            .arg("--no-video")
            .arg("--no-terminal")
            .arg(format!("--volume={}", self.volume))
            .arg(format!("--input-ipc-server={}", self.socket_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to launch {}: {}", self.binary, e))?;

        let stream = connect_ipc(&self.socket_path, &mut child).await?;
        info!("Started {} on {}", self.binary, self.socket_path.display());
        self.attach(stream, Some(child)).await
    }

    async fn attach(&mut self, stream: UnixStream, child: Option<Child>) -> Result<(), String> {
        let (reader, writer) = stream.into_split();
        *lock(&self.shared) = PlayerShared {
            connected: true,
            ..PlayerShared::default()
        };

        let reader = tokio::spawn(read_events(reader, Arc::clone(&self.shared)));
        self.session = Some(Session {
            _child: child,
            writer,
            reader,
        });

        self.command(json!(["observe_property", OBSERVE_TIME_POS, "time-pos"])).await?;
        self.command(json!(["observe_property", OBSERVE_DURATION, "duration"])).await?;
        self.command(json!(["observe_property", OBSERVE_PAUSE, "pause"])).await
    }

    async fn command(&mut self, args: Value) -> Result<(), String> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| "Player is not running".to_string())?;

        let mut line = json!({ "command": args }).to_string();
        line.push('\n');
        debug!("Player command {}", line.trim_end());

        let written = session.writer.write_all(line.as_bytes()).await;
        if let Err(e) = written {
            self.session = None;
            return Err(format!("Lost connection to player: {}", e));
        }
        Ok(())
    }
}

async fn connect_ipc(socket: &Path, child: &mut Child) -> Result<UnixStream, String> {
    for _ in 0..CONNECT_ATTEMPTS {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(format!("Player exited during startup ({})", status));
        }
        match UnixStream::connect(socket).await {
            Ok(stream) => return Ok(stream),
            Err(_) => sleep(CONNECT_RETRY_DELAY).await,
        }
    }
    Err(format!("Player never opened {}", socket.display()))
}

#[async_trait]
impl MediaPlayer for MpvPlayer {
    async fn load(&mut self, path: &Path, duration: Duration) -> Result<(), String> {
        self.ensure_session().await?;
        {
            let mut state = lock(&self.shared);
            state.active = true;
            state.paused = true;
            state.position = Duration::ZERO;
            state.duration = duration;
            state.outcome = None;
        }
        self.source = Some(path.to_path_buf());

        self.command(json!(["set_property", "pause", true])).await?;
        self.command(json!(["loadfile", path.to_string_lossy(), "replace"])).await
    }

    async fn play(&mut self) -> Result<(), String> {
        // A finished or stopped source is loaded again from the top
        if !self.has_live_source() {
            let source = self.source.clone().ok_or_else(|| "No source loaded".to_string())?;
            let duration = lock(&self.shared).duration;
            self.load(&source, duration).await?;
        }

        self.command(json!(["set_property", "pause", false])).await?;
        lock(&self.shared).paused = false;
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), String> {
        if !self.is_connected() {
            return Ok(());
        }
        self.command(json!(["set_property", "pause", true])).await?;
        lock(&self.shared).paused = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), String> {
        if self.is_connected() {
            self.command(json!(["stop"])).await?;
        }
        let mut state = lock(&self.shared);
        state.active = false;
        state.paused = true;
        state.position = Duration::ZERO;
        state.outcome = None;
        Ok(())
    }

    async fn seek(&mut self, position: Duration) -> Result<(), String> {
        let duration = self.duration();
        let position = if duration.is_zero() { position } else { position.min(duration) };

        if self.has_live_source() {
            self.command(json!(["seek", position.as_secs_f64(), "absolute"])).await?;
        }
        lock(&self.shared).position = position;
        Ok(())
    }

    async fn set_volume(&mut self, volume: u8) -> Result<(), String> {
        self.volume = volume.min(100);
        // Without a process the volume is passed at launch
        if self.is_connected() {
            let volume = self.volume;
            self.command(json!(["set_property", "volume", volume])).await?;
        }
        Ok(())
    }

    fn position(&self) -> Duration {
        let state = lock(&self.shared);
        if state.duration.is_zero() {
            state.position
        } else {
            state.position.min(state.duration)
        }
    }

    fn duration(&self) -> Duration {
        lock(&self.shared).duration
    }

    fn is_playing(&self) -> bool {
        let state = lock(&self.shared);
        state.active && !state.paused
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn poll_media_status(&mut self) -> MediaStatus {
        lock(&self.shared).outcome.take().unwrap_or(MediaStatus::Running)
    }
}
