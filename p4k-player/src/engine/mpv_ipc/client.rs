//! mpv engine over JSON IPC
//!
//! One reader thread owns the read half of the socket and demultiplexes
//! lines: replies go to the waiting request by `request_id`, events go to the
//! event channel drained by `wait_event`.

use super::process::{connect, spawn_mpv, unique_socket_path, CONNECT_TIMEOUT};
use super::protocol::{parse_line, Incoming, Request};
use crate::engine::{EngineError, EngineEvent, EngineResult, PlaybackEngine, PropertyValue};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::Child;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default time to wait for a command reply
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period for mpv to exit after `quit`
const EXIT_GRACE: Duration = Duration::from_secs(2);

type ReplySender = Sender<Result<Value, String>>;
type PendingReplies = Arc<Mutex<HashMap<u64, ReplySender>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Options for starting mpv
#[derive(Debug, Clone)]
pub struct MpvOptions {
    /// mpv executable
    pub binary: PathBuf,
    /// IPC socket path (unique temp path when `None`)
    pub socket_path: Option<PathBuf>,
    /// Extra command-line arguments
    pub extra_args: Vec<String>,
    /// Reply timeout per request
    pub request_timeout: Duration,
}

impl Default for MpvOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("mpv"),
            socket_path: None,
            extra_args: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// mpv controlled through its IPC socket
pub struct MpvIpcEngine {
    writer: Mutex<UnixStream>,
    pending: PendingReplies,
    next_request_id: AtomicU64,
    next_observer_id: AtomicU64,
    events: Mutex<Receiver<EngineEvent>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    child: Mutex<Option<Child>>,
    socket_path: PathBuf,
    owns_socket: bool,
    request_timeout: Duration,
}

impl MpvIpcEngine {
    /// Spawn mpv and connect to it
    pub fn spawn(options: MpvOptions) -> EngineResult<Self> {
        let socket_path = options.socket_path.clone().unwrap_or_else(unique_socket_path);
        let mut child = spawn_mpv(&options.binary, &socket_path, &options.extra_args)?;

        let stream = match connect(&socket_path, Some(&mut child), CONNECT_TIMEOUT) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        let engine = Self::from_stream(stream, socket_path, true, options.request_timeout)?;
        *lock(&engine.child) = Some(child);
        info!("Connected to mpv");
        Ok(engine)
    }

    /// Attach to an mpv already listening on `socket_path`
    pub fn connect(socket_path: PathBuf, request_timeout: Duration) -> EngineResult<Self> {
        let stream = connect(&socket_path, None, CONNECT_TIMEOUT)?;
        Self::from_stream(stream, socket_path, false, request_timeout)
    }

    fn from_stream(
        stream: UnixStream,
        socket_path: PathBuf,
        owns_socket: bool,
        request_timeout: Duration,
    ) -> EngineResult<Self> {
        let read_half = stream.try_clone()?;
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::channel();

        let reader_pending = Arc::clone(&pending);
        let reader = thread::Builder::new()
            .name("p4k-mpv-reader".to_string())
            .spawn(move || Self::reader_loop(read_half, reader_pending, event_tx))?;

        Ok(Self {
            writer: Mutex::new(stream),
            pending,
            next_request_id: AtomicU64::new(1),
            next_observer_id: AtomicU64::new(1),
            events: Mutex::new(event_rx),
            reader: Mutex::new(Some(reader)),
            child: Mutex::new(None),
            socket_path,
            owns_socket,
            request_timeout,
        })
    }

    /// Reader thread: route replies and events until the socket closes
    fn reader_loop(stream: UnixStream, pending: PendingReplies, events: Sender<EngineEvent>) {
        debug!("mpv reader started");
        let mut shutdown_seen = false;

        for line in BufReader::new(stream).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("mpv socket read failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line) {
                Ok(Incoming::Reply { request_id, result }) => {
                    if let Some(reply_tx) = lock(&pending).remove(&request_id) {
                        let _ = reply_tx.send(result);
                    } else {
                        debug!("Reply for unknown request {}", request_id);
                    }
                }
                Ok(Incoming::Event(event)) => {
                    shutdown_seen |= event == EngineEvent::Shutdown;
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Ignoring malformed mpv message: {}", e),
            }
        }

        // Waiting requests fail with Disconnected once their senders drop
        lock(&pending).clear();
        if !shutdown_seen {
            let _ = events.send(EngineEvent::Shutdown);
        }
        debug!("mpv reader stopped");
    }

    /// Send a request and wait for its reply
    fn request(&self, command: Vec<Value>) -> EngineResult<Value> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let verb = command
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let line = Request {
            command,
            request_id,
        }
        .to_line()?;

        let (reply_tx, reply_rx) = mpsc::channel();
        lock(&self.pending).insert(request_id, reply_tx);

        if let Err(e) = lock(&self.writer).write_all(line.as_bytes()) {
            lock(&self.pending).remove(&request_id);
            return Err(EngineError::Io(e));
        }

        match reply_rx.recv_timeout(self.request_timeout) {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(message)) => Err(EngineError::Command {
                command: verb,
                message,
            }),
            Err(RecvTimeoutError::Timeout) => {
                lock(&self.pending).remove(&request_id);
                Err(EngineError::Timeout(self.request_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Disconnected),
        }
    }

    fn wait_for_exit(child: &mut Child) {
        let deadline = Instant::now() + EXIT_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("mpv exited: {}", status);
                    return;
                }
                Ok(None) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(20));
                }
                _ => {
                    warn!("mpv did not exit in time, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    return;
                }
            }
        }
    }
}

impl PlaybackEngine for MpvIpcEngine {
    fn set_property(&self, name: &str, value: &str) -> EngineResult<()> {
        // `set` parses the string form, like mpv_set_property_string
        self.request(vec![json!("set"), json!(name), json!(value)])
            .map(|_| ())
            .map_err(|e| match e {
                EngineError::Command { message, .. } => EngineError::Property {
                    name: name.to_string(),
                    message,
                },
                other => other,
            })
    }

    fn get_property(&self, name: &str) -> EngineResult<PropertyValue> {
        match self.request(vec![json!("get_property"), json!(name)]) {
            Ok(data) => Ok(PropertyValue::from(data)),
            Err(EngineError::Command { message, .. }) if message == "property unavailable" => {
                Err(EngineError::Unavailable(name.to_string()))
            }
            Err(EngineError::Command { message, .. }) => Err(EngineError::Property {
                name: name.to_string(),
                message,
            }),
            Err(other) => Err(other),
        }
    }

    fn command(&self, args: &[&str]) -> EngineResult<()> {
        self.request(args.iter().map(|a| json!(a)).collect())
            .map(|_| ())
    }

    fn observe_property(&self, name: &str) -> EngineResult<()> {
        let id = self.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.request(vec![json!("observe_property"), json!(id), json!(name)])
            .map(|_| ())
    }

    fn wait_event(&self, timeout: Duration) -> Option<EngineEvent> {
        match lock(&self.events).recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            // Reader gone: the engine is as good as shut down
            Err(RecvTimeoutError::Disconnected) => Some(EngineEvent::Shutdown),
        }
    }

    fn terminate(&self) {
        info!("Terminating mpv");

        if let Err(e) = self.command(&["quit"]) {
            debug!("quit not acknowledged: {}", e);
        }
        if let Err(e) = lock(&self.writer).shutdown(Shutdown::Both) {
            debug!("socket shutdown: {}", e);
        }

        if let Some(mut child) = lock(&self.child).take() {
            Self::wait_for_exit(&mut child);
        }
        if let Some(reader) = lock(&self.reader).take() {
            if reader.join().is_err() {
                error!("mpv reader thread panicked");
            }
        }
        if self.owns_socket {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

impl Drop for MpvIpcEngine {
    fn drop(&mut self) {
        // Last resort if the owner never called terminate()
        if let Some(mut child) = lock(&self.child).take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixListener;
    use tempfile::TempDir;

    /// Minimal fake mpv: answers every request with success and emits
    /// file-loaded after `loadfile`.
    fn fake_mpv(listener: UnixListener) -> JoinHandle<Vec<Value>> {
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut seen = Vec::new();

            for line in BufReader::new(stream).lines() {
                let Ok(line) = line else { break };
                let request: Value = serde_json::from_str(&line).unwrap();
                let id = request["request_id"].as_u64().unwrap();
                let verb = request["command"][0].as_str().unwrap_or_default().to_string();
                seen.push(request["command"].clone());

                let reply = match verb.as_str() {
                    "get_property" if request["command"][1] == "duration" => {
                        json!({"data": 60.0, "error": "success", "request_id": id})
                    }
                    "get_property" => {
                        json!({"error": "property unavailable", "request_id": id})
                    }
                    _ => json!({"error": "success", "request_id": id}),
                };
                writeln!(writer, "{}", reply).unwrap();

                if verb == "loadfile" {
                    writeln!(writer, "{}", json!({"event": "file-loaded"})).unwrap();
                }
                if verb == "quit" {
                    writeln!(writer, "{}", json!({"event": "shutdown"})).unwrap();
                    break;
                }
            }
            seen
        })
    }

    #[test]
    fn test_round_trip_against_fake_server() {
        let dir = TempDir::new().unwrap();
        let socket = dir.path().join("mpv.sock");
        let listener = UnixListener::bind(&socket).unwrap();
        let server = fake_mpv(listener);

        let engine = MpvIpcEngine::connect(socket, Duration::from_secs(2)).unwrap();

        engine.set_property("hwdec", "auto-safe").unwrap();
        assert_eq!(engine.get_f64("duration").unwrap(), 60.0);
        assert!(matches!(
            engine.get_property("time-pos"),
            Err(EngineError::Unavailable(_))
        ));

        engine.command(&["loadfile", "/videos/a.mkv"]).unwrap();
        assert_eq!(
            engine.wait_event(Duration::from_secs(2)),
            Some(EngineEvent::FileLoaded)
        );

        engine.terminate();
        let seen = server.join().unwrap();
        assert_eq!(seen[0], json!(["set", "hwdec", "auto-safe"]));
        assert_eq!(seen.last().unwrap(), &json!(["quit"]));
    }

    #[test]
    fn test_closed_socket_reports_shutdown() {
        let dir = TempDir::new().unwrap();
        let socket = dir.path().join("mpv.sock");
        let listener = UnixListener::bind(&socket).unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let engine = MpvIpcEngine::connect(socket, Duration::from_millis(200)).unwrap();
        server.join().unwrap();

        assert_eq!(
            engine.wait_event(Duration::from_secs(2)),
            Some(EngineEvent::Shutdown)
        );
    }
}
