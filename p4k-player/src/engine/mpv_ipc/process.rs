//! mpv process spawning and socket connection

use crate::engine::{EngineError, EngineResult};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// How long to wait for mpv to create its IPC socket
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Fresh socket path in the temp directory, unique per player instance
pub fn unique_socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("p4k-mpv-{}.sock", Uuid::new_v4()))
}

/// Start mpv in idle mode with an IPC server on `socket_path`
pub fn spawn_mpv(binary: &Path, socket_path: &Path, extra_args: &[String]) -> EngineResult<Child> {
    info!("Starting {} (ipc socket {})", binary.display(), socket_path.display());

    let child = Command::new(binary)
        .arg("--idle=yes")
        .arg("--no-terminal")
        .arg(format!("--input-ipc-server={}", socket_path.display()))
        .args(extra_args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn()?;

    debug!("mpv started with pid {}", child.id());
    Ok(child)
}

/// Connect to the IPC socket, waiting for mpv to create it
///
/// Fails early when the child exits before the socket appears.
pub fn connect(
    socket_path: &Path,
    child: Option<&mut Child>,
    timeout: Duration,
) -> EngineResult<UnixStream> {
    let deadline = Instant::now() + timeout;
    let mut child = child;

    loop {
        match UnixStream::connect(socket_path) {
            Ok(stream) => return Ok(stream),
            Err(e) if Instant::now() >= deadline => return Err(EngineError::Io(e)),
            Err(_) => {}
        }

        if let Some(child) = child.as_deref_mut() {
            if let Some(status) = child.try_wait()? {
                return Err(EngineError::Protocol(format!(
                    "mpv exited before opening its IPC socket ({})",
                    status
                )));
            }
        }

        std::thread::sleep(CONNECT_POLL_INTERVAL);
    }
}
