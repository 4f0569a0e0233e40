//! mpv backend over the JSON IPC protocol
//!
//! Architecture:
//! - `process.rs` - mpv process spawning and socket connection
//! - `protocol.rs` - JSON request/reply/event types
//! - `client.rs` - [`PlaybackEngine`](crate::engine::PlaybackEngine) implementation

mod client;
mod process;
mod protocol;

pub use client::{MpvIpcEngine, MpvOptions, DEFAULT_REQUEST_TIMEOUT};
pub use process::unique_socket_path;
