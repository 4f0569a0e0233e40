//! Player adapter
//!
//! The only component that talks to the playback engine. Owns the session
//! state, turns preset and overlay switches into directive plans, and runs the
//! event loop that feeds host subscribers.
//!
//! **Module Structure:**
//! - `core.rs`: Player struct, construction, session lock, teardown
//! - `quality.rs`: preset, overlay and interpolation application
//! - `transport.rs`: loading, transport, tracks, window pass-throughs
//! - `status.rs`: read-through queries and session accessors
//! - `event_loop.rs`: engine event polling and dispatch
//! - `base_config.rs`: engine defaults applied at construction
//! - `source.rs`: local/remote source classification

mod base_config;
mod core;
mod event_loop;
mod quality;
mod source;
mod status;
mod transport;

pub use self::core::{Player, PlayerOptions};
pub use event_loop::{EventLoopHandle, LoopExit, StopFlag, DROPPED_FRAME_THRESHOLD, POLL_TIMEOUT};
pub use quality::ApplyReport;
pub use source::{SourceKind, STREAM_RECONNECT_OPTIONS};
pub use status::DEFAULT_SPEED;
