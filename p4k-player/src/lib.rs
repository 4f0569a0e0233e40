//! # p4k Player Library (p4k-player)
//!
//! Quality-preset control layer over an external playback engine.
//!
//! **Purpose:** Load local files and network streams, drive transport, and
//! switch between named quality presets that map onto engine properties and
//! GPU shader chains.
//!
//! **Architecture:** Every engine interaction goes through the
//! [`engine::PlaybackEngine`] trait (mpv over JSON IPC in production). The
//! [`Player`] owns the session state; hosts embed it through
//! [`facade::HostPlayer`] and listen on the event bus.

pub mod engine;
pub mod error;
pub mod facade;
pub mod player;
pub mod presets;
pub mod state;

pub use error::{Error, Result};
pub use player::Player;
