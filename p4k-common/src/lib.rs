//! # p4k Common Library
//!
//! Shared code for the p4k player crates:
//! - Error type used by configuration loading
//! - Host-facing event types (PlayerEvent enum) and the EventBus
//! - Configuration loading and path resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
