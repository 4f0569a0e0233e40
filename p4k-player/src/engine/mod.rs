//! Playback engine boundary
//!
//! The player never decodes or renders anything itself. Everything goes
//! through [`PlaybackEngine`]: property writes, imperative commands, property
//! reads and a bounded blocking wait for engine events.
//!
//! **Module Structure:**
//! - `mod.rs`: capability trait, events, property values, engine errors
//! - `mpv_ipc/`: mpv backend speaking the JSON IPC protocol (unix)
//! - `recording.rs`: in-memory engine that records every call

#[cfg(unix)]
pub mod mpv_ipc;
pub mod recording;

use std::time::Duration;
use thiserror::Error;

/// Errors reported by an engine backend
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine rejected a command
    #[error("command {command:?} failed: {message}")]
    Command { command: String, message: String },

    /// Engine rejected a property read or write
    #[error("property {name} failed: {message}")]
    Property { name: String, message: String },

    /// Property exists but has no value right now (e.g. `duration` before load)
    #[error("property {0} unavailable")]
    Unavailable(String),

    /// No reply within the request timeout
    #[error("engine did not reply within {0:?}")]
    Timeout(Duration),

    /// Engine connection closed or engine already terminated
    #[error("engine disconnected")]
    Disconnected,

    /// Reply could not be interpreted
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport I/O failure
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON on the wire
    #[error("engine JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Why playback of a file ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Eof,
    Stop,
    Quit,
    Error,
    Redirect,
    Unknown,
}

impl EndReason {
    /// Parse the engine's reason string
    pub fn parse(reason: &str) -> Self {
        match reason {
            "eof" => EndReason::Eof,
            "stop" => EndReason::Stop,
            "quit" => EndReason::Quit,
            "error" => EndReason::Error,
            "redirect" => EndReason::Redirect,
            _ => EndReason::Unknown,
        }
    }
}

/// Tagged event returned by [`PlaybackEngine::wait_event`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// File opened and demuxed; duration is now queryable
    FileLoaded,
    /// Playback of the current file ended
    EndOfFile { reason: EndReason },
    /// Engine is shutting down; no further events follow
    Shutdown,
    /// An observed property changed
    PropertyChange { name: String },
    /// Any other engine event, by name
    Other(String),
}

/// Property value as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Flag(bool),
    Int(i64),
    Double(f64),
    Text(String),
    /// Property exists but has no value
    None,
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            PropertyValue::Flag(_) | PropertyValue::None => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Double(v) if v.is_finite() => Some(v.trunc() as i64),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Flag(v) => Some(*v),
            PropertyValue::Text(s) => match s.as_str() {
                "yes" | "true" => Some(true),
                "no" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => PropertyValue::None,
            Value::Bool(b) => PropertyValue::Flag(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Int(i),
                None => n
                    .as_f64()
                    .map(PropertyValue::Double)
                    .unwrap_or(PropertyValue::None),
            },
            Value::String(s) => PropertyValue::Text(s),
            other => PropertyValue::Text(other.to_string()),
        }
    }
}

/// Capability surface of an external playback engine
///
/// Implementations must be usable from two threads at once: caller threads
/// issue commands while the event loop blocks in [`wait_event`].
///
/// [`wait_event`]: PlaybackEngine::wait_event
pub trait PlaybackEngine: Send + Sync {
    /// Set a property from its string form
    fn set_property(&self, name: &str, value: &str) -> EngineResult<()>;

    /// Read a property
    fn get_property(&self, name: &str) -> EngineResult<PropertyValue>;

    /// Dispatch an imperative command (`loadfile`, `seek`, `change-list`, ...)
    fn command(&self, args: &[&str]) -> EngineResult<()>;

    /// Ask the engine to report changes of `name` as [`EngineEvent::PropertyChange`]
    fn observe_property(&self, name: &str) -> EngineResult<()>;

    /// Block up to `timeout` for the next event; `None` on timeout
    fn wait_event(&self, timeout: Duration) -> Option<EngineEvent>;

    /// Shut the engine down and release its resources
    ///
    /// Callers guarantee this is invoked at most once.
    fn terminate(&self);

    /// Read a numeric property as `f64`
    fn get_f64(&self, name: &str) -> EngineResult<f64> {
        let value = self.get_property(name)?;
        value.as_f64().ok_or_else(|| match value {
            PropertyValue::None => EngineError::Unavailable(name.to_string()),
            other => EngineError::Protocol(format!("{} is not numeric: {:?}", name, other)),
        })
    }

    /// Read a numeric property as `i64`
    fn get_i64(&self, name: &str) -> EngineResult<i64> {
        let value = self.get_property(name)?;
        value.as_i64().ok_or_else(|| match value {
            PropertyValue::None => EngineError::Unavailable(name.to_string()),
            other => EngineError::Protocol(format!("{} is not an integer: {:?}", name, other)),
        })
    }

    /// Set an integer property
    fn set_property_i64(&self, name: &str, value: i64) -> EngineResult<()> {
        self.set_property(name, &value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_value_from_json() {
        assert_eq!(PropertyValue::from(json!(12)), PropertyValue::Int(12));
        assert_eq!(PropertyValue::from(json!(1.5)), PropertyValue::Double(1.5));
        assert_eq!(PropertyValue::from(json!(true)), PropertyValue::Flag(true));
        assert_eq!(PropertyValue::from(json!(null)), PropertyValue::None);
        assert_eq!(
            PropertyValue::from(json!("gpu")),
            PropertyValue::Text("gpu".to_string())
        );
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(PropertyValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::Double(42.9).as_i64(), Some(42));
        assert_eq!(PropertyValue::Text(" 7 ".to_string()).as_i64(), Some(7));
        assert_eq!(PropertyValue::Double(f64::NAN).as_i64(), None);
        assert_eq!(PropertyValue::None.as_f64(), None);
        assert_eq!(PropertyValue::Text("yes".to_string()).as_bool(), Some(true));
    }

    #[test]
    fn test_end_reason_parse() {
        assert_eq!(EndReason::parse("eof"), EndReason::Eof);
        assert_eq!(EndReason::parse("error"), EndReason::Error);
        assert_eq!(EndReason::parse("something-new"), EndReason::Unknown);
    }
}
