//! mpv JSON IPC wire format
//!
//! Requests are one JSON object per line:
//! `{"command": ["loadfile", "/v.mkv"], "request_id": 7}`.
//! Replies carry the same `request_id` plus `error` (`"success"` on success)
//! and optional `data`. Events carry an `event` name and no `request_id`.

use crate::engine::{EndReason, EngineError, EngineEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing command
#[derive(Debug, Serialize)]
pub struct Request {
    pub command: Vec<Value>,
    pub request_id: u64,
}

impl Request {
    /// Encode as a newline-terminated line
    pub fn to_line(&self) -> Result<String, EngineError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Raw incoming message before classification
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    request_id: Option<u64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Classified incoming message
#[derive(Debug, PartialEq)]
pub enum Incoming {
    /// Reply to request `request_id`: data on success, mpv's error string otherwise
    Reply {
        request_id: u64,
        result: Result<Value, String>,
    },
    /// Asynchronous engine event
    Event(EngineEvent),
}

/// Parse one line received from the socket
pub fn parse_line(line: &str) -> Result<Incoming, EngineError> {
    let raw: RawMessage = serde_json::from_str(line)?;

    if let Some(event) = raw.event {
        let event = match event.as_str() {
            "file-loaded" => EngineEvent::FileLoaded,
            "end-file" => EngineEvent::EndOfFile {
                reason: EndReason::parse(raw.reason.as_deref().unwrap_or("")),
            },
            "shutdown" => EngineEvent::Shutdown,
            "property-change" => EngineEvent::PropertyChange {
                name: raw.name.unwrap_or_default(),
            },
            _ => EngineEvent::Other(event),
        };
        return Ok(Incoming::Event(event));
    }

    let request_id = raw
        .request_id
        .ok_or_else(|| EngineError::Protocol(format!("message without event or request_id: {}", line)))?;

    let result = match raw.error.as_deref() {
        Some("success") | None => Ok(raw.data.unwrap_or(Value::Null)),
        Some(error) => Err(error.to_string()),
    };

    Ok(Incoming::Reply { request_id, result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_encoding() {
        let request = Request {
            command: vec![json!("seek"), json!("10.000000"), json!("relative")],
            request_id: 3,
        };
        let line = request.to_line().unwrap();
        assert!(line.ends_with('\n'));

        let value: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["request_id"], 3);
        assert_eq!(value["command"][0], "seek");
    }

    #[test]
    fn test_success_reply() {
        let parsed = parse_line(r#"{"data":12.5,"error":"success","request_id":4}"#).unwrap();
        assert_eq!(
            parsed,
            Incoming::Reply {
                request_id: 4,
                result: Ok(json!(12.5)),
            }
        );
    }

    #[test]
    fn test_error_reply() {
        let parsed =
            parse_line(r#"{"error":"property unavailable","request_id":9}"#).unwrap();
        assert_eq!(
            parsed,
            Incoming::Reply {
                request_id: 9,
                result: Err("property unavailable".to_string()),
            }
        );
    }

    #[test]
    fn test_events() {
        assert_eq!(
            parse_line(r#"{"event":"file-loaded"}"#).unwrap(),
            Incoming::Event(EngineEvent::FileLoaded)
        );
        assert_eq!(
            parse_line(r#"{"event":"end-file","reason":"eof","playlist_entry_id":1}"#).unwrap(),
            Incoming::Event(EngineEvent::EndOfFile {
                reason: EndReason::Eof
            })
        );
        assert_eq!(
            parse_line(r#"{"event":"property-change","id":1,"name":"time-pos","data":3.2}"#)
                .unwrap(),
            Incoming::Event(EngineEvent::PropertyChange {
                name: "time-pos".to_string()
            })
        );
        assert_eq!(
            parse_line(r#"{"event":"idle"}"#).unwrap(),
            Incoming::Event(EngineEvent::Other("idle".to_string()))
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_line("not json").is_err());
        assert!(parse_line(r#"{"data":1}"#).is_err());
    }
}
