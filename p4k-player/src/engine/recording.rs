//! In-memory engine that records every call
//!
//! Test double for the player and facade tests. Property writes are stored
//! and readable, the shader list is tracked like the real engine tracks
//! `glsl-shaders`, and events are queued by the test and handed out by
//! [`PlaybackEngine::wait_event`].

use super::{EngineError, EngineEvent, EngineResult, PlaybackEngine, PropertyValue};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A single recorded engine interaction
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetProperty { name: String, value: String },
    Command(Vec<String>),
    Observe(String),
    Terminate,
}

impl EngineCall {
    /// True for a write of `name`, whatever the value
    pub fn is_set(&self, name: &str) -> bool {
        matches!(self, EngineCall::SetProperty { name: n, .. } if n == name)
    }

    /// True for a command whose verb is `verb`
    pub fn is_command(&self, verb: &str) -> bool {
        matches!(self, EngineCall::Command(args) if args.first().map(String::as_str) == Some(verb))
    }
}

#[derive(Default)]
struct Recorded {
    calls: Vec<EngineCall>,
    properties: HashMap<String, PropertyValue>,
    shader_chain: Vec<String>,
    rejected_args: Vec<String>,
    failing_properties: HashSet<String>,
    rejected_properties: HashSet<String>,
}

/// Engine double recording calls in order
#[derive(Default)]
pub struct RecordingEngine {
    recorded: Mutex<Recorded>,
    events: Mutex<VecDeque<EngineEvent>>,
    event_ready: Condvar,
    terminations: AtomicUsize,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject every command with an argument containing `fragment`
    pub fn reject_commands_containing(&self, fragment: impl Into<String>) {
        self.recorded().rejected_args.push(fragment.into());
    }

    /// Make reads of `name` fail
    pub fn fail_property(&self, name: impl Into<String>) {
        self.recorded().failing_properties.insert(name.into());
    }

    /// Make writes of `name` fail (the attempt is still recorded)
    pub fn reject_property(&self, name: impl Into<String>) {
        self.recorded().rejected_properties.insert(name.into());
    }

    /// Preset a readable property value
    pub fn set_reported(&self, name: impl Into<String>, value: PropertyValue) {
        self.recorded().properties.insert(name.into(), value);
    }

    /// Queue an event for `wait_event`
    pub fn push_event(&self, event: EngineEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event);
        self.event_ready.notify_all();
    }

    /// All calls so far, in order
    pub fn calls(&self) -> Vec<EngineCall> {
        self.recorded().calls.clone()
    }

    /// Forget recorded calls (properties and shader list are kept)
    pub fn clear_calls(&self) {
        self.recorded().calls.clear();
    }

    /// Current `glsl-shaders` list
    pub fn shader_chain(&self) -> Vec<String> {
        self.recorded().shader_chain.clone()
    }

    /// Last string value written to `name`
    pub fn property(&self, name: &str) -> Option<String> {
        self.recorded().calls.iter().rev().find_map(|call| match call {
            EngineCall::SetProperty { name: n, value } if n == name => Some(value.clone()),
            _ => None,
        })
    }

    /// Number of times `terminate` was called
    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

impl PlaybackEngine for RecordingEngine {
    fn set_property(&self, name: &str, value: &str) -> EngineResult<()> {
        let mut recorded = self.recorded();
        recorded.calls.push(EngineCall::SetProperty {
            name: name.to_string(),
            value: value.to_string(),
        });
        if recorded.rejected_properties.contains(name) {
            return Err(EngineError::Property {
                name: name.to_string(),
                message: "rejected".to_string(),
            });
        }

        if name == "glsl-shaders" {
            recorded.shader_chain = value
                .split(if cfg!(windows) { ';' } else { ':' })
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        let stored = match value.parse::<i64>() {
            Ok(v) => PropertyValue::Int(v),
            Err(_) => PropertyValue::Text(value.to_string()),
        };
        recorded.properties.insert(name.to_string(), stored);
        Ok(())
    }

    fn get_property(&self, name: &str) -> EngineResult<PropertyValue> {
        let recorded = self.recorded();
        if recorded.failing_properties.contains(name) {
            return Err(EngineError::Property {
                name: name.to_string(),
                message: "property unavailable".to_string(),
            });
        }
        recorded
            .properties
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Unavailable(name.to_string()))
    }

    fn command(&self, args: &[&str]) -> EngineResult<()> {
        let mut recorded = self.recorded();
        recorded
            .calls
            .push(EngineCall::Command(args.iter().map(|a| a.to_string()).collect()));

        let rejected = args
            .iter()
            .any(|arg| recorded.rejected_args.iter().any(|frag| arg.contains(frag.as_str())));
        if rejected {
            return Err(EngineError::Command {
                command: args.first().copied().unwrap_or_default().to_string(),
                message: "rejected".to_string(),
            });
        }

        if let ["change-list", "glsl-shaders", "append", path] = args {
            recorded.shader_chain.push(path.to_string());
        }
        Ok(())
    }

    fn observe_property(&self, name: &str) -> EngineResult<()> {
        self.recorded().calls.push(EngineCall::Observe(name.to_string()));
        Ok(())
    }

    fn wait_event(&self, timeout: Duration) -> Option<EngineEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut events, _) = self
            .event_ready
            .wait_timeout_while(events, timeout, |queue| queue.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        events.pop_front()
    }

    fn terminate(&self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        self.recorded().calls.push(EngineCall::Terminate);
        self.push_event(EngineEvent::Shutdown);
    }
}
