//! Event types for the p4k event system
//!
//! Provides the host-facing event definitions and the EventBus the player
//! publishes them on. Hosts subscribe instead of registering callbacks, so no
//! listener ever runs while the player holds its session lock.

mod playback_types;

pub use playback_types::PlaybackState;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// p4k event types
///
/// Events are broadcast via EventBus and can be serialized for a host UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback state changed (playing, paused, stopped, ended)
    ///
    /// Triggers:
    /// - Host: Update play/pause controls
    PlaybackStateChanged {
        /// New playback state
        state: PlaybackState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Source accepted by the engine
    FileLoaded {
        /// Path or URI that was loaded
        source: String,
        /// True for http/rtmp streams
        remote: bool,
        /// When the load command was accepted
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Engine finished opening the file and reported a duration
    DurationChanged {
        /// Total duration in seconds (0 when unknown)
        duration: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Periodic position update
    ///
    /// Emitted from the event loop on engine property-change notifications
    /// while playback is active.
    TimeUpdate {
        /// Current position in seconds
        position: f64,
        /// Total duration in seconds
        duration: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Quality preset applied (or re-applied after the overlay was disabled)
    PresetChanged {
        /// Preset id (`low`, `medium`, `high`)
        preset: String,
        /// Whether the anime overlay chain is attached
        anime_overlay: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Too many dropped frames on a demanding preset
    ///
    /// Advisory only: nothing is downgraded automatically.
    PerformanceAdvisory {
        /// Preset id in effect
        preset: String,
        /// Dropped frame count reported by the engine
        dropped_frames: i64,
        /// Human-readable hint for the user
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Non-fatal runtime failure (missing shader, rejected subtitle, ...)
    Warning {
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Build a state-change event stamped with the current time
    pub fn state(state: PlaybackState) -> Self {
        PlayerEvent::PlaybackStateChanged {
            state,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Build a warning event stamped with the current time
    pub fn warning(message: impl Into<String>) -> Self {
        PlayerEvent::Warning {
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Event type name as it appears in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::FileLoaded { .. } => "FileLoaded",
            PlayerEvent::DurationChanged { .. } => "DurationChanged",
            PlayerEvent::TimeUpdate { .. } => "TimeUpdate",
            PlayerEvent::PresetChanged { .. } => "PresetChanged",
            PlayerEvent::PerformanceAdvisory { .. } => "PerformanceAdvisory",
            PlayerEvent::Warning { .. } => "Warning",
        }
    }

    /// Serialize for a host shell that marshals JSON strings
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the player)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// `emit` is synchronous, so the player's worker threads can publish without
/// a runtime. Subscribers receive with `recv().await` or `blocking_recv()`.
///
/// # Examples
///
/// ```
/// use p4k_common::events::{EventBus, PlayerEvent, PlaybackState};
///
/// let event_bus = EventBus::new(64);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PlayerEvent::state(PlaybackState::Paused));
///
/// match rx.try_recv() {
///     Ok(PlayerEvent::PlaybackStateChanged { state, .. }) => assert_eq!(state, PlaybackState::Paused),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest ones are dropped (the subscriber then sees `Lagged`).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_state_wire_names() {
        assert_eq!(PlaybackState::Playing.to_string(), "playing");
        assert_eq!(PlaybackState::Paused.to_string(), "paused");
        assert_eq!(PlaybackState::Stopped.to_string(), "stopped");
        assert_eq!(PlaybackState::Ended.to_string(), "ended");

        let json = serde_json::to_string(&PlaybackState::Ended).unwrap();
        assert_eq!(json, "\"ended\"");
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = PlayerEvent::PresetChanged {
            preset: "high".to_string(),
            anime_overlay: false,
            timestamp: chrono::Utc::now(),
        };

        let json = event.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "PresetChanged");
        assert_eq!(value["preset"], "high");
        assert_eq!(event.event_type(), "PresetChanged");
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(8);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(PlayerEvent::warning("nobody listening")).is_err());

        // Lossy emit never fails
        bus.emit_lossy(PlayerEvent::warning("still fine"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.capacity(), 8);
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(PlayerEvent::state(PlaybackState::Playing));
        bus.emit_lossy(PlayerEvent::state(PlaybackState::Paused));

        for expected in [PlaybackState::Playing, PlaybackState::Paused] {
            match rx.recv().await.unwrap() {
                PlayerEvent::PlaybackStateChanged { state, .. } => assert_eq!(state, expected),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }
}
