//! Engine event loop
//!
//! **Responsibilities:**
//! - Bounded-wait polling of engine events
//! - Translation into host-facing [`PlayerEvent`]s
//! - Dropped-frame advisory on the Ultra preset
//! - Cooperative stop within one poll timeout

use super::core::Player;
use crate::engine::{EndReason, EngineEvent};
use crate::error::Result;
use crate::presets::QualityPreset;
use p4k_common::events::{PlaybackState, PlayerEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest single wait for an engine event
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Dropped frames above which an advisory is raised on Ultra
pub const DROPPED_FRAME_THRESHOLD: i64 = 30;

/// Shared stop request for a running loop
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why the loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Engine reported shutdown
    Shutdown,
    /// Stop flag was raised
    Stopped,
}

impl Player {
    /// Dispatch engine events until shutdown or a stop request
    ///
    /// Blocks the calling thread. Each iteration waits at most the configured
    /// poll timeout, so a stop request is honoured within that bound.
    pub fn run(&self, stop: &StopFlag) -> LoopExit {
        info!("Event loop started");

        let exit = loop {
            if stop.is_stopped() {
                break LoopExit::Stopped;
            }

            let Some(event) = self.engine.wait_event(self.poll_timeout) else {
                continue;
            };

            if self.handle_engine_event(event) == Some(LoopExit::Shutdown) {
                break LoopExit::Shutdown;
            }
        };

        info!("Event loop finished: {:?}", exit);
        exit
    }

    /// Run the loop on a dedicated `p4k-events` thread
    pub fn spawn_event_loop(self: &Arc<Self>) -> Result<EventLoopHandle> {
        let stop = StopFlag::new();
        let player = Arc::clone(self);
        let flag = stop.clone();

        let join = thread::Builder::new()
            .name("p4k-events".to_string())
            .spawn(move || player.run(&flag))?;

        Ok(EventLoopHandle {
            stop,
            join: Some(join),
        })
    }

    fn handle_engine_event(&self, event: EngineEvent) -> Option<LoopExit> {
        match event {
            EngineEvent::FileLoaded => self.on_file_loaded(),
            EngineEvent::EndOfFile { reason } => self.on_end_of_file(reason),
            EngineEvent::Shutdown => {
                info!("Engine shutdown received");
                return Some(LoopExit::Shutdown);
            }
            EngineEvent::PropertyChange { name } => self.on_property_change(&name),
            EngineEvent::Other(name) => debug!("Engine event ignored: {}", name),
        }
        None
    }

    fn on_file_loaded(&self) {
        let duration = self.duration();
        {
            let mut session = self.session();
            session.last_known_duration = duration;
            session.advisory_sent = false;
        }
        info!("File loaded, duration {:.1}s", duration);
        self.emit(PlayerEvent::DurationChanged {
            duration,
            timestamp: chrono::Utc::now(),
        });
    }

    fn on_end_of_file(&self, reason: EndReason) {
        match reason {
            EndReason::Stop | EndReason::Redirect => {
                debug!("Playback ended by {:?}, not reported", reason);
            }
            EndReason::Error => {
                warn!("Playback ended with an engine error");
                self.emit(PlayerEvent::state(PlaybackState::Ended));
            }
            _ => {
                info!("Playback ended ({:?})", reason);
                self.emit(PlayerEvent::state(PlaybackState::Ended));
            }
        }
    }

    fn on_property_change(&self, name: &str) {
        let (loaded, preset, advisory_sent) = {
            let session = self.session();
            (session.is_playing, session.active_preset, session.advisory_sent)
        };

        debug!("Property changed: {}", name);
        if loaded {
            self.emit(PlayerEvent::TimeUpdate {
                position: self.position(),
                duration: self.duration(),
                timestamp: chrono::Utc::now(),
            });
        }

        if preset != QualityPreset::Ultra || advisory_sent {
            return;
        }

        let dropped = self.dropped_frames();
        if dropped <= DROPPED_FRAME_THRESHOLD {
            return;
        }

        {
            let mut session = self.session();
            if session.advisory_sent || session.active_preset != QualityPreset::Ultra {
                return;
            }
            session.advisory_sent = true;
        }

        let message = format!(
            "{} frames dropped on {}; consider Balanced for smoother playback",
            dropped,
            preset.definition().display_name
        );
        warn!("{}", message);
        self.emit(PlayerEvent::PerformanceAdvisory {
            preset: preset.id().to_string(),
            dropped_frames: dropped,
            message,
            timestamp: chrono::Utc::now(),
        });
    }
}

/// Handle to a loop running on its own thread
///
/// Dropping the handle stops the loop and joins the thread.
pub struct EventLoopHandle {
    stop: StopFlag,
    join: Option<JoinHandle<LoopExit>>,
}

impl EventLoopHandle {
    /// Flag shared with the loop
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Request a stop and wait for the thread
    ///
    /// Returns `None` if the loop already was joined or panicked.
    pub fn stop(&mut self) -> Option<LoopExit> {
        self.stop.request_stop();
        let join = self.join.take()?;
        match join.join() {
            Ok(exit) => Some(exit),
            Err(_) => {
                warn!("Event loop thread panicked");
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for EventLoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::RecordingEngine;
    use crate::engine::PropertyValue;
    use crate::player::PlayerOptions;
    use std::time::Instant;
    use tokio::sync::broadcast::Receiver;

    fn setup() -> (Arc<RecordingEngine>, Arc<Player>) {
        let engine = Arc::new(RecordingEngine::new());
        let options = PlayerOptions {
            apply_base_config: false,
            poll_timeout: Duration::from_millis(20),
            ..PlayerOptions::default()
        };
        let player = Player::new(engine.clone(), options).unwrap();
        (engine, Arc::new(player))
    }

    fn drain(rx: &mut Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_shutdown_ends_loop() {
        let (engine, player) = setup();
        engine.push_event(EngineEvent::Shutdown);
        assert_eq!(player.run(&StopFlag::new()), LoopExit::Shutdown);
    }

    #[test]
    fn test_stop_flag_honoured_within_timeout() {
        let (_engine, player) = setup();
        let mut handle = player.spawn_event_loop().unwrap();

        let started = Instant::now();
        assert_eq!(handle.stop(), Some(LoopExit::Stopped));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(handle.is_finished());
    }

    #[test]
    fn test_file_loaded_refreshes_duration() {
        let (engine, player) = setup();
        let mut rx = player.subscribe();
        engine.set_reported("duration", PropertyValue::Double(1440.0));

        engine.push_event(EngineEvent::FileLoaded);
        engine.push_event(EngineEvent::Shutdown);
        player.run(&StopFlag::new());

        assert_eq!(player.last_known_duration(), 1440.0);
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, PlayerEvent::DurationChanged { duration, .. } if *duration == 1440.0)));
    }

    #[test]
    fn test_end_of_file_reports_ended() {
        let (engine, player) = setup();
        let mut rx = player.subscribe();

        engine.push_event(EngineEvent::EndOfFile { reason: EndReason::Stop });
        engine.push_event(EngineEvent::EndOfFile { reason: EndReason::Eof });
        engine.push_event(EngineEvent::Shutdown);
        player.run(&StopFlag::new());

        let ended: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    PlayerEvent::PlaybackStateChanged { state: PlaybackState::Ended, .. }
                )
            })
            .collect();
        assert_eq!(ended.len(), 1);
    }

    #[test]
    fn test_time_update_only_while_playing() {
        let (engine, player) = setup();
        engine.set_reported("time-pos", PropertyValue::Double(30.0));
        engine.set_reported("duration", PropertyValue::Double(60.0));
        let mut rx = player.subscribe();

        engine.push_event(EngineEvent::PropertyChange { name: "time-pos".to_string() });
        engine.push_event(EngineEvent::Shutdown);
        player.run(&StopFlag::new());
        assert!(drain(&mut rx).is_empty());

        player.load_source("a.mkv").unwrap();
        drain(&mut rx);
        engine.push_event(EngineEvent::PropertyChange { name: "time-pos".to_string() });
        engine.push_event(EngineEvent::Shutdown);
        player.run(&StopFlag::new());

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            PlayerEvent::TimeUpdate { position, duration, .. } if *position == 30.0 && *duration == 60.0
        )));
    }

    #[test]
    fn test_time_update_while_paused_after_seek() {
        let (engine, player) = setup();
        player.load_source("a.mkv").unwrap();
        player.pause();
        engine.set_reported("time-pos", PropertyValue::Double(42.0));
        player.seek_absolute(42.0);
        let mut rx = player.subscribe();

        engine.push_event(EngineEvent::PropertyChange { name: "time-pos".to_string() });
        engine.push_event(EngineEvent::Shutdown);
        player.run(&StopFlag::new());

        let updates: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, PlayerEvent::TimeUpdate { .. }))
            .collect();
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], PlayerEvent::TimeUpdate { position, .. } if position == 42.0));
        assert!(player.is_paused());
    }

    #[test]
    fn test_dropped_frame_advisory_latched_on_ultra() {
        let (engine, player) = setup();
        engine.set_reported("frame-drop-count", PropertyValue::Int(45));
        player.apply_preset(QualityPreset::Ultra);
        player.load_source("a.mkv").unwrap();
        let mut rx = player.subscribe();

        for _ in 0..3 {
            engine.push_event(EngineEvent::PropertyChange { name: "time-pos".to_string() });
        }
        engine.push_event(EngineEvent::Shutdown);
        player.run(&StopFlag::new());

        let advisories = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, PlayerEvent::PerformanceAdvisory { dropped_frames: 45, .. }))
            .count();
        assert_eq!(advisories, 1);
        assert_eq!(player.active_preset(), QualityPreset::Ultra);
    }

    #[test]
    fn test_no_advisory_below_threshold_or_off_ultra() {
        let (engine, player) = setup();
        engine.set_reported("frame-drop-count", PropertyValue::Int(30));
        player.apply_preset(QualityPreset::Ultra);
        player.load_source("a.mkv").unwrap();
        let mut rx = player.subscribe();

        engine.push_event(EngineEvent::PropertyChange { name: "time-pos".to_string() });
        engine.push_event(EngineEvent::Shutdown);
        player.run(&StopFlag::new());
        assert!(!drain(&mut rx)
            .iter()
            .any(|e| matches!(e, PlayerEvent::PerformanceAdvisory { .. })));

        engine.set_reported("frame-drop-count", PropertyValue::Int(500));
        player.apply_preset(QualityPreset::Balanced);
        drain(&mut rx);
        engine.push_event(EngineEvent::PropertyChange { name: "time-pos".to_string() });
        engine.push_event(EngineEvent::Shutdown);
        player.run(&StopFlag::new());
        assert!(!drain(&mut rx)
            .iter()
            .any(|e| matches!(e, PlayerEvent::PerformanceAdvisory { .. })));
    }
}
