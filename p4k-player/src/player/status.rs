//! Status queries
//!
//! Engine reads go straight through without the session lock. A failed read
//! is logged at debug level and replaced by a sentinel so hosts can poll
//! freely before a file is loaded.

use super::core::Player;
use crate::error::{Error, Result};
use crate::presets::QualityPreset;
use crate::state::SessionState;
use tracing::debug;

/// Sentinel playback speed when the engine cannot report one
pub const DEFAULT_SPEED: f64 = 1.0;

impl Player {
    /// Current position in seconds
    pub fn try_position(&self) -> Result<f64> {
        self.read_f64("time-pos")
    }

    /// Current position in seconds, `0.0` if unknown
    pub fn position(&self) -> f64 {
        self.try_position().unwrap_or_else(|e| sentinel(e, 0.0))
    }

    /// Total duration in seconds
    pub fn try_duration(&self) -> Result<f64> {
        self.read_f64("duration")
    }

    /// Total duration in seconds, `0.0` if unknown
    pub fn duration(&self) -> f64 {
        self.try_duration().unwrap_or_else(|e| sentinel(e, 0.0))
    }

    /// Frames dropped by the video output since load, `0` if unknown
    pub fn dropped_frames(&self) -> i64 {
        self.engine
            .get_i64("frame-drop-count")
            .map_err(|reason| Error::QueryFailure {
                property: "frame-drop-count",
                reason,
            })
            .unwrap_or_else(|e| sentinel(e, 0))
    }

    /// Playback speed multiplier, `1.0` if unknown
    pub fn speed(&self) -> f64 {
        self.read_f64("speed")
            .unwrap_or_else(|e| sentinel(e, DEFAULT_SPEED))
    }

    fn read_f64(&self, property: &'static str) -> Result<f64> {
        self.engine
            .get_f64(property)
            .map_err(|reason| Error::QueryFailure { property, reason })
    }

    pub fn is_playing(&self) -> bool {
        self.session().is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.session().is_paused
    }

    /// Stored volume (0-100)
    pub fn volume(&self) -> u8 {
        self.session().volume
    }

    pub fn active_preset(&self) -> QualityPreset {
        self.session().active_preset
    }

    pub fn anime_overlay(&self) -> bool {
        self.session().anime_overlay
    }

    /// Duration last reported by the event loop
    pub fn last_known_duration(&self) -> f64 {
        self.session().last_known_duration
    }

    pub fn window_handle(&self) -> Option<i64> {
        self.session().window_handle
    }

    /// Copy of the whole session
    pub fn snapshot(&self) -> SessionState {
        self.session().clone()
    }
}

fn sentinel<T: std::fmt::Debug>(error: Error, value: T) -> T {
    debug!("{}; reporting {:?}", error, value);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::RecordingEngine;
    use crate::engine::PropertyValue;
    use crate::player::PlayerOptions;
    use std::sync::Arc;

    fn setup() -> (Arc<RecordingEngine>, Player) {
        let engine = Arc::new(RecordingEngine::new());
        let options = PlayerOptions {
            apply_base_config: false,
            ..PlayerOptions::default()
        };
        let player = Player::new(engine.clone(), options).unwrap();
        (engine, player)
    }

    #[test]
    fn test_sentinels_before_load() {
        let (engine, player) = setup();
        engine.fail_property("time-pos");

        assert_eq!(player.position(), 0.0);
        assert_eq!(player.duration(), 0.0);
        assert_eq!(player.dropped_frames(), 0);
        assert_eq!(player.speed(), DEFAULT_SPEED);
        assert!(matches!(
            player.try_position(),
            Err(Error::QueryFailure { property: "time-pos", .. })
        ));
    }

    #[test]
    fn test_reads_pass_through() {
        let (engine, player) = setup();
        engine.set_reported("time-pos", PropertyValue::Double(12.5));
        engine.set_reported("duration", PropertyValue::Double(60.0));
        engine.set_reported("frame-drop-count", PropertyValue::Int(7));

        assert_eq!(player.position(), 12.5);
        assert_eq!(player.duration(), 60.0);
        assert_eq!(player.dropped_frames(), 7);
    }

    #[test]
    fn test_snapshot_reflects_session() {
        let (_engine, player) = setup();
        player.set_volume(40);

        let snapshot = player.snapshot();
        assert_eq!(snapshot.volume, 40);
        assert_eq!(snapshot.active_preset, QualityPreset::Economical);
        assert!(!snapshot.is_playing);
    }
}
