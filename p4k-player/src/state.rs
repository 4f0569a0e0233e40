//! Session state
//!
//! Plain data owned by the [`Player`](crate::player::Player) behind its single
//! session mutex. Nothing outside the player mutates it.

use crate::presets::{QualityPreset, SESSION_DEFAULT};
use p4k_common::events::PlaybackState;

/// Stored volume ceiling (the engine may allow more gain via `volume-max`)
pub const MAX_STORED_VOLUME: i64 = 100;

/// Initial volume
pub const DEFAULT_VOLUME: u8 = 100;

/// Mutable playback session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Exactly one preset is active at any time
    pub active_preset: QualityPreset,
    /// Anime overlay chain attached on top of the preset
    pub anime_overlay: bool,
    pub is_playing: bool,
    pub is_paused: bool,
    /// 0-100
    pub volume: u8,
    /// Seconds, refreshed when the engine reports a loaded file
    pub last_known_duration: f64,
    /// Native window the video surface is embedded in
    pub window_handle: Option<i64>,
    /// Dropped-frame advisory already emitted for the current file/preset
    pub advisory_sent: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            active_preset: SESSION_DEFAULT,
            anime_overlay: false,
            is_playing: false,
            is_paused: false,
            volume: DEFAULT_VOLUME,
            last_known_duration: 0.0,
            window_handle: None,
            advisory_sent: false,
        }
    }

    /// Clamp a requested volume to the stored range
    pub fn clamp_volume(percent: i64) -> u8 {
        percent.clamp(0, MAX_STORED_VOLUME) as u8
    }

    /// Playing and not paused
    pub fn is_active(&self) -> bool {
        self.is_playing && !self.is_paused
    }

    /// State as reported to hosts
    pub fn playback_state(&self) -> PlaybackState {
        match (self.is_playing, self.is_paused) {
            (_, true) => PlaybackState::Paused,
            (true, false) => PlaybackState::Playing,
            (false, false) => PlaybackState::Stopped,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = SessionState::new();
        assert_eq!(state.active_preset, QualityPreset::Economical);
        assert!(!state.anime_overlay);
        assert_eq!(state.volume, 100);
        assert_eq!(state.last_known_duration, 0.0);
        assert_eq!(state.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_volume_clamping() {
        assert_eq!(SessionState::clamp_volume(-5), 0);
        assert_eq!(SessionState::clamp_volume(200), 100);
        assert_eq!(SessionState::clamp_volume(55), 55);
        assert_eq!(SessionState::clamp_volume(i64::MAX), 100);
    }

    #[test]
    fn test_playback_state_derivation() {
        let mut state = SessionState::new();
        state.is_playing = true;
        assert!(state.is_active());
        assert_eq!(state.playback_state(), PlaybackState::Playing);

        state.is_paused = true;
        assert!(!state.is_active());
        assert_eq!(state.playback_state(), PlaybackState::Paused);
    }
}
