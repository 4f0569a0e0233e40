//! Host facade
//!
//! Flat, UI-friendly surface for embedding the player in a desktop shell.
//! Ids and modes travel as strings, stats as a serializable struct or a JSON
//! map, and notifications go through the event bus.

use crate::error::Result;
use crate::player::{EventLoopHandle, Player, SourceKind};
use crate::presets;
use p4k_common::events::PlayerEvent;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Step used by `seek_forward` / `seek_backward`
pub const SEEK_STEP_SECONDS: f64 = 10.0;

/// Playback statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub position: f64,
    pub duration: f64,
    pub dropped_frames: i64,
    pub mode: String,
    pub anime_mode: bool,
    pub is_playing: bool,
    pub is_paused: bool,
    pub volume: u8,
}

impl fmt::Display for PlayerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode:           {}", self.mode)?;
        writeln!(f, "Position:       {:.2} / {:.2}", self.position, self.duration)?;
        writeln!(f, "Volume:         {}%", self.volume)?;
        write!(f, "Dropped frames: {}", self.dropped_frames)
    }
}

/// Registry entry as shown in a mode picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub gpu_required: String,
}

impl PresetSummary {
    /// String map with `id`, `name`, `description`, `icon`, `gpuRequired`
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("id".to_string(), self.id.clone()),
            ("name".to_string(), self.name.clone()),
            ("description".to_string(), self.description.clone()),
            ("icon".to_string(), self.icon.clone()),
            ("gpuRequired".to_string(), self.gpu_required.clone()),
        ])
    }
}

/// Registry in fixed order
pub fn preset_summaries() -> Vec<PresetSummary> {
    presets::list_all()
        .iter()
        .map(|def| PresetSummary {
            id: def.id.to_string(),
            name: def.display_name.to_string(),
            description: def.description.to_string(),
            icon: def.icon.to_string(),
            gpu_required: def.minimum_gpu.to_string(),
        })
        .collect()
}

/// Progress in percent; `0` when the duration is unknown
pub fn progress_percent(position: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    position / duration * 100.0
}

/// Player wrapper exposed to a host UI
#[derive(Clone)]
pub struct HostPlayer {
    player: Arc<Player>,
}

impl HostPlayer {
    pub fn new(player: Arc<Player>) -> Self {
        Self { player }
    }

    pub fn from_player(player: Player) -> Self {
        Self::new(Arc::new(player))
    }

    /// Underlying player
    pub fn player(&self) -> &Arc<Player> {
        &self.player
    }

    /// Embed video output in the host window
    pub fn initialize(&self, window_handle: i64) -> Result<()> {
        self.player.set_window_handle(window_handle)
    }

    pub fn load(&self, target: &str) -> Result<SourceKind> {
        self.player.load_source(target)
    }

    pub fn play(&self) {
        self.player.play();
    }

    pub fn pause(&self) {
        self.player.pause();
    }

    pub fn toggle_play(&self) {
        self.player.toggle_pause();
    }

    pub fn stop(&self) {
        self.player.stop();
    }

    pub fn seek(&self, seconds: f64) {
        self.player.seek_absolute(seconds);
    }

    pub fn seek_forward(&self) {
        self.player.seek_relative(SEEK_STEP_SECONDS);
    }

    pub fn seek_backward(&self) {
        self.player.seek_relative(-SEEK_STEP_SECONDS);
    }

    pub fn set_volume(&self, volume: i64) {
        self.player.set_volume(volume);
    }

    pub fn volume(&self) -> u8 {
        self.player.volume()
    }

    pub fn toggle_mute(&self) {
        self.player.toggle_mute();
    }

    pub fn toggle_fullscreen(&self) {
        self.player.toggle_fullscreen();
    }

    pub fn position(&self) -> f64 {
        self.player.position()
    }

    pub fn duration(&self) -> f64 {
        self.player.duration()
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.player.position(), self.player.duration())
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    pub fn is_paused(&self) -> bool {
        self.player.is_paused()
    }

    /// Switch preset by id (`low`, `medium`, `high`); unknown ids select Balanced
    pub fn set_quality_mode(&self, mode: &str) {
        self.player.apply_preset_id(mode);
    }

    pub fn quality_mode(&self) -> String {
        self.player.active_preset().id().to_string()
    }

    pub fn quality_modes(&self) -> Vec<BTreeMap<String, String>> {
        preset_summaries().iter().map(PresetSummary::to_map).collect()
    }

    pub fn set_anime_mode(&self, enabled: bool) {
        self.player.set_anime_overlay(enabled);
    }

    pub fn enable_motion_smoothing(&self, enabled: bool) {
        self.player.set_motion_interpolation(enabled);
    }

    pub fn set_subtitle(&self, id: i64) {
        self.player.set_subtitle_track(&id.to_string());
    }

    pub fn set_audio(&self, id: i64) {
        self.player.set_audio_track(&id.to_string());
    }

    pub fn load_external_subtitle(&self, path: &str) -> Result<()> {
        self.player.load_external_subtitle(path)
    }

    pub fn dropped_frames(&self) -> i64 {
        self.player.dropped_frames()
    }

    pub fn stats(&self) -> PlayerStats {
        let session = self.player.snapshot();
        PlayerStats {
            position: self.player.position(),
            duration: self.player.duration(),
            dropped_frames: self.player.dropped_frames(),
            mode: session.active_preset.id().to_string(),
            anime_mode: session.anime_overlay,
            is_playing: session.is_active(),
            is_paused: session.is_paused,
            volume: session.volume,
        }
    }

    /// Stats as a string-keyed JSON map
    pub fn stats_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self.stats()) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PlayerEvent> {
        self.player.subscribe()
    }

    /// Start dispatching engine events on a background thread
    pub fn start_event_loop(&self) -> Result<EventLoopHandle> {
        self.player.spawn_event_loop()
    }

    /// Release the engine; safe to call more than once
    pub fn destroy(&self) {
        self.player.terminate();
    }
}
