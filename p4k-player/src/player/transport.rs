//! Transport and window control
//!
//! **Responsibilities:**
//! - Source loading (local paths and network streams)
//! - Play/pause/stop/seek and volume
//! - Track selection and external subtitles
//! - Window, title, speed and screenshot pass-throughs

use super::core::Player;
use super::source::{SourceKind, STREAM_RECONNECT_OPTIONS};
use crate::error::{Error, Result};
use crate::state::SessionState;
use p4k_common::events::{PlaybackState, PlayerEvent};
use std::path::Path;
use tracing::{debug, info, warn};

impl Player {
    /// Load a local path or network URI and start playback
    ///
    /// Remote sources get reconnect options before the load command. If the
    /// engine rejects the source the session is left untouched.
    pub fn load_source(&self, target: &str) -> Result<SourceKind> {
        let kind = SourceKind::classify(target);

        {
            let mut session = self.session();

            if kind.is_remote() {
                debug!("Network source, enabling stream reconnect");
                self.engine
                    .set_property("stream-lavf-o", STREAM_RECONNECT_OPTIONS)
                    .map_err(|reason| Error::Load {
                        target: target.to_string(),
                        reason,
                    })?;
            }

            self.engine
                .command(&["loadfile", target])
                .map_err(|reason| Error::Load {
                    target: target.to_string(),
                    reason,
                })?;

            session.is_playing = true;
            session.is_paused = false;
            session.last_known_duration = 0.0;
            session.advisory_sent = false;
        }

        info!("Loaded {} source: {}", if kind.is_remote() { "remote" } else { "local" }, target);
        self.emit(PlayerEvent::FileLoaded {
            source: target.to_string(),
            remote: kind.is_remote(),
            timestamp: chrono::Utc::now(),
        });
        Ok(kind)
    }

    /// Resume playback
    pub fn play(&self) {
        self.set_paused(false);
    }

    /// Pause playback
    pub fn pause(&self) {
        self.set_paused(true);
    }

    /// Flip pause state; returns true when now paused
    pub fn toggle_pause(&self) -> bool {
        let paused = {
            let mut session = self.session();
            let paused = !session.is_paused;
            self.write_pause(&mut session, paused);
            paused
        };
        self.emit(PlayerEvent::state(pause_state(paused)));
        paused
    }

    /// Stop playback and unload the current file
    pub fn stop(&self) {
        {
            let mut session = self.session();
            if let Err(e) = self.engine.command(&["stop"]) {
                warn!("Stop command failed: {}", e);
            }
            session.is_playing = false;
            session.is_paused = false;
        }
        info!("Playback stopped");
        self.emit(PlayerEvent::state(PlaybackState::Stopped));
    }

    fn set_paused(&self, paused: bool) {
        {
            let mut session = self.session();
            self.write_pause(&mut session, paused);
        }
        self.emit(PlayerEvent::state(pause_state(paused)));
    }

    fn write_pause(&self, session: &mut SessionState, paused: bool) {
        if let Err(e) = self
            .engine
            .set_property("pause", if paused { "yes" } else { "no" })
        {
            warn!("Pause property rejected: {}", e);
        }
        session.is_paused = paused;
        if !paused {
            session.is_playing = true;
        }
    }

    /// Seek to an absolute position in seconds
    pub fn seek_absolute(&self, seconds: f64) {
        self.seek(seconds, "absolute");
    }

    /// Seek relative to the current position
    pub fn seek_relative(&self, delta: f64) {
        self.seek(delta, "relative");
    }

    fn seek(&self, value: f64, mode: &str) {
        let value = format!("{:.6}", value);
        let _session = self.session();
        if let Err(e) = self.engine.command(&["seek", &value, mode]) {
            warn!("Seek {} {} failed: {}", mode, value, e);
        }
    }

    /// Set volume; values outside 0-100 are clamped. Returns the stored value.
    pub fn set_volume(&self, percent: i64) -> u8 {
        let volume = SessionState::clamp_volume(percent);
        let mut session = self.session();
        session.volume = volume;
        if let Err(e) = self.engine.set_property_i64("volume", i64::from(volume)) {
            warn!("Volume {} rejected: {}", volume, e);
        }
        volume
    }

    /// Select a subtitle track by engine id (`no` disables, `auto` picks)
    pub fn set_subtitle_track(&self, id: &str) {
        self.set_logged("sid", id);
    }

    /// Select an audio track by engine id
    pub fn set_audio_track(&self, id: &str) {
        self.set_logged("aid", id);
    }

    /// Add an external subtitle file to the current playback
    pub fn load_external_subtitle(&self, path: &str) -> Result<()> {
        let result = {
            let _session = self.session();
            self.engine.command(&["sub-add", path])
        };

        match result {
            Ok(()) => {
                info!("Subtitle loaded: {}", path);
                Ok(())
            }
            Err(reason) => {
                let error = Error::Subtitle {
                    path: path.to_string(),
                    reason,
                };
                warn!("{}", error);
                self.emit(PlayerEvent::warning(error.to_string()));
                Err(error)
            }
        }
    }

    /// Window and OSD title
    pub fn set_title(&self, title: &str) {
        let _session = self.session();
        for name in ["title", "force-media-title"] {
            if let Err(e) = self.engine.set_property(name, title) {
                warn!("Could not set {}: {}", name, e);
            }
        }
    }

    pub fn set_fullscreen(&self, enabled: bool) {
        self.set_logged("fullscreen", if enabled { "yes" } else { "no" });
    }

    pub fn toggle_fullscreen(&self) {
        self.command_logged(&["cycle", "fullscreen"]);
    }

    pub fn toggle_mute(&self) {
        self.command_logged(&["cycle", "mute"]);
    }

    /// Playback speed multiplier
    pub fn set_speed(&self, speed: f64) {
        self.set_logged("speed", &format!("{:.2}", speed));
    }

    /// Screenshot of the current frame, saved by the engine
    pub fn screenshot(&self) {
        self.command_logged(&["screenshot"]);
    }

    /// Embed video output in a host-owned native window
    pub fn set_window_handle(&self, handle: i64) -> Result<()> {
        let mut session = self.session();
        self.engine.set_property_i64("wid", handle)?;
        session.window_handle = Some(handle);
        info!("Video output embedded in window {}", handle);
        Ok(())
    }

    /// Use a key-binding file
    pub fn load_input_config(&self, path: &Path) {
        self.set_logged("input-conf", &path.to_string_lossy());
    }

    /// Load a user script (e.g. an on-screen controller)
    pub fn load_script(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(Error::ResourceMissing(path.to_path_buf()));
        }
        let arg = path.to_string_lossy();
        let _session = self.session();
        self.engine.command(&["load-script", arg.as_ref()])?;
        debug!("Script loaded: {}", path.display());
        Ok(())
    }

    /// Directory the engine loads scripts from
    pub fn set_scripts_dir(&self, dir: &Path) {
        self.set_logged("scripts", &dir.to_string_lossy());
    }

    fn set_logged(&self, name: &str, value: &str) {
        let _session = self.session();
        match self.engine.set_property(name, value) {
            Ok(()) => debug!("{}={}", name, value),
            Err(e) => warn!("Engine rejected {}={}: {}", name, value, e),
        }
    }

    fn command_logged(&self, args: &[&str]) {
        let _session = self.session();
        if let Err(e) = self.engine.command(args) {
            warn!("Command {:?} failed: {}", args, e);
        }
    }
}

fn pause_state(paused: bool) -> PlaybackState {
    if paused {
        PlaybackState::Paused
    } else {
        PlaybackState::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{EngineCall, RecordingEngine};
    use crate::player::PlayerOptions;
    use std::sync::Arc;

    fn setup() -> (Arc<RecordingEngine>, Player) {
        let engine = Arc::new(RecordingEngine::new());
        let options = PlayerOptions {
            apply_base_config: false,
            ..PlayerOptions::default()
        };
        let player = Player::new(engine.clone(), options).unwrap();
        engine.clear_calls();
        (engine, player)
    }

    fn command(args: &[&str]) -> EngineCall {
        EngineCall::Command(args.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn test_remote_load_sets_reconnect_first() {
        let (engine, player) = setup();

        let kind = player.load_source("https://cdn.example/live.m3u8").unwrap();
        assert_eq!(kind, SourceKind::Remote);
        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::SetProperty {
                    name: "stream-lavf-o".to_string(),
                    value: STREAM_RECONNECT_OPTIONS.to_string(),
                },
                command(&["loadfile", "https://cdn.example/live.m3u8"]),
            ]
        );
    }

    #[test]
    fn test_local_load_has_no_stream_options() {
        let (engine, player) = setup();

        player.load_source("/videos/ep01.mkv").unwrap();
        assert_eq!(engine.calls(), vec![command(&["loadfile", "/videos/ep01.mkv"])]);
        assert!(player.is_playing());
        assert!(!player.is_paused());
    }

    #[test]
    fn test_rejected_load_leaves_state() {
        let (engine, player) = setup();
        engine.reject_commands_containing("broken.mkv");

        let err = player.load_source("broken.mkv").unwrap_err();
        assert!(matches!(err, Error::Load { ref target, .. } if target == "broken.mkv"));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_toggle_pause_flips_and_emits() {
        let (engine, player) = setup();
        player.load_source("a.mkv").unwrap();
        let mut rx = player.subscribe();

        assert!(player.toggle_pause());
        assert_eq!(engine.property("pause").as_deref(), Some("yes"));
        assert!(!player.toggle_pause());
        assert_eq!(engine.property("pause").as_deref(), Some("no"));

        let states: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                PlayerEvent::PlaybackStateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![PlaybackState::Paused, PlaybackState::Playing]);
    }

    #[test]
    fn test_stop_clears_flags() {
        let (engine, player) = setup();
        player.load_source("a.mkv").unwrap();
        player.pause();
        player.stop();

        assert!(!player.is_playing());
        assert!(!player.is_paused());
        assert!(engine.calls().iter().any(|c| c.is_command("stop")));
    }

    #[test]
    fn test_seek_formats_without_clamping() {
        let (engine, player) = setup();
        player.seek_absolute(90.5);
        player.seek_relative(-10.0);
        player.seek_absolute(-3.0);

        assert_eq!(
            engine.calls(),
            vec![
                command(&["seek", "90.500000", "absolute"]),
                command(&["seek", "-10.000000", "relative"]),
                command(&["seek", "-3.000000", "absolute"]),
            ]
        );
    }

    #[test]
    fn test_volume_clamped_before_engine() {
        let (engine, player) = setup();

        assert_eq!(player.set_volume(200), 100);
        assert_eq!(engine.property("volume").as_deref(), Some("100"));
        assert_eq!(player.set_volume(-5), 0);
        assert_eq!(player.volume(), 0);
        assert_eq!(player.set_volume(55), 55);
        assert_eq!(engine.property("volume").as_deref(), Some("55"));
    }

    #[test]
    fn test_subtitle_failure_is_reported() {
        let (engine, player) = setup();
        engine.reject_commands_containing("missing.srt");
        let mut rx = player.subscribe();

        let err = player.load_external_subtitle("missing.srt").unwrap_err();
        assert!(matches!(err, Error::Subtitle { .. }));
        assert!(matches!(rx.try_recv().unwrap(), PlayerEvent::Warning { .. }));
    }

    #[test]
    fn test_window_handle_and_pass_throughs() {
        let (engine, player) = setup();
        player.set_window_handle(0x2A).unwrap();
        player.set_speed(1.5);
        player.set_title("▶ ep01.mkv - p4k");
        player.toggle_mute();
        player.screenshot();
        player.set_scripts_dir(Path::new("/opt/p4k/scripts"));

        assert_eq!(player.window_handle(), Some(42));
        assert_eq!(engine.property("wid").as_deref(), Some("42"));
        assert_eq!(engine.property("speed").as_deref(), Some("1.50"));
        assert_eq!(engine.property("force-media-title").as_deref(), Some("▶ ep01.mkv - p4k"));
        assert!(engine.calls().contains(&command(&["cycle", "mute"])));
        assert!(engine.calls().contains(&command(&["screenshot"])));
        assert_eq!(engine.property("scripts").as_deref(), Some("/opt/p4k/scripts"));
    }

    #[test]
    fn test_load_script_requires_file() {
        let (_engine, player) = setup();
        let err = player.load_script(Path::new("/nonexistent/osc.lua")).unwrap_err();
        assert!(matches!(err, Error::ResourceMissing(_)));
    }
}
