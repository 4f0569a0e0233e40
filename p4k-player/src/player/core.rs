//! Player core - construction, session lock, event emission, teardown
//!
//! **Responsibilities:**
//! - Player struct definition and initialization
//! - Exclusive ownership of the engine handle (released exactly once)
//! - Session lock helper and post-unlock event emission

use super::base_config::{BASE_DIRECTIVES, PLATFORM_DIRECTIVES};
use super::quality::ApplyReport;
use crate::engine::PlaybackEngine;
use crate::error::{Error, Result};
use crate::presets::SESSION_DEFAULT;
use crate::state::SessionState;
use p4k_common::events::{EventBus, PlayerEvent};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Property observed for periodic time updates
pub(super) const OBSERVED_PROPERTY: &str = "time-pos";

/// Player construction options
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    /// Directory holding shader files
    pub shader_dir: PathBuf,
    /// Apply window/OSD/subtitle/cache defaults at construction
    pub apply_base_config: bool,
    /// Event channel capacity per subscriber
    pub event_capacity: usize,
    /// Bounded wait used by the event loop
    pub poll_timeout: Duration,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shaders"),
            apply_base_config: true,
            event_capacity: 256,
            poll_timeout: super::event_loop::POLL_TIMEOUT,
        }
    }
}

impl PlayerOptions {
    pub fn with_shader_dir(shader_dir: impl Into<PathBuf>) -> Self {
        Self {
            shader_dir: shader_dir.into(),
            ..Self::default()
        }
    }
}

/// Control layer over one playback engine
///
/// Single choke point for every engine interaction. Mutating operations hold
/// the session lock while they talk to the engine; events are published on
/// the [`EventBus`] only after the lock is released, so subscribers may call
/// straight back into the player.
pub struct Player {
    pub(super) engine: Arc<dyn PlaybackEngine>,
    pub(super) session: Mutex<SessionState>,
    pub(super) events: EventBus,
    pub(super) shader_dir: PathBuf,
    pub(super) poll_timeout: Duration,
    released: AtomicBool,
}

impl Player {
    /// Wrap an engine handle
    ///
    /// Applies the base configuration (when enabled) and subscribes to
    /// position changes. The session starts on the Economical preset; its
    /// directives are issued by the first `apply_preset` call.
    pub fn new(engine: Arc<dyn PlaybackEngine>, options: PlayerOptions) -> Result<Self> {
        info!("Creating player (shader dir {})", options.shader_dir.display());

        let player = Self {
            engine,
            session: Mutex::new(SessionState::new()),
            events: EventBus::new(options.event_capacity),
            shader_dir: options.shader_dir,
            poll_timeout: options.poll_timeout,
            released: AtomicBool::new(false),
        };

        if options.apply_base_config {
            let report = player.apply_base_config();
            if !report.failed.is_empty() {
                warn!(
                    "{} base settings rejected by engine: {}",
                    report.failed.len(),
                    report.failed.join(", ")
                );
            }
        }

        player
            .engine
            .observe_property(OBSERVED_PROPERTY)
            .map_err(|e| Error::Initialization(format!("cannot observe {}: {}", OBSERVED_PROPERTY, e)))?;

        debug!("Player ready, session preset {}", SESSION_DEFAULT);
        Ok(player)
    }

    /// Start mpv through its IPC socket and wrap it
    #[cfg(unix)]
    pub fn spawn_mpv(
        mpv: crate::engine::mpv_ipc::MpvOptions,
        options: PlayerOptions,
    ) -> Result<Self> {
        let engine = crate::engine::mpv_ipc::MpvIpcEngine::spawn(mpv)
            .map_err(|e| Error::Initialization(format!("cannot start mpv: {}", e)))?;
        Self::new(Arc::new(engine), options)
    }

    /// Apply engine defaults (window, OSD, subtitles, cache, platform backend)
    pub fn apply_base_config(&self) -> ApplyReport {
        let session = self.session();
        let mut report = ApplyReport::new(session.active_preset, session.anime_overlay);
        let mut warnings = Vec::new();
        self.execute(BASE_DIRECTIVES, &mut report, &mut warnings);
        self.execute(PLATFORM_DIRECTIVES, &mut report, &mut warnings);
        drop(session);

        debug!("Base configuration: {} settings applied", report.applied);
        report
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Event bus shared with hosts
    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Directory shaders are resolved against
    pub fn shader_dir(&self) -> &Path {
        &self.shader_dir
    }

    /// Release the engine
    ///
    /// The first call shuts the engine down; later calls do nothing.
    pub fn terminate(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            debug!("Engine already released");
            return;
        }
        info!("Releasing playback engine");
        self.engine.terminate();
    }

    /// True once `terminate` has run
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Lock the session, recovering from a poisoned lock
    pub(super) fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish events collected during a critical section
    ///
    /// Must be called after the session guard is dropped.
    pub(super) fn emit_all(&self, events: Vec<PlayerEvent>) {
        for event in events {
            self.events.emit_lossy(event);
        }
    }

    pub(super) fn emit(&self, event: PlayerEvent) {
        self.events.emit_lossy(event);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.terminate();
    }
}
