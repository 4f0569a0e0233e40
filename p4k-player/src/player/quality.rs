//! Preset and overlay application
//!
//! Walks directive plans from the registry against the engine. Shader
//! failures are degraded in place: the stage is skipped (or its fallback
//! used), a warning is logged and reported, and the remaining directives
//! still run.

use super::core::Player;
use crate::error::{Error, Result};
use crate::presets::{self, Directive, QualityPreset};
use crate::state::SessionState;
use p4k_common::events::PlayerEvent;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Outcome of applying a directive plan
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyReport {
    /// Preset active after the operation
    pub preset: QualityPreset,
    /// Overlay state after the operation
    pub anime_overlay: bool,
    /// Directives the engine accepted
    pub applied: usize,
    /// Property directives the engine rejected
    pub failed: Vec<String>,
    /// Shader stages attached, in chain order
    pub attached_shaders: Vec<PathBuf>,
    /// Shader stages skipped because the resource was unavailable
    pub missing_shaders: Vec<PathBuf>,
}

impl ApplyReport {
    pub fn new(preset: QualityPreset, anime_overlay: bool) -> Self {
        Self {
            preset,
            anime_overlay,
            applied: 0,
            failed: Vec::new(),
            attached_shaders: Vec::new(),
            missing_shaders: Vec::new(),
        }
    }

    /// Everything applied without degradation
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.missing_shaders.is_empty()
    }
}

impl Player {
    /// Switch quality preset
    ///
    /// Clears the shader chain, applies the preset's directives in order and
    /// makes it the active preset. With the anime overlay enabled the overlay
    /// chain is re-attached on top. Never fails as a whole.
    pub fn apply_preset(&self, preset: QualityPreset) -> ApplyReport {
        let mut events = Vec::new();
        let report = {
            let mut session = self.session();
            self.apply_preset_locked(&mut session, preset, &mut events)
        };
        self.emit_all(events);
        report
    }

    /// Switch preset by id; unknown ids select Balanced
    pub fn apply_preset_id(&self, id: &str) -> ApplyReport {
        let preset = QualityPreset::resolve_or_default(id);
        if QualityPreset::from_id(id).is_none() {
            warn!("Unknown quality mode '{}', using {}", id, preset);
        }
        self.apply_preset(preset)
    }

    /// Enable or disable the anime overlay
    ///
    /// Enabling replaces the shader chain with the overlay stages whatever the
    /// preset. Disabling re-applies the active preset from scratch.
    pub fn set_anime_overlay(&self, enabled: bool) -> ApplyReport {
        let mut events = Vec::new();
        let report = {
            let mut session = self.session();
            if enabled {
                session.anime_overlay = true;
                let mut report = ApplyReport::new(session.active_preset, true);
                self.execute(&presets::overlay_plan(), &mut report, &mut events);
                info!(
                    "Anime overlay enabled ({} stages)",
                    report.attached_shaders.len()
                );
                events.push(preset_changed(&session));
                report
            } else {
                session.anime_overlay = false;
                info!("Anime overlay disabled, restoring {}", session.active_preset);
                let preset = session.active_preset;
                self.apply_preset_locked(&mut session, preset, &mut events)
            }
        };
        self.emit_all(events);
        report
    }

    /// Toggle motion interpolation (frame synthesis for smoother motion)
    pub fn set_motion_interpolation(&self, enabled: bool) -> ApplyReport {
        let mut events = Vec::new();
        let report = {
            let session = self.session();
            let mut report = ApplyReport::new(session.active_preset, session.anime_overlay);
            self.execute(presets::interpolation_plan(enabled), &mut report, &mut events);
            report
        };
        info!(
            "Motion interpolation {}",
            if enabled { "enabled" } else { "disabled" }
        );
        self.emit_all(events);
        report
    }

    fn apply_preset_locked(
        &self,
        session: &mut SessionState,
        preset: QualityPreset,
        events: &mut Vec<PlayerEvent>,
    ) -> ApplyReport {
        let definition = preset.definition();
        info!("{} Activating preset: {}", definition.icon, definition.display_name);

        let mut report = ApplyReport::new(preset, session.anime_overlay);
        let mut plan = presets::application_plan(preset);
        if session.anime_overlay {
            // The overlay replaces the whole shader chain
            plan.retain(|directive| !matches!(directive, Directive::AppendShader { .. }));
        }
        self.execute(&plan, &mut report, events);

        session.active_preset = preset;
        session.advisory_sent = false;

        if session.anime_overlay {
            self.execute(&presets::overlay_plan(), &mut report, events);
        }

        if report.is_complete() {
            info!("Preset {} applied ({} directives)", preset, report.applied);
        } else {
            warn!(
                "Preset {} applied with {} rejected settings and {} missing shaders",
                preset,
                report.failed.len(),
                report.missing_shaders.len()
            );
        }

        events.push(preset_changed(session));
        report
    }

    /// Run a plan against the engine, recording the outcome
    pub(super) fn execute(
        &self,
        plan: &[Directive],
        report: &mut ApplyReport,
        events: &mut Vec<PlayerEvent>,
    ) {
        for directive in plan {
            match *directive {
                Directive::Set { key, value } => match self.engine.set_property(key, value) {
                    Ok(()) => {
                        debug!("{}", directive);
                        report.applied += 1;
                    }
                    Err(e) => {
                        warn!("Engine rejected {}: {}", directive, e);
                        report.failed.push(directive.to_string());
                    }
                },
                Directive::ClearShaderChain => match self.engine.set_property("glsl-shaders", "") {
                    Ok(()) => {
                        debug!("Shader chain cleared");
                        report.applied += 1;
                        report.attached_shaders.clear();
                    }
                    Err(e) => {
                        warn!("Could not clear shader chain: {}", e);
                        report.failed.push(directive.to_string());
                    }
                },
                Directive::AppendShader { file, fallback } => {
                    self.append_with_fallback(file, fallback, report, events)
                }
            }
        }
    }

    fn append_with_fallback(
        &self,
        file: &str,
        fallback: Option<&str>,
        report: &mut ApplyReport,
        events: &mut Vec<PlayerEvent>,
    ) {
        let candidates = std::iter::once(file).chain(fallback);

        for candidate in candidates {
            match self.attach_shader(candidate) {
                Ok(path) => {
                    debug!("Shader attached: {}", path.display());
                    report.applied += 1;
                    report.attached_shaders.push(path);
                    return;
                }
                Err(e) => {
                    warn!("Shader unavailable, continuing without it: {}", e);
                    report.missing_shaders.push(self.shader_dir.join(candidate));
                    events.push(PlayerEvent::warning(e.to_string()));
                }
            }
        }
    }

    /// Append one shader stage; `ResourceMissing` when the file is absent
    fn attach_shader(&self, file: &str) -> Result<PathBuf> {
        let path = self.shader_dir.join(file);
        if !path.is_file() {
            return Err(Error::ResourceMissing(path));
        }

        let arg = path.to_string_lossy();
        self.engine
            .command(&["change-list", "glsl-shaders", "append", arg.as_ref()])?;
        Ok(path)
    }
}

fn preset_changed(session: &SessionState) -> PlayerEvent {
    PlayerEvent::PresetChanged {
        preset: session.active_preset.id().to_string(),
        anime_overlay: session.anime_overlay,
        timestamp: chrono::Utc::now(),
    }
}
