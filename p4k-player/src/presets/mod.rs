//! Quality preset registry
//!
//! Presets are pure data: a fixed table mapping each [`QualityPreset`] to an
//! ordered list of engine [`Directive`]s. Nothing here touches the engine;
//! the player walks the plans produced by [`application_plan`] and
//! [`overlay_plan`].
//!
//! Every plan starts with [`Directive::ClearShaderChain`], so switching presets
//! never accumulates shader stages.

mod definitions;

use definitions::{ANIME_OVERLAY, INTERPOLATION_OFF, INTERPOLATION_ON, PRESETS};
use std::fmt;
use std::str::FromStr;

/// Preset selected for a new session
pub const SESSION_DEFAULT: QualityPreset = QualityPreset::Economical;

/// Preset returned for ids the registry does not know
pub const UNKNOWN_ID_FALLBACK: QualityPreset = QualityPreset::Balanced;

/// Named quality/performance tradeoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityPreset {
    /// `low`: laptops and integrated GPUs
    Economical,
    /// `medium`: entry and mid-range GPUs
    Balanced,
    /// `high`: powerful dedicated GPUs
    Ultra,
}

impl QualityPreset {
    /// All presets in registry order
    pub const ALL: [QualityPreset; 3] = [
        QualityPreset::Economical,
        QualityPreset::Balanced,
        QualityPreset::Ultra,
    ];

    /// Stable identifier (`low`, `medium`, `high`)
    pub fn id(&self) -> &'static str {
        self.definition().id
    }

    /// Exact lookup by id (case-insensitive); `None` for unknown ids
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        PRESETS
            .iter()
            .find(|def| def.id.eq_ignore_ascii_case(id))
            .map(|def| def.preset)
    }

    /// Lookup that fails closed to [`UNKNOWN_ID_FALLBACK`]
    pub fn resolve_or_default(id: &str) -> Self {
        Self::from_id(id).unwrap_or(UNKNOWN_ID_FALLBACK)
    }

    /// Static definition for this preset
    pub fn definition(&self) -> &'static PresetDefinition {
        match self {
            QualityPreset::Economical => &PRESETS[0],
            QualityPreset::Balanced => &PRESETS[1],
            QualityPreset::Ultra => &PRESETS[2],
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for QualityPreset {
    type Err = String;

    /// Strict parse; use [`QualityPreset::resolve_or_default`] for the permissive form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("unknown quality mode '{}'", s))
    }
}

/// A single configuration step issued to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Property assignment
    Set {
        key: &'static str,
        value: &'static str,
    },
    /// Empty the shader chain
    ClearShaderChain,
    /// Append a shader stage (path relative to the shader directory)
    ///
    /// When `file` is unavailable and `fallback` is set, the fallback is
    /// appended instead.
    AppendShader {
        file: &'static str,
        fallback: Option<&'static str>,
    },
}

impl Directive {
    pub fn is_shader(&self) -> bool {
        !matches!(self, Directive::Set { .. })
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Set { key, value } => write!(f, "{}={}", key, value),
            Directive::ClearShaderChain => f.write_str("clear shader chain"),
            Directive::AppendShader {
                file,
                fallback: Some(fallback),
            } => write!(f, "append shader {} (fallback {})", file, fallback),
            Directive::AppendShader { file, fallback: None } => {
                write!(f, "append shader {}", file)
            }
        }
    }
}

/// Registry entry
#[derive(Debug, PartialEq)]
pub struct PresetDefinition {
    pub preset: QualityPreset,
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    /// Informational hint only
    pub minimum_gpu: &'static str,
    pub directives: &'static [Directive],
}

impl PresetDefinition {
    /// Shader files this preset may attach (primary and fallback)
    pub fn shader_files(&self) -> Vec<&'static str> {
        self.directives
            .iter()
            .flat_map(|d| match d {
                Directive::AppendShader { file, fallback } => {
                    std::iter::once(*file).chain(*fallback).collect::<Vec<_>>()
                }
                _ => Vec::new(),
            })
            .collect()
    }
}

/// Resolve a preset id, failing closed to Balanced for unknown ids
pub fn resolve(id: &str) -> &'static PresetDefinition {
    QualityPreset::resolve_or_default(id).definition()
}

/// All presets in fixed order: Economical, Balanced, Ultra
pub fn list_all() -> &'static [PresetDefinition] {
    &PRESETS
}

/// Preset suggested when the host has no preference
///
/// GPU detection is not attempted; Balanced is the safe middle ground.
pub fn recommended() -> QualityPreset {
    QualityPreset::Balanced
}

/// Directives to apply a preset: clear the chain, then the preset's table
pub fn application_plan(preset: QualityPreset) -> Vec<Directive> {
    std::iter::once(Directive::ClearShaderChain)
        .chain(preset.definition().directives.iter().copied())
        .collect()
}

/// Directives to attach the anime overlay: clear the chain, then the stages
pub fn overlay_plan() -> Vec<Directive> {
    std::iter::once(Directive::ClearShaderChain)
        .chain(ANIME_OVERLAY.iter().copied())
        .collect()
}

/// Directives toggling motion interpolation
pub fn interpolation_plan(enabled: bool) -> &'static [Directive] {
    if enabled {
        INTERPOLATION_ON
    } else {
        INTERPOLATION_OFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_ids() {
        assert_eq!(resolve("low").preset, QualityPreset::Economical);
        assert_eq!(resolve("medium").preset, QualityPreset::Balanced);
        assert_eq!(resolve("high").preset, QualityPreset::Ultra);
        assert_eq!(resolve("HIGH").preset, QualityPreset::Ultra);
    }

    #[test]
    fn test_unknown_id_falls_back_to_balanced() {
        assert_eq!(resolve("potato").preset, QualityPreset::Balanced);
        assert_eq!(resolve("").preset, QualityPreset::Balanced);
        assert_eq!(QualityPreset::from_id("potato"), None);
        assert!("potato".parse::<QualityPreset>().is_err());
    }

    #[test]
    fn test_definitions_are_deterministic_and_non_empty() {
        for preset in QualityPreset::ALL {
            let first = resolve(preset.id());
            let second = resolve(preset.id());
            assert!(!first.directives.is_empty(), "{} has no directives", preset);
            assert_eq!(first, second);
            assert!(std::ptr::eq(first, second));
            assert_eq!(application_plan(preset), application_plan(preset));
        }
    }

    #[test]
    fn test_list_order() {
        let ids: Vec<_> = list_all().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["low", "medium", "high"]);
        for (def, preset) in list_all().iter().zip(QualityPreset::ALL) {
            assert_eq!(def.preset, preset);
            assert_eq!(preset.definition(), def);
        }
    }

    #[test]
    fn test_every_plan_starts_with_clear() {
        for preset in QualityPreset::ALL {
            assert_eq!(application_plan(preset)[0], Directive::ClearShaderChain);
        }
        assert_eq!(overlay_plan()[0], Directive::ClearShaderChain);
        assert_eq!(overlay_plan().len(), 7);
    }

    #[test]
    fn test_backend_chosen_before_shaders() {
        for preset in QualityPreset::ALL {
            let directives = preset.definition().directives;
            let first_shader = directives.iter().position(|d| d.is_shader());
            let vo = directives
                .iter()
                .position(|d| matches!(d, Directive::Set { key: "vo", .. }));
            if let (Some(shader), Some(vo)) = (first_shader, vo) {
                assert!(vo < shader, "{}: vo must precede shaders", preset);
            }
        }
    }

    #[test]
    fn test_ultra_shader_chain() {
        let files = QualityPreset::Ultra.definition().shader_files();
        assert_eq!(
            files,
            vec![
                "FSRCNNX_x2_16-0-4-1.glsl",
                "Anime4K_Upscale_CNN_x2_VL.glsl",
                "CAS.glsl"
            ]
        );
        assert!(QualityPreset::Economical.definition().shader_files().is_empty());
        assert_eq!(QualityPreset::Balanced.definition().shader_files(), vec!["FSR.glsl"]);
    }

    #[test]
    fn test_recommended_and_defaults() {
        assert_eq!(recommended(), QualityPreset::Balanced);
        assert_eq!(SESSION_DEFAULT, QualityPreset::Economical);
        assert_eq!(QualityPreset::Ultra.to_string(), "high");
    }

    #[test]
    fn test_directive_display() {
        let set = Directive::Set { key: "hwdec", value: "auto-copy" };
        assert_eq!(set.to_string(), "hwdec=auto-copy");
        assert!(interpolation_plan(true).contains(&Directive::Set {
            key: "interpolation",
            value: "yes"
        }));
    }
}
