//! Hand-authored preset tables
//!
//! Order inside each table matters: the render backend (`vo`) and profile are
//! set before any shader is attached.

use super::{Directive, PresetDefinition, QualityPreset};

use Directive::{AppendShader, Set};

const ECONOMICAL: &[Directive] = &[
    Set { key: "profile", value: "fast" },
    Set { key: "hwdec", value: "auto-safe" },
    Set { key: "scale", value: "bilinear" },
    Set { key: "cscale", value: "bilinear" },
    Set { key: "dscale", value: "bilinear" },
    Set { key: "deband", value: "no" },
    Set { key: "interpolation", value: "no" },
    Set { key: "dither-depth", value: "no" },
    Set { key: "vo", value: "gpu" },
];

const BALANCED: &[Directive] = &[
    Set { key: "profile", value: "gpu-hq" },
    Set { key: "hwdec", value: "auto-safe" },
    Set { key: "scale", value: "spline36" },
    Set { key: "cscale", value: "spline36" },
    Set { key: "dscale", value: "mitchell" },
    Set { key: "deband", value: "yes" },
    Set { key: "deband-iterations", value: "2" },
    Set { key: "deband-threshold", value: "35" },
    Set { key: "deband-range", value: "20" },
    Set { key: "dither-depth", value: "auto" },
    AppendShader { file: "FSR.glsl", fallback: None },
];

const ULTRA: &[Directive] = &[
    Set { key: "vo", value: "gpu-next" },
    Set { key: "profile", value: "gpu-hq" },
    Set { key: "hwdec", value: "auto-copy" },
    Set { key: "scale", value: "ewa_lanczossharp" },
    Set { key: "cscale", value: "ewa_lanczossharp" },
    Set { key: "dscale", value: "mitchell" },
    Set { key: "deband", value: "yes" },
    Set { key: "deband-iterations", value: "4" },
    Set { key: "deband-threshold", value: "48" },
    Set { key: "deband-range", value: "24" },
    Set { key: "deband-grain", value: "24" },
    Set { key: "dither-depth", value: "auto" },
    Set { key: "temporal-dither", value: "yes" },
    Set { key: "tone-mapping", value: "bt.2446a" },
    Set { key: "tone-mapping-mode", value: "auto" },
    AppendShader {
        file: "FSRCNNX_x2_16-0-4-1.glsl",
        fallback: Some("Anime4K_Upscale_CNN_x2_VL.glsl"),
    },
    // Sharpening
    AppendShader { file: "CAS.glsl", fallback: None },
];

/// Registry order: Economical, Balanced, Ultra
pub(super) static PRESETS: [PresetDefinition; 3] = [
    PresetDefinition {
        preset: QualityPreset::Economical,
        id: "low",
        display_name: "Economical",
        description: "Optimized for battery life and compatibility",
        icon: "🔋",
        minimum_gpu: "Any (Intel HD, AMD APU)",
        directives: ECONOMICAL,
    },
    PresetDefinition {
        preset: QualityPreset::Balanced,
        id: "medium",
        display_name: "Balanced",
        description: "Good quality with FSR upscaling",
        icon: "⚖️",
        minimum_gpu: "GTX 1050 / RX 560 / Intel Iris",
        directives: BALANCED,
    },
    PresetDefinition {
        preset: QualityPreset::Ultra,
        id: "high",
        display_name: "Ultra",
        description: "AI upscaling with a deep neural network",
        icon: "🚀",
        minimum_gpu: "RTX 3060 / RX 6700 or better",
        directives: ULTRA,
    },
];

/// Anime overlay stages, relative to the shader directory, in chain order
pub(super) const ANIME_OVERLAY: &[Directive] = &[
    AppendShader { file: "Anime4K/Anime4K_Clamp_Highlights.glsl", fallback: None },
    AppendShader { file: "Anime4K/Anime4K_Restore_CNN_VL.glsl", fallback: None },
    AppendShader { file: "Anime4K/Anime4K_Upscale_CNN_x2_VL.glsl", fallback: None },
    AppendShader { file: "Anime4K/Anime4K_AutoDownscalePre_x2.glsl", fallback: None },
    AppendShader { file: "Anime4K/Anime4K_AutoDownscalePre_x4.glsl", fallback: None },
    AppendShader { file: "Anime4K/Anime4K_Upscale_CNN_x2_M.glsl", fallback: None },
];

/// Motion interpolation on (synthesizes intermediate frames)
pub(super) const INTERPOLATION_ON: &[Directive] = &[
    Set { key: "interpolation", value: "yes" },
    Set { key: "tscale", value: "oversample" },
    Set { key: "video-sync", value: "display-resample" },
];

/// Motion interpolation off
pub(super) const INTERPOLATION_OFF: &[Directive] = &[
    Set { key: "interpolation", value: "no" },
    Set { key: "video-sync", value: "audio" },
];
