//! Engine defaults applied once when a player is created
//!
//! Keyboard and on-screen controls, frame sync, audio, window, OSD and
//! subtitle styling, screenshots and streaming cache. Presets override the
//! scaling/debanding subset later.

use crate::presets::Directive;
use Directive::Set;

pub(super) const BASE_DIRECTIVES: &[Directive] = &[
    // Keyboard controls
    Set { key: "input-default-bindings", value: "yes" },
    Set { key: "input-vo-keyboard", value: "yes" },
    // On-screen controller (needs an engine built with Lua)
    Set { key: "osc", value: "yes" },
    Set { key: "load-scripts", value: "yes" },
    Set {
        key: "script-opts",
        value: "osc-layout=bottombar,osc-seekbarstyle=bar,osc-deadzonesize=0.5,osc-minmousemove=0,osc-hidetimeout=2000,osc-fadeduration=250,osc-showwindowed=yes,osc-showfullscreen=yes,osc-boxalpha=80",
    },
    Set { key: "hwdec", value: "auto-safe" },
    // Frame sync
    Set { key: "video-sync", value: "display-resample" },
    Set { key: "interpolation", value: "yes" },
    Set { key: "tscale", value: "oversample" },
    Set { key: "framedrop", value: "no" },
    Set { key: "opengl-swapinterval", value: "1" },
    // Audio; playback gain may exceed the stored 0-100 range
    Set { key: "audio-pitch-correction", value: "yes" },
    Set { key: "audio-normalize-downmix", value: "yes" },
    Set { key: "volume-max", value: "150" },
    // Window
    Set { key: "keep-open", value: "yes" },
    Set { key: "force-window", value: "immediate" },
    Set { key: "border", value: "no" },
    Set { key: "window-maximized", value: "yes" },
    Set { key: "background", value: "#000000" },
    // OSD
    Set { key: "osd-font", value: "Segoe UI" },
    Set { key: "osd-font-size", value: "36" },
    Set { key: "osd-bold", value: "yes" },
    Set { key: "osd-color", value: "#FFFFFFFF" },
    Set { key: "osd-border-color", value: "#FF6B9DFF" },
    Set { key: "osd-border-size", value: "2.5" },
    Set { key: "osd-shadow-color", value: "#80000000" },
    Set { key: "osd-shadow-offset", value: "2" },
    Set { key: "osd-back-color", value: "#60000000" },
    Set { key: "osd-level", value: "1" },
    Set { key: "osd-duration", value: "2500" },
    Set { key: "osd-bar", value: "yes" },
    Set { key: "osd-bar-align-y", value: "0.95" },
    Set { key: "osd-bar-h", value: "1.5" },
    Set { key: "osd-bar-w", value: "85" },
    Set { key: "osd-playing-msg", value: "▶ ${media-title}" },
    Set { key: "osd-status-msg", value: "${time-pos} / ${duration}  •  ${percent-pos}%" },
    Set { key: "osd-margin-x", value: "25" },
    Set { key: "osd-margin-y", value: "20" },
    // Subtitles
    Set { key: "sub-auto", value: "fuzzy" },
    Set { key: "sub-file-paths", value: "subs:subtitles:Subs:Subtitles" },
    Set { key: "sub-font", value: "Segoe UI Semibold" },
    Set { key: "sub-font-size", value: "46" },
    Set { key: "sub-color", value: "#FFFFFFFF" },
    Set { key: "sub-border-color", value: "#FF000000" },
    Set { key: "sub-border-size", value: "2.5" },
    Set { key: "sub-shadow-color", value: "#80000000" },
    Set { key: "sub-shadow-offset", value: "1" },
    Set { key: "sub-margin-y", value: "40" },
    Set { key: "sub-blur", value: "0.2" },
    // Screenshots
    Set { key: "screenshot-format", value: "png" },
    Set { key: "screenshot-png-compression", value: "7" },
    Set { key: "screenshot-template", value: "p4k_%F_%P" },
    Set { key: "screenshot-directory", value: "~~desktop/" },
    // Cursor and terminal input
    Set { key: "input-terminal", value: "yes" },
    Set { key: "cursor-autohide", value: "1500" },
    Set { key: "cursor-autohide-fs-only", value: "no" },
    Set { key: "input-cursor", value: "yes" },
    Set { key: "speed", value: "1.0" },
    // Streaming cache
    Set { key: "cache", value: "yes" },
    Set { key: "demuxer-max-bytes", value: "150MiB" },
    Set { key: "demuxer-max-back-bytes", value: "75MiB" },
    Set { key: "demuxer-readahead-secs", value: "60" },
];

#[cfg(target_os = "windows")]
pub(super) const PLATFORM_DIRECTIVES: &[Directive] = &[
    Set { key: "vo", value: "gpu" },
    Set { key: "gpu-context", value: "d3d11" },
];

#[cfg(target_os = "macos")]
pub(super) const PLATFORM_DIRECTIVES: &[Directive] = &[
    Set { key: "vo", value: "gpu" },
    Set { key: "gpu-context", value: "macvk" },
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub(super) const PLATFORM_DIRECTIVES: &[Directive] = &[Set { key: "vo", value: "gpu" }];
