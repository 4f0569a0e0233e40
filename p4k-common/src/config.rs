//! Configuration loading and path resolution
//!
//! Configuration is optional everywhere: a missing or malformed TOML file
//! produces a warning and compiled defaults, never a startup failure.
//!
//! Resolution priority for every path setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the shader directory
pub const SHADER_DIR_ENV: &str = "P4K_SHADER_DIR";

/// Environment variable overriding the mpv executable
pub const MPV_BINARY_ENV: &str = "P4K_MPV";

/// Configuration file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

const APP_DIR_NAME: &str = "p4k";

/// Settings loaded from `config.toml`
///
/// Every field is optional; the CLI and environment take priority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Directory holding the GLSL shader files (`FSR.glsl`, `Anime4K/...`)
    #[serde(default)]
    pub shader_dir: Option<PathBuf>,

    /// mpv executable used by the IPC backend
    #[serde(default)]
    pub mpv_binary: Option<PathBuf>,

    /// Quality mode used when `--mode` is not given (`low`, `medium`, `high`)
    #[serde(default)]
    pub default_mode: Option<String>,

    /// Initial volume
    #[serde(default)]
    pub volume: Option<i64>,

    /// Enable the anime overlay at startup
    #[serde(default)]
    pub anime: bool,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path; console output continues when set
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled-in defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub shader_dir: PathBuf,
    pub mpv_binary: PathBuf,
}

impl CompiledDefaults {
    /// Defaults for the running platform
    ///
    /// Shaders live next to the executable, the way release archives ship them.
    pub fn for_current_platform() -> Self {
        let mpv_binary = if cfg!(target_os = "windows") {
            PathBuf::from("mpv.exe")
        } else {
            PathBuf::from("mpv")
        };

        Self {
            shader_dir: executable_dir().join("shaders"),
            mpv_binary,
        }
    }
}

/// Directory containing the running executable (current directory if unknown)
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Per-user configuration directory (`~/.config/p4k` on Linux)
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME))
}

/// Locate the configuration file for the platform
///
/// Linux checks `~/.config/p4k/config.toml` first, then `/etc/p4k/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = user_config_dir() {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc").join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
    }

    candidates.into_iter().find(|path| path.is_file())
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;

    if let Some(volume) = config.volume {
        if !(0..=150).contains(&volume) {
            return Err(Error::Config(format!(
                "volume {} out of range 0-150 in {}",
                volume,
                path.display()
            )));
        }
    }

    Ok(config)
}

/// Configuration plus the reason defaults were used, if any
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    /// File the configuration was read from
    pub path: Option<PathBuf>,
    /// Why the file was ignored; reported by the caller once logging is up
    pub ignored: Option<Error>,
}

/// Load configuration, falling back to defaults on any problem
///
/// An explicit path that cannot be read or parsed comes back in `ignored`;
/// with no explicit path the platform locations are searched and silence
/// means none.
pub fn load_config_or_default(explicit: Option<&Path>) -> LoadedConfig {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let Some(path) = path else {
        debug!("No configuration file found, using defaults");
        return LoadedConfig {
            config: TomlConfig::default(),
            path: None,
            ignored: None,
        };
    };

    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded configuration from {}", path.display());
            LoadedConfig {
                config,
                path: Some(path),
                ignored: None,
            }
        }
        Err(e) => LoadedConfig {
            config: TomlConfig::default(),
            ignored: Some(Error::Config(format!(
                "ignoring {}: {}",
                path.display(),
                e
            ))),
            path: None,
        },
    }
}

/// Resolve a path setting following the CLI → env → TOML → default order
pub fn resolve_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
    default: PathBuf,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    // Priority 4: Compiled default
    default
}

/// Resolved runtime paths for the player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPaths {
    pub shader_dir: PathBuf,
    pub mpv_binary: PathBuf,
}

impl PlayerPaths {
    /// Resolve shader directory and mpv binary from every configuration source
    pub fn resolve(
        cli_shader_dir: Option<&Path>,
        cli_mpv_binary: Option<&Path>,
        config: &TomlConfig,
    ) -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        Self {
            shader_dir: resolve_path(
                cli_shader_dir,
                SHADER_DIR_ENV,
                config.shader_dir.as_deref(),
                defaults.shader_dir,
            ),
            mpv_binary: resolve_path(
                cli_mpv_binary,
                MPV_BINARY_ENV,
                config.mpv_binary.as_deref(),
                defaults.mpv_binary,
            ),
        }
    }
}

/// Find an optional engine resource (key bindings, OSC script)
///
/// Looks next to the executable first, then in the user config directory.
/// Returns `None` when absent; callers treat absence as normal.
pub fn find_optional_resource(relative: &Path) -> Option<PathBuf> {
    find_optional_resource_in(&search_dirs(), relative)
}

/// Same as [`find_optional_resource`] with an explicit search list
pub fn find_optional_resource_in(dirs: &[PathBuf], relative: &Path) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(relative))
        .find(|candidate| candidate.is_file())
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![executable_dir()];
    if let Some(dir) = user_config_dir() {
        dirs.push(dir);
    }
    dirs
}
