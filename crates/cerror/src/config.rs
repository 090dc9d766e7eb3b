//! Stack-capture configuration.
//!
//! Library defaults with runtime environment overrides, read once on first
//! use. Call [`init`] before constructing any error to configure in code
//! instead.
//!
//! # Environment Variables
//!
//! - `CERROR_STACK=0` - skip stack walking; stacks hold only the origin frame
//! - `CERROR_STACK_DEPTH=<n>` - maximum frames kept per stack (default 32)
//!
//! # Example
//!
//! ```rust,ignore
//! use cerror::config::{self, Config};
//!
//! config::init(Config::from_env().max_frames(8))?;
//! ```

use std::str::FromStr;
use std::sync::OnceLock;

use thiserror::Error;

pub const ENV_STACK: &str = "CERROR_STACK";
pub const ENV_STACK_DEPTH: &str = "CERROR_STACK_DEPTH";

/// Frames kept per stack unless configured otherwise.
pub const DEFAULT_MAX_FRAMES: usize = 32;

/// Capture configuration with builder pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Walk the call stack on capture. When false, a stack is just the
    /// frame of the constructing call.
    pub capture_stack: bool,
    /// Upper bound on frames kept per stack. Never below 1.
    pub max_frames: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture_stack: true,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

impl Config {
    /// Library defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self::default()
            .capture_stack(env_get_bool(ENV_STACK, defaults.capture_stack))
            .max_frames(env_get(ENV_STACK_DEPTH, defaults.max_frames))
    }

    /// Enable or disable stack walking
    pub fn capture_stack(mut self, enable: bool) -> Self {
        self.capture_stack = enable;
        self
    }

    /// Set maximum frames per stack (clamped to at least 1)
    pub fn max_frames(mut self, n: usize) -> Self {
        self.max_frames = n.max(1);
        self
    }
}

/// Failure to install process-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("configuration already initialized")]
    AlreadyInitialized,
    #[error("stack capturer already installed")]
    CapturerInstalled,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Install `config` for the rest of the process.
///
/// Fails if a configuration is already in effect, whether set by an earlier
/// `init` or loaded from the environment by a prior capture.
pub fn init(config: Config) -> Result<(), InstallError> {
    CONFIG
        .set(config)
        .map_err(|_| InstallError::AlreadyInitialized)?;
    tracing::debug!(?config, "cerror configuration installed");
    Ok(())
}

/// The configuration in effect, loading it from the environment on first
/// call.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(|| {
        let config = Config::from_env();
        tracing::debug!(?config, "cerror configuration loaded from environment");
        config
    })
}

/// Environment variable parsed as `T`, or `default` when unset or invalid.
fn env_get<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Environment variable as a boolean: "1", "true", "yes", "on" are true,
/// any other set value is false, unset is `default`.
fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
