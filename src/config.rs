//! Configuration management
//!
//! Settings come from an optional `aqua.toml`; command-line flags override them.

use crate::types::{AquaError, MAX_EXECUTION_STEPS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE: &str = "aqua.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub machine: MachineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Compiler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Additional directory searched for compiled modules
    pub search_path: Option<PathBuf>,

    /// 0 = quiet, 1 = normal, 2 = verbose, 3 = every rule
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,
}

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Initial tape contents when none are given
    #[serde(default = "default_tape")]
    pub tape: String,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); overrides the verbosity mapping
    pub level: Option<String>,
}

fn default_verbosity() -> u8 {
    1
}

fn default_max_steps() -> usize {
    MAX_EXECUTION_STEPS
}

fn default_tape() -> String {
    "0".to_string()
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            tape: default_tape(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            search_path: None,
            verbosity: default_verbosity(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, AquaError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AquaError::FileError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            AquaError::FileError(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Load `aqua.toml` from the current directory, or the defaults if there is none.
    pub fn load() -> Result<Self, AquaError> {
        let path = PathBuf::from(CONFIG_FILE);
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            return Self::from_file(&path);
        }

        Ok(Config::default())
    }

    /// The log filter for the configured verbosity, unless a level is set explicitly.
    pub fn log_level(&self) -> &str {
        if let Some(level) = &self.logging.level {
            return level;
        }

        match self.compiler.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
