//! Configuration management for the Indigo MCP bridge
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Command line flags are applied last by the binary.

use crate::error::{IndigoError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs, time::Duration};

/// Default Indigo log directory on macOS installations
pub const DEFAULT_LOG_DIRECTORY: &str =
    "/Library/Application Support/Perceptive Automation/Indigo 2024.2/Logs";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Host process configuration
    pub host: HostConfig,

    /// Indigo log file location
    pub logs: LogsConfig,

    /// Tool behaviour
    pub tools: ToolConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// MCP server identification
    pub mcp: McpConfig,
}

/// How the Indigo host process is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Host executable (looked up on PATH when not absolute)
    pub executable: String,

    /// Flag that precedes the script text
    pub exec_flag: String,

    /// Extra arguments placed before the exec flag
    pub extra_args: Vec<String>,

    /// Upper bound on a single host invocation
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Indigo log file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Directory holding `<date> Events.log` files
    pub directory: PathBuf,
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Reject power states other than "on"/"off" instead of treating them as "off"
    pub strict_power_state: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable structured JSON logging
    pub json_format: bool,

    /// Log to file (path)
    pub file: Option<PathBuf>,
}

/// MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Server name for MCP identification
    pub name: String,

    /// Server version
    pub version: String,

    /// Instructions advertised during initialization
    pub instructions: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            executable: "indigo-host".to_string(),
            exec_flag: "-e".to_string(),
            extra_args: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            strict_power_state: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file: None,
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            name: "IndigoAssistant".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: "This server provides an interface to the Indigo Home Automation Server."
                .to_string(),
        }
    }
}

impl ServerConfig {
    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("indigo-mcp").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            IndigoError::config(format!("Failed to read {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| IndigoError::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Load configuration: explicit file, else the default file if present,
    /// then environment overrides
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(executable) = env::var("INDIGO_HOST_EXECUTABLE") {
            self.host.executable = executable;
        }

        if let Ok(timeout) = env::var("INDIGO_HOST_TIMEOUT") {
            self.host.timeout = Duration::from_secs(
                timeout
                    .parse()
                    .map_err(|e| IndigoError::config(format!("Invalid INDIGO_HOST_TIMEOUT: {e}")))?,
            );
        }

        if let Ok(dir) = env::var("INDIGO_LOG_DIR") {
            self.logs.directory = PathBuf::from(dir);
        }

        if let Ok(strict) = env::var("INDIGO_STRICT_POWER_STATE") {
            self.tools.strict_power_state = match strict.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(IndigoError::config(format!(
                        "Invalid INDIGO_STRICT_POWER_STATE: {strict}. Use 'true' or 'false'"
                    )))
                }
            };
        }

        if let Ok(level) = env::var("RUST_LOG") {
            self.logging.level = level;
        }

        if let Ok(file) = env::var("INDIGO_MCP_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.executable.trim().is_empty() {
            return Err(IndigoError::config("Host executable must not be empty"));
        }

        if self.host.timeout.is_zero() {
            return Err(IndigoError::config("Host timeout must be greater than zero"));
        }

        if !self.logs.directory.is_absolute() {
            return Err(IndigoError::config(format!(
                "Log directory must be an absolute path, got {}",
                self.logs.directory.display()
            )));
        }

        Ok(())
    }
}
