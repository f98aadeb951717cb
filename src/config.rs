//! Configuration management for the schema compiler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemac.toml)
//! - Environment variables (SCHEMAC__*)
//!
//! ## Example config file (schemac.toml):
//! ```toml
//! [output]
//! dir = "generated"
//! targets = ["typescript", "zod"]
//!
//! [typescript]
//! branded_primitives = true
//!
//! [typescript.format_mappings]
//! date-time = "Date"
//!
//! [zod.format_mappings]
//! hostname = "z.string().regex(/^[a-z0-9.-]+$/)"
//!
//! [go]
//! package = "models"
//! optional_style = "opt"
//!
//! [diagnostics]
//! deny_warnings = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codegen::{GoOptions, TypeScriptOptions, ZodOptions};

/// Main configuration for the compiler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Structural TypeScript backend
    #[serde(default)]
    pub typescript: TypeScriptOptions,

    /// Validated Zod backend
    #[serde(default)]
    pub zod: ZodOptions,

    /// Structural Go backend
    #[serde(default)]
    pub go: GoOptions,

    /// Diagnostics policy
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root of the artifact tree (`<dir>/<target>/<file>`)
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Targets built when none are given on the command line
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

/// Diagnostics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Treat any warning as a failed build
    #[serde(default)]
    pub deny_warnings: bool,
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_targets() -> Vec<String> {
    vec!["typescript".to_string(), "zod".to_string()]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            targets: default_targets(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["schemac.toml", ".schemac.toml", "config/schemac.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schemac", "schemac") {
            let xdg_config = config_dir.config_dir().join("schemac.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // Load from environment variables (SCHEMAC__SECTION__KEY)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAC")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let loaded: Self = config.try_deserialize()?;
        tracing::debug!(targets = ?loaded.output.targets, "loaded configuration");
        Ok(loaded)
    }

    /// Load a single file with no other layers
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the output directory (resolves relative paths)
    pub fn output_dir(&self) -> PathBuf {
        if self.output.dir.is_absolute() {
            self.output.dir.clone()
        } else {
            std::env::current_dir().unwrap_or_default().join(&self.output.dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.output.targets, vec!["typescript", "zod"]);
        assert_eq!(config.output.dir, PathBuf::from("generated"));
        assert!(!config.diagnostics.deny_warnings);
        assert_eq!(config.typescript.filename, "types.ts");
    }

    #[test]
    fn test_serialize_config() {
        let config = CompilerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[typescript]"));
        assert!(toml_str.contains("[zod]"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemac.toml");

        let mut config = CompilerConfig::default();
        config.output.targets = vec!["zod".to_string()];
        config.typescript.branded_primitives = true;
        config.zod.format_mappings.insert("hostname".to_string(), "z.string()".to_string());
        config.diagnostics.deny_warnings = true;
        config.save(&path).unwrap();

        let loaded = CompilerConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[zod]\nfilename = \"validators.ts\"\n").unwrap();

        let loaded = CompilerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.zod.filename, "validators.ts");
        assert!(loaded.zod.export_types);
        assert_eq!(loaded.output, OutputConfig::default());
    }
}
