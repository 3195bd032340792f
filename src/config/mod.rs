//! Site configuration management for `kiln.toml`.
//!
//! The file is optional: every value has a default, and command-line flags
//! override whatever the file sets.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[build]`   | Input, output and templates directories          |
//! | `[serve]`   | Development server and change watcher settings   |
//!
//! # Example
//!
//! ```toml
//! [build]
//! input = "content"
//! output = "public"
//! templates = "templates"
//!
//! [serve]
//! host = "127.0.0.1"
//! port = 8000
//! ```
//!
//! Relative paths in the file resolve against the file's directory; relative
//! paths given on the command line resolve against the working directory.

mod build;
pub mod defaults;
mod error;
mod serve;

// Re-export public types used by other modules
pub use serve::WatcherKind;

// Internal imports used in this module
use build::BuildConfig;
use error::ConfigError;
use serve::ServeConfig;

use crate::{cli::Cli, utils::path::normalize_path};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file, if one was loaded
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Site directories
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;

        let base = path.parent().unwrap_or(Path::new("./"));
        config.resolve_relative_to(base);
        config.config_path = Some(normalize_path(path));
        Ok(config)
    }

    /// Build the effective configuration: file (if any), then CLI overrides,
    /// then path normalization and validation.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) if !path.exists() => bail!(ConfigError::NotFound(path.clone())),
            Some(path) => Self::from_path(path)?,
            None if Path::new(defaults::CONFIG_FILE).exists() => {
                Self::from_path(Path::new(defaults::CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.update_with_cli(cli);
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    /// Tick of the change watcher, also the rebuild debounce window
    pub const fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.serve.interval_ms)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.build.input, cli.input.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        Self::update_option(&mut self.build.templates, cli.templates.as_ref());
        Self::update_option(&mut self.serve.host, cli.host.as_ref());
        Self::update_option(&mut self.serve.port, cli.port.as_ref());
        Self::update_option(&mut self.serve.watcher, cli.watcher.as_ref());
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Anchor relative directories at `base` (the config file's directory)
    fn resolve_relative_to(&mut self, base: &Path) {
        for dir in self.dirs_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Make all directories absolute
    fn normalize_paths(&mut self) {
        for dir in self.dirs_mut() {
            *dir = normalize_path(&*dir);
        }
    }

    fn dirs_mut(&mut self) -> [&mut PathBuf; 3] {
        [
            &mut self.build.input,
            &mut self.build.output,
            &mut self.build.templates,
        ]
    }

    /// Validate configuration.
    ///
    /// Directory existence is not checked here: a build reports missing
    /// directories itself, and serve mode keeps running until they appear.
    pub fn validate(&self) -> Result<()> {
        if self.serve.host.trim().is_empty() {
            bail!(ConfigError::Validation("[serve.host] must not be empty".into()));
        }

        if self.serve.interval_ms == 0 {
            bail!(ConfigError::Validation(
                "[serve.interval_ms] must be greater than zero".into()
            ));
        }

        if self.build.default_template.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[build.default_template] must not be empty".into()
            ));
        }

        // The output root is wiped on every build.
        let output = &self.build.output;
        for (name, dir) in [("input", &self.build.input), ("templates", &self.build.templates)] {
            if output.starts_with(dir) || dir.starts_with(output) {
                bail!(ConfigError::Validation(format!(
                    "output directory `{}` overlaps the {name} directory `{}`",
                    output.display(),
                    dir.display()
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
