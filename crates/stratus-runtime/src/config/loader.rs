//! Configuration loader using figment.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`stratus.{profile}.toml` / `.yaml`)
//! 3. Main config file (`stratus.toml` / `stratus.yaml`)
//! 4. Environment variables (`STRATUS_*`, `__` as section separator)
//! 5. Programmatic overrides via [`ConfigLoader::merge`]
//!
//! Which file formats are searched is controlled by the `toml-config`
//! (default) and `yaml-config` features. Environment variables map as
//! `STRATUS_LOGGING__LEVEL=debug` → `logging.level = "debug"`; the active
//! profile comes from `STRATUS_PROFILE` and defaults to `development`.

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, warn};

use super::schema::StratusConfig;
use crate::error::{ConfigError, ConfigResult};

#[cfg(feature = "toml-config")]
const TOML_NAMES: &[&str] = &["stratus.toml", "config.toml"];
#[cfg(feature = "yaml-config")]
const YAML_NAMES: &[&str] = &["stratus.yaml", "stratus.yml"];

/// Multi-source configuration loader.
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigLoader::new()
///     .search_path("./deploy")
///     .load()?;
/// ```
pub struct ConfigLoader {
    overrides: Figment,
    profile: String,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader with the profile taken from `STRATUS_PROFILE`.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: std::env::var("STRATUS_PROFILE")
                .unwrap_or_else(|_| "development".to_string()),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Adds a directory to search for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads a specific configuration file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables the `STRATUS_*` environment layer.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges programmatic overrides on top of every other source.
    pub fn merge(mut self, config: StratusConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads and extracts the configuration.
    pub fn load(self) -> ConfigResult<StratusConfig> {
        let mut figment = Figment::from(Serialized::defaults(StratusConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "loading configuration file");
            figment = merge_file(figment, path)?;
        } else {
            figment = self.search_files(figment);
        }

        if self.load_env {
            figment = figment.merge(
                Env::prefixed("STRATUS_")
                    .split("__")
                    .map(|key| key.as_str().replace("__", ".").into()),
            );
        }

        figment = figment.merge(self.overrides);

        let config: StratusConfig = figment
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        debug!(
            profile = %self.profile,
            plugins = config.plugins.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Effective search paths: explicit ones, or CWD plus the user config dir.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("stratus"));
        }
        paths
    }

    /// Searches for config files; a profile-specific variant is merged before
    /// its base file so the base file wins where both define a key.
    fn search_files(&self, mut figment: Figment) -> Figment {
        let mut found = false;
        for dir in self.resolve_search_paths() {
            for base_name in enabled_file_names() {
                let (stem, ext) = base_name
                    .rsplit_once('.')
                    .expect("config file names contain an extension");

                let profile_path = dir.join(format!("{stem}.{}.{ext}", self.profile));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "loading profile-specific config");
                    figment = merge_known_file(figment, &profile_path);
                    found = true;
                }

                let base_path = dir.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "loading configuration file");
                    return merge_known_file(figment, &base_path);
                }
            }
        }
        if !found {
            warn!("no configuration file found, using defaults");
        }
        figment
    }
}

/// File names searched for, per enabled format feature.
fn enabled_file_names() -> impl Iterator<Item = &'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    #[cfg(feature = "toml-config")]
    names.extend_from_slice(TOML_NAMES);
    #[cfg(feature = "yaml-config")]
    names.extend_from_slice(YAML_NAMES);
    names.into_iter()
}

/// Merges a file whose extension has already been validated by the search.
fn merge_known_file(figment: Figment, path: &Path) -> Figment {
    match merge_file(figment.clone(), path) {
        Ok(merged) => merged,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping config file");
            figment
        }
    }
}

/// Merges a single config file, dispatching on extension.
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::Parse(format!(
            "unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogLevel, LogOutput};

    #[test]
    fn defaults_load_without_any_file() {
        let config = ConfigLoader::new()
            .without_env()
            .search_path("/nonexistent")
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.output, LogOutput::Stderr);
        assert!(config.plugins.is_empty());
        assert!(config.project.is_object());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = ConfigLoader::new()
            .without_env()
            .file("/nonexistent/stratus.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn base_file_wins_over_profile_file() {
        let dir = std::env::temp_dir().join(format!("stratus-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("stratus.staging.toml"),
            "plugins = [\"profile-only\"]\n\n[engine]\nhook_timeout_ms = 750\n",
        )
        .unwrap();
        std::fs::write(dir.join("stratus.toml"), "plugins = [\"base\"]\n").unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .profile("staging")
            .search_path(&dir)
            .load()
            .unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        // Where both files define a key, the base file wins; keys only the
        // profile file defines survive the merge.
        assert_eq!(config.plugins, ["base"]);
        assert_eq!(config.engine.hook_timeout_ms, Some(750));
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = ConfigLoader::new()
            .without_env()
            .search_path("/nonexistent")
            .merge(StratusConfig {
                plugins: vec!["iam".to_string()],
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(config.plugins, ["iam"]);
    }
}
