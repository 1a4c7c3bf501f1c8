use crate::build_plan::Jobs;
use crate::domain::{RubyVersion, Stack};
use crate::error::{BuilderError, Result};
use crate::inventory::{DEFAULT_BASE_URL, INVENTORY_FILE_NAME};
use crate::layout::{ArtifactLayout, DEFAULT_ARCH_SEGMENTED_STACKS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "ruby-builder.toml";

/// Optional file configuration for ruby-builder.
///
/// Everything here has a built-in default; the file only refines it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub inventory: InventoryConfig,
}

/// Settings for the compile step.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct BuildConfig {
    /// `make -j` value used when `JOBS` is not set
    #[serde(default)]
    pub jobs: Option<u32>,
}

fn default_arch_segmented_stacks() -> Vec<String> {
    DEFAULT_ARCH_SEGMENTED_STACKS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Settings for the output directory layout.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Stacks whose artifacts get an architecture directory
    #[serde(default = "default_arch_segmented_stacks")]
    pub arch_segmented_stacks: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            arch_segmented_stacks: default_arch_segmented_stacks(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Settings for the artifact manifest.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InventoryConfig {
    /// Prefix of the URLs recorded in the inventory
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Defaults to `ruby_inventory.toml` in the output directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        InventoryConfig {
            base_url: default_base_url(),
            path: None,
        }
    }
}

impl InventoryConfig {
    pub fn inventory_path(&self, output_dir: &Path) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| output_dir.join(INVENTORY_FILE_NAME))
    }
}

impl Config {
    pub fn artifact_layout(&self) -> ArtifactLayout {
        ArtifactLayout::with_arch_segmented_stacks(self.layout.arch_segmented_stacks.iter().cloned())
    }

    /// `JOBS` from the environment wins, then the file, then the nproc probe
    pub fn resolve_jobs(&self, env_jobs: Option<&str>) -> Result<Jobs> {
        if let Some(value) = env_jobs {
            return Jobs::parse(value);
        }
        if let Some(jobs) = self.build.jobs {
            return Jobs::new(jobs);
        }
        Ok(Jobs::detect())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `ruby-builder.toml` in current directory
/// 3. `ruby-builder.toml` in user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        read(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        read(Path::new(CONFIG_FILE_NAME))?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            read(&config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    toml::from_str(&config_str).map_err(|e| BuilderError::config(e.to_string()))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| BuilderError::config(format!("cannot read {}: {}", path.display(), e)))
}

/// Inputs the build takes from the environment
#[derive(Debug, Clone)]
pub struct BuildEnv {
    pub version: RubyVersion,
    pub stack: Stack,
    pub jobs: Option<String>,
}

impl BuildEnv {
    /// Read `VERSION`, `STACK` and `JOBS` from the process environment
    pub fn from_env() -> Result<Self> {
        BuildEnv::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BuildEnv::from_env`] with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let version = require(&lookup, "VERSION")?;
        let stack = require(&lookup, "STACK")?;
        let jobs = lookup("JOBS")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(BuildEnv {
            version: RubyVersion::new(version)?,
            stack: Stack::new(stack)?,
            jobs,
        })
    }
}

/// Read `VERSION` alone, for commands that do not build
pub fn version_from_env() -> Result<RubyVersion> {
    let lookup = |key: &str| std::env::var(key).ok();
    RubyVersion::new(require(&lookup, "VERSION")?)
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BuilderError::MissingEnv(key.to_string()))
}
