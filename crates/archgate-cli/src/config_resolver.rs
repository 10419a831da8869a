//! Configuration loading for CLI commands.
//!
//! [`ResolvedConfig::load`] finds the config file, parses it, and anchors
//! every relative path it names at the project directory. The file is taken
//! from, in order:
//!
//! 1. `--config`
//! 2. the project directory ([`PROJECT_CONFIG_NAMES`])
//! 3. `config.toml` in the global directory (`$ARCHGATE_CONFIG_DIR` or `~/.archgate/`)
//!
//! and defaults apply when none exists.

use anyhow::{bail, Context, Result};
use archgate_core::{Config, PROJECT_CONFIG_NAMES};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// Nothing found; defaults apply.
    Default,
}

impl ConfigSource {
    /// The config file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    fn locate(project_dir: &Path, explicit: Option<&Path>, global_dir: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::Explicit(path.to_path_buf());
        }
        if let Some(path) = Config::find_in(project_dir) {
            return Self::Project(path);
        }
        global_dir
            .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
            .filter(|path| path.is_file())
            .map_or(Self::Default, Self::Global)
    }
}

/// A loaded configuration plus the directory its relative paths resolve
/// against.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Where the configuration came from.
    pub source: ConfigSource,
    /// The parsed configuration.
    pub config: Config,
    project_dir: PathBuf,
}

impl ResolvedConfig {
    /// Locates and parses the configuration for `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(project_dir, explicit, global_config_dir().as_deref())
    }

    fn load_with(
        project_dir: &Path,
        explicit: Option<&Path>,
        global_dir: Option<&Path>,
    ) -> Result<Self> {
        let source = ConfigSource::locate(project_dir, explicit, global_dir);
        let config = match source.path() {
            Some(path) => {
                info!("Using config: {}", path.display());
                Config::from_file(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?
            }
            None => {
                debug!("No config found, using defaults");
                Config::default()
            }
        };
        Ok(Self {
            source,
            config,
            project_dir: project_dir.to_path_buf(),
        })
    }

    /// Anchors `path` at the project directory unless it is absolute.
    #[must_use]
    pub fn in_project(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    /// Snapshot from `flag`, then `[analyzer] snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither names a snapshot.
    pub fn snapshot_path(&self, flag: Option<&Path>) -> Result<PathBuf> {
        match flag.or(self.config.analyzer.snapshot.as_deref()) {
            Some(path) => Ok(self.in_project(path)),
            None => bail!(
                "No symbol snapshot given. Pass --snapshot or set `snapshot` under [analyzer] in archgate.toml."
            ),
        }
    }

    /// Report output directory from `flag`, then `[report] output_dir`.
    #[must_use]
    pub fn output_dir(&self, flag: Option<&Path>) -> PathBuf {
        self.in_project(flag.unwrap_or(&self.config.report.output_dir))
    }
}

/// Returns the global config directory: `$ARCHGATE_CONFIG_DIR`, else
/// `~/.archgate/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ARCHGATE_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".archgate"))
}
