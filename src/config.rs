//! Configuration file handling for spendview.
//!
//! The configuration file is stored at `$SPENDVIEW_HOME/config.json` and holds the table defaults
//! (rows per page and how column headers cycle through sort states) along with the location of the
//! default rows file.

use crate::table::{SortCycle, DEFAULT_PAGE_SIZE};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "spendview";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$SPENDVIEW_HOME` and from there it loads `$SPENDVIEW_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory and an initial `config.json` with default settings.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the home directory, e.g. `$HOME/spendview`
    /// - `rows_path` - Optionally, the rows file that `view` uses when none is given. Relative
    ///   paths are resolved against the home directory.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, rows_path: Option<&Path>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the spendview home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);

        let config_file = ConfigFile {
            rows_path: rows_path.map(Path::to_path_buf),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;
        debug!("Created {}", config_path.display());

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `home` exists and that the config file exists
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The spendview home directory is missing, run 'spendview init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn page_size(&self) -> usize {
        self.config_file.page_size
    }

    pub fn sort_cycle(&self) -> SortCycle {
        self.config_file.sort_cycle
    }

    /// Returns the configured rows file, resolved against the home directory if it is relative.
    pub fn rows_path(&self) -> Option<PathBuf> {
        self.config_file.rows_path.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.root.join(p)
            }
        })
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "spendview",
///   "config_version": 1,
///   "page_size": 10,
///   "sort_cycle": "three_state",
///   "rows_path": "rows.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "spendview"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Rows per page
    #[serde(default = "default_page_size")]
    page_size: usize,

    /// How repeated clicks on a column header move through sort states
    #[serde(default)]
    sort_cycle: SortCycle,

    /// Path to the default rows file (optional, relative to the home directory or absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rows_path: Option<PathBuf>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            page_size: DEFAULT_PAGE_SIZE,
            sort_cycle: SortCycle::default(),
            rows_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it holds invalid settings
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.page_size > 0,
            "Invalid page_size in config file: it must be at least 1"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("spendview_home");

        let created = Config::create(&home, Some(Path::new("rows.json")))
            .await
            .unwrap();
        assert!(created.config_path().is_file());
        assert_eq!(created.page_size(), 10);
        assert_eq!(created.sort_cycle(), SortCycle::ThreeState);

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.root(), created.root());
        assert_eq!(loaded.rows_path(), Some(loaded.root().join("rows.json")));
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path()).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("The config file is missing"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let json = r#"{ "app_name": "spendview", "config_version": 1 }"#;
        utils::write(&path, json).await.unwrap();

        let config = ConfigFile::load(&path).await.unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[tokio::test]
    async fn test_config_file_load_custom_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let json = r#"{
            "app_name": "spendview",
            "config_version": 1,
            "page_size": 25,
            "sort_cycle": "two_state",
            "rows_path": "/data/expenses.csv"
        }"#;
        utils::write(&path, json).await.unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.page_size(), 25);
        assert_eq!(config.sort_cycle(), SortCycle::TwoState);
        assert_eq!(config.rows_path(), Some(PathBuf::from("/data/expenses.csv")));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let json = r#"{ "app_name": "wrong_app", "config_version": 1 }"#;
        utils::write(&path, json).await.unwrap();

        let result = ConfigFile::load(&path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_page_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let json = r#"{ "app_name": "spendview", "config_version": 1, "page_size": 0 }"#;
        utils::write(&path, json).await.unwrap();

        assert!(ConfigFile::load(&path).await.is_err());
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("rows_path"));
        assert!(json.contains("\"sort_cycle\":\"three_state\""));
    }
}
