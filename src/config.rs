use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};

use crate::core::catalog::{ExerciseCatalog, ProductCatalog};

pub const DATA_DIR_ENV: &str = "GLOWUP_DATA_DIR";

const CONFIG_FILE: &str = "config.json";
const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercises_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_path: Option<PathBuf>,
    #[serde(default = "default_notifications")]
    pub notifications: bool,
    /// Set when config.json could not be used. Logging is not up yet while
    /// the config loads, so the caller reports it.
    #[serde(skip)]
    pub load_warning: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_notifications() -> bool {
    true
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        Self::new_with(data_dir, |k| std::env::var(k).ok())
    }

    /// Like `new`, with environment lookups going through `get`.
    pub fn new_with<F>(data_dir: Option<PathBuf>, get: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let data_dir = data_dir
            .or_else(|| get(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("glowup")
            });

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config_path = data_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .context("Failed to read config.json")?;

            match serde_json::from_str::<Config>(&config_str) {
                Ok(mut config) => {
                    config.data_dir = data_dir;
                    return Ok(config);
                }
                Err(e) => {
                    // Leave the broken file for the user to fix.
                    let mut config = Self::defaults(data_dir);
                    config.load_warning = Some(format!(
                        "{} is invalid, using defaults: {}",
                        config_path.display(),
                        e
                    ));
                    return Ok(config);
                }
            }
        }

        let config = Self::defaults(data_dir);
        config.save()?;
        Ok(config)
    }

    fn defaults(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            log_level: default_log_level(),
            exercises_path: None,
            products_path: None,
            notifications: default_notifications(),
            load_warning: None,
        }
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(self.config_file(), content)
            .context("Failed to write config.json")?;
        Ok(())
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn storage_file(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }

    /// Bundled exercises unless `exercises_path` points elsewhere.
    pub fn exercises(&self) -> Result<ExerciseCatalog> {
        match &self.exercises_path {
            Some(path) => load_override(path, ExerciseCatalog::load),
            None => ExerciseCatalog::bundled().context("Bundled exercise catalog is invalid"),
        }
    }

    pub fn products(&self) -> Result<ProductCatalog> {
        match &self.products_path {
            Some(path) => load_override(path, ProductCatalog::load),
            None => ProductCatalog::bundled().context("Bundled product catalog is invalid"),
        }
    }
}

fn load_override<T, F>(path: &Path, load: F) -> Result<T>
where
    F: FnOnce(&Path) -> crate::core::Result<T>,
{
    load(path).with_context(|| format!("Failed to load catalog from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::new_with(Some(dir.path().to_path_buf()), |_| None).unwrap();

        assert_eq!(config.log_level, "warn");
        assert!(config.notifications);
        assert!(config.load_warning.is_none());
        assert!(config.config_file().exists());
        assert_eq!(config.storage_file(), dir.path().join("storage.json"));
    }

    #[test]
    fn test_env_data_dir() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("from-env");
        let env_value = target.to_string_lossy().to_string();

        let config = Config::new_with(None, |k| {
            if k == DATA_DIR_ENV {
                Some(env_value.clone())
            } else {
                None
            }
        })
        .unwrap();
        assert_eq!(config.data_dir, target);
        assert!(target.join("config.json").exists());
    }

    #[test]
    fn test_explicit_dir_wins_over_env() {
        let dir = TempDir::new().unwrap();
        let config = Config::new_with(Some(dir.path().to_path_buf()), |_| Some("/nonexistent/elsewhere".to_string())).unwrap();
        assert_eq!(config.data_dir, dir.path());
    }

    #[test]
    fn test_loads_saved_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::new_with(Some(dir.path().to_path_buf()), |_| None).unwrap();
        config.log_level = "debug".to_string();
        config.notifications = false;
        config.save().unwrap();

        let reloaded = Config::new_with(Some(dir.path().to_path_buf()), |_| None).unwrap();
        assert_eq!(reloaded.log_level, "debug");
        assert!(!reloaded.notifications);
    }

    #[test]
    fn test_invalid_config_is_left_alone() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

        let config = Config::new_with(Some(dir.path().to_path_buf()), |_| None).unwrap();
        assert_eq!(config.log_level, "warn");
        assert!(config.load_warning.as_deref().is_some_and(|w| w.contains("config.json")));
        assert_eq!(std::fs::read_to_string(dir.path().join("config.json")).unwrap(), "{ not json");
    }

    #[test]
    fn test_catalog_override() {
        let dir = TempDir::new().unwrap();
        let products = dir.path().join("products.json");
        std::fs::write(
            &products,
            r#"[{"id":1,"name":"Test Balm","brand":"Acme","category":"Balm","price":5.0,"rating":4.0,"skinType":["Dry"],"imageUrl":"","shopUrl":""}]"#,
        )
        .unwrap();

        let mut config = Config::new_with(Some(dir.path().to_path_buf()), |_| None).unwrap();
        config.products_path = Some(products);
        let catalog = config.products().unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(config.exercises().unwrap().len() > 1);

        config.exercises_path = Some(dir.path().join("missing.json"));
        assert!(config.exercises().is_err());
    }
}
