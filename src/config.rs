use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::extractor::ExtractorConfig;
use crate::provider::chrome::ChromeOptions;

/// Contents of `shelfscrape.toml`; every key is optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShelfConfig {
    pub database: Option<String>,
    pub site_url: Option<String>,
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub headless: Option<bool>,
    pub chrome_path: Option<String>,
    pub max_pages: Option<usize>,
}

impl ShelfConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        let mut config = ExtractorConfig::default();
        if let Some(url) = &self.site_url {
            config.site_url = url.clone();
        }
        if let Some(keyword) = &self.keyword {
            config.keyword = keyword.clone();
        }
        if let Some(category) = &self.category {
            config.category = category.clone();
        }
        config.max_pages = self.max_pages;
        config
    }

    pub fn chrome_options(&self) -> ChromeOptions {
        ChromeOptions {
            executable: self.chrome_path.as_deref().map(PathBuf::from),
            headless: self.headless.unwrap_or(true),
            ..ChromeOptions::default()
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("shelfscrape.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("books.db")
}

/// Load the config file; a missing file yields `None`
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ShelfConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ShelfConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfscrape.toml");
        std::fs::write(&path, "keyword = \"Rust\"\nmax_pages = 3\nheadless = false\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        let extractor = config.extractor_config();
        assert_eq!(extractor.keyword, "Rust");
        assert_eq!(extractor.category, "BKA");
        assert_eq!(extractor.max_pages, Some(3));
        assert!(!config.chrome_options().headless);
        assert_eq!(config.database_path(), default_database_path());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfscrape.toml");
        std::fs::write(&path, "max_pages = \"many\"").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("books.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
