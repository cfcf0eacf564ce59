//! Configuration and data directory resolution

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::photo::NormalizeOptions;
use crate::share::DEFAULT_MAX_LINK_LEN;

/// Database file name inside the data directory
pub const DB_FILE: &str = "closet.db";

/// Used when no share base is configured
pub const DEFAULT_SHARE_BASE: &str = "https://closet.local/";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub normalize: NormalizeOptions,
    /// Page the share link points at
    pub share_base_url: String,
    pub max_link_len: usize,
}

impl Config {
    /// Resolve the data directory in priority order:
    /// 1. Explicit value (command line flag or environment variable)
    /// 2. OS data directory, e.g. ~/.local/share/closet-tracker
    /// 3. Home directory fallback
    pub fn resolve(data_dir: Option<PathBuf>, share_base_url: Option<String>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()
                .ok_or_else(|| Error::Config("Could not determine user data directory".to_string()))?,
        };

        Ok(Config {
            data_dir,
            normalize: NormalizeOptions::default(),
            share_base_url: share_base_url.unwrap_or_else(|| DEFAULT_SHARE_BASE.to_string()),
            max_link_len: DEFAULT_MAX_LINK_LEN,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn validate(&self) -> Result<()> {
        if self.normalize.max_edge == 0 {
            return Err(Error::Config("max edge must be at least 1 pixel".to_string()));
        }
        if !(1..=100).contains(&self.normalize.quality) {
            return Err(Error::Config(format!(
                "JPEG quality must be 1-100, got {}",
                self.normalize.quality
            )));
        }
        let base = url::Url::parse(&self.share_base_url)
            .map_err(|e| Error::Config(format!("share base URL '{}': {}", self.share_base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https" | "file") {
            return Err(Error::Config(format!(
                "share base URL must be http(s) or file, got '{}'",
                base.scheme()
            )));
        }
        Ok(())
    }
}

/// Platform data directory for the closet
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("closet-tracker"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/closet")), None).unwrap();
        assert_eq!(config.db_path(), PathBuf::from("/tmp/closet/closet.db"));
        assert_eq!(config.share_base_url, DEFAULT_SHARE_BASE);
        assert_eq!(config.normalize.max_edge, 1280);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::resolve(Some(PathBuf::from("/tmp/closet")), Some("not a url".into())).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.share_base_url = "ftp://closet.example/".into();
        assert!(config.validate().is_err());

        config.share_base_url = "https://closet.example/".into();
        config.normalize.quality = 0;
        assert!(config.validate().is_err());
    }
}
