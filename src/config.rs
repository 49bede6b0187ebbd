//! Validated run settings shared by the `import` and `stage` commands.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ImportError, ImportResult};
use crate::import::StageOptions;
use crate::source::{ClientConfig, DEFAULT_BASE_URL};

pub const DEFAULT_DB_FILE: &str = "pokedex.sqlite";

#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub db_path: PathBuf,
    pub base_url: String,
    pub page_size: u32,
    pub delay: Duration,
    pub max_items: Option<u64>,
    pub threads: usize,
    pub import_id: Option<String>,
    pub retries: u32,
    pub retry_backoff: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 50,
            delay: Duration::from_millis(100),
            max_items: None,
            threads: 1,
            import_id: None,
            retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl ImportConfig {
    pub fn validate(&self) -> ImportResult<()> {
        if self.page_size == 0 {
            return Err(ImportError::InvalidConfig("--limit must be greater than 0".into()));
        }
        if self.threads == 0 {
            return Err(ImportError::InvalidConfig("--threads must be at least 1".into()));
        }
        if self.max_items == Some(0) {
            return Err(ImportError::InvalidConfig("--max must be greater than 0".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ImportError::InvalidConfig("base URL is empty".into()));
        }
        if matches!(self.import_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(ImportError::InvalidConfig("--import-id is empty".into()));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            delay: self.delay,
            retries: self.retries,
            retry_backoff: self.retry_backoff,
            ..ClientConfig::default()
        }
    }

    pub fn stage_options(&self) -> StageOptions {
        StageOptions {
            page_size: self.page_size,
            max_items: self.max_items,
        }
    }
}

/// `--db` if given, else `pokedex.sqlite` in the platform data directory
pub fn resolve_db_path(custom: Option<PathBuf>) -> ImportResult<PathBuf> {
    match custom {
        Some(path) => Ok(path),
        None => {
            let dirs = ProjectDirs::from("", "", "pokedex-sync").ok_or_else(|| {
                ImportError::InvalidConfig("could not determine data directory; pass --db".into())
            })?;
            Ok(dirs.data_dir().join(DEFAULT_DB_FILE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ImportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stage_options(), StageOptions::default());
        assert_eq!(config.client_config().retries, 0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_limit = ImportConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(matches!(zero_limit.validate(), Err(ImportError::InvalidConfig(_))));

        let zero_threads = ImportConfig {
            threads: 0,
            ..Default::default()
        };
        assert!(zero_threads.validate().is_err());

        let zero_max = ImportConfig {
            max_items: Some(0),
            ..Default::default()
        };
        assert!(zero_max.validate().is_err());
    }

    #[test]
    fn test_explicit_db_path_wins() {
        let path = resolve_db_path(Some(PathBuf::from("/tmp/dex.sqlite"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/dex.sqlite"));
    }
}
