//! File-based token storage with atomic writes.
//!
//! Stores the sealed token under `dirs::data_dir()/<namespace>/<file>`,
//! or under an explicit directory when configured.
//! Uses temp file + rename for atomic writes.

use crate::config::TollgateConfig;
use crate::TollgateError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Single-file token store for one installation.
#[derive(Debug, Clone)]
pub struct TokenFile {
    /// Directory holding the token.
    cache_dir: PathBuf,
    /// Token file name inside `cache_dir`.
    file_name: String,
}

impl TokenFile {
    /// Resolve the token location from config.
    ///
    /// The directory is not created until the first save.
    pub fn from_config(config: &TollgateConfig) -> Result<Self, TollgateError> {
        let cache_dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .ok_or_else(|| {
                    TollgateError::ConfigError("Could not find data directory".to_string())
                })?
                .join(config.cache_namespace),
        };
        Ok(Self::with_path(cache_dir, config.token_file_name))
    }

    /// Create a token file at a specific directory.
    pub fn with_path(cache_dir: PathBuf, file_name: &str) -> Self {
        Self {
            cache_dir,
            file_name: file_name.to_string(),
        }
    }

    /// Full path of the token file.
    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(&self.file_name)
    }

    fn temp_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.tmp", self.file_name))
    }

    /// Save sealed token bytes atomically.
    pub fn save(&self, bytes: &[u8]) -> Result<(), TollgateError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| {
            TollgateError::PersistFailure(format!("Failed to create cache dir: {}", e))
        })?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, bytes)
            .map_err(|e| TollgateError::PersistFailure(format!("Failed to write temp file: {}", e)))?;

        if let Err(e) = fs::rename(&temp_path, self.path()) {
            let _ = fs::remove_file(&temp_path);
            return Err(TollgateError::PersistFailure(format!(
                "Failed to rename token file: {}",
                e
            )));
        }

        Ok(())
    }

    /// Load sealed token bytes, `None` if no token has been written.
    pub fn load(&self) -> Result<Option<Vec<u8>>, TollgateError> {
        read_optional(&self.path())
    }

    /// Delete the token file if present.
    pub fn delete(&self) -> Result<(), TollgateError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TollgateError::PersistFailure(format!(
                "Failed to delete token: {}",
                e
            ))),
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, TollgateError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TollgateError::PersistFailure(format!(
            "Failed to read token file: {}",
            e
        ))),
    }
}
