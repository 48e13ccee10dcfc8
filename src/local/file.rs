use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{percent_encode, NON_ALPHANUMERIC};

use super::error::{invalid_argument, io_error, LocalStorageResult};
use super::KeyValueStore;

const LOCAL_STORE_DIR_ENV: &str = "FIELDGUIDE_LOCAL_STORE_DIR";

/// Key-value store persisting one file per key, surviving process restarts.
#[derive(Clone, Debug)]
pub struct FileKeyValueStore {
    base_dir: Arc<PathBuf>,
}

impl FileKeyValueStore {
    pub fn new(base_dir: PathBuf) -> LocalStorageResult<Self> {
        fs::create_dir_all(&base_dir).map_err(|err| {
            io_error(format!(
                "Failed to create local store directory '{}': {}",
                base_dir.display(),
                err
            ))
        })?;
        Ok(Self {
            base_dir: Arc::new(base_dir),
        })
    }

    /// Opens the directory named by `FIELDGUIDE_LOCAL_STORE_DIR`, or `./.fieldguide/local`.
    pub fn from_env() -> LocalStorageResult<Self> {
        if let Ok(dir) = std::env::var(LOCAL_STORE_DIR_ENV) {
            return Self::new(PathBuf::from(dir));
        }

        let dir = std::env::current_dir()
            .map_err(|err| io_error(format!("Failed to obtain working directory: {}", err)))?
            .join(".fieldguide/local");
        Self::new(dir)
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn file_for(&self, key: &str) -> LocalStorageResult<PathBuf> {
        if key.is_empty() {
            return Err(invalid_argument("local storage keys must not be empty"));
        }
        let encoded = percent_encode(key.as_bytes(), NON_ALPHANUMERIC).to_string();
        Ok(self.base_dir.join(format!("{}.json", encoded)))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn read(&self, key: &str) -> LocalStorageResult<Option<String>> {
        let path = self.file_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(format!(
                "Failed to read local slot '{}': {}",
                path.display(),
                err
            ))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> LocalStorageResult<()> {
        let path = self.file_for(key)?;
        fs::write(&path, value).map_err(|err| {
            io_error(format!(
                "Failed to write local slot '{}': {}",
                path.display(),
                err
            ))
        })
    }

    async fn delete(&self, key: &str) -> LocalStorageResult<()> {
        let path = self.file_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(format!(
                "Failed to delete local slot '{}': {}",
                path.display(),
                err
            ))),
        }
    }
}
