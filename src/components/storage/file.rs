use super::Store;
use crate::error::DaybookResult;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Store that keeps each key as a file inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl Store for FileStore {
    fn load(&self, key: &str) -> DaybookResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &[u8]) -> DaybookResult<()> {
        // Create data directory if it doesn't exist
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}
