//! Directory-backed store for host (development) builds.
//!
//! Stands in for the NVS partition. The directory holds a `store.version`
//! marker; a marker from another layout version makes `init` report the
//! store as incompatible, exactly like NVS does after a firmware upgrade.
//! Uses `~/.mqtt-station-esp32/` by default.

use super::{PersistentStore, StoreError};
use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Layout version written to the marker file.
pub const STORE_VERSION: &str = "1";

const VERSION_FILE: &str = "store.version";

/// Get the default store directory.
///
/// Returns `~/.mqtt-station-esp32`
pub fn default_store_path() -> io::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "HOME not set"))?;
    Ok(PathBuf::from(home).join(".mqtt-station-esp32"))
}

/// Host persistent store rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_path(&self) -> PathBuf {
        self.root.join(VERSION_FILE)
    }
}

impl PersistentStore for DirStore {
    fn init(&mut self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(io_error)?;

        let path = self.version_path();
        match fs::read_to_string(&path) {
            Ok(version) if version.trim() == STORE_VERSION => {
                debug!("Store at {:?} is version {}", self.root, STORE_VERSION);
                Ok(())
            }
            Ok(version) => {
                debug!("Store at {:?} has version {:?}", self.root, version.trim());
                Err(StoreError::IncompatibleOrFull)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::write(&path, STORE_VERSION).map_err(io_error)?;
                info!("Store created at {:?}", self.root);
                Ok(())
            }
            Err(e) => Err(io_error(e)),
        }
    }

    fn erase(&mut self) -> Result<(), StoreError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}

fn io_error(e: io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}
