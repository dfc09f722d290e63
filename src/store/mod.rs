//! Persistent store readiness.
//!
//! The firmware keeps no application state of its own, but the WiFi driver
//! needs an initialized NVS partition. An incompatible or full partition is
//! erased and initialized once more; a second failure is fatal.
//!
//! # Components
//!
//! - [`esp`] - NVS flash (ESP32 only)
//! - [`host`] - versioned directory for development runs (host only)

#[cfg(feature = "esp32")]
mod esp;
#[cfg(not(target_os = "espidf"))]
mod host;

use log::{info, warn};
use std::fmt;

#[cfg(feature = "esp32")]
pub use esp::NvsFlash;
#[cfg(not(target_os = "espidf"))]
pub use host::{default_store_path, DirStore, STORE_VERSION};

/// Non-volatile storage as seen by the bootstrap sequence.
pub trait PersistentStore {
    /// Make the store ready for use.
    fn init(&mut self) -> Result<(), StoreError>;

    /// Wipe the store so the next `init` starts from scratch.
    fn erase(&mut self) -> Result<(), StoreError>;
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Layout is from another version, or no free pages are left.
    IncompatibleOrFull,
    /// Any other storage failure.
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleOrFull => write!(f, "store incompatible or full"),
            Self::Io(e) => write!(f, "store I/O error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Initialize `store`, erasing and retrying once if it is incompatible.
pub fn prepare<S: PersistentStore>(store: &mut S) -> Result<(), StoreError> {
    info!("Initialize NVS");
    match store.init() {
        Err(StoreError::IncompatibleOrFull) => {
            warn!("NVS incompatible or full, erasing");
            store.erase()?;
            store.init()
        }
        other => other,
    }
}
