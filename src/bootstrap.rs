//! One-time startup: store readiness, then station bring-up.
//!
//! Nothing here is retried beyond the single NVS erase. Any [`SetupError`] is
//! fatal and the binary ends in [`abort`].

use crate::config::{ConfigError, StationConfig};
use crate::link::{LinkDriver, LinkError, LinkSupervisor};
use crate::store::{self, PersistentStore, StoreError};
use log::{error, info};
use std::fmt;

/// Fatal startup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// Fixed configuration failed validation.
    Config(ConfigError),
    /// Store could not be made ready, even after erasing.
    Store(StoreError),
    /// Radio driver could not be created, configured or started.
    Link(LinkError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {}", e),
            Self::Store(e) => write!(f, "persistent store: {}", e),
            Self::Link(e) => write!(f, "station link: {}", e),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Link(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SetupError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StoreError> for SetupError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<LinkError> for SetupError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

/// Run the startup sequence and hand back the started driver.
///
/// The driver is only created once the store is ready, since the radio
/// driver reads its calibration data from it.
pub fn run<S, D, F>(
    store: &mut S,
    supervisor: &mut LinkSupervisor,
    make_driver: F,
    station: &StationConfig,
) -> Result<D, SetupError>
where
    S: PersistentStore,
    D: LinkDriver,
    F: FnOnce() -> Result<D, LinkError>,
{
    station.validate()?;
    store::prepare(store)?;

    info!("Init WiFi");
    let mut driver = make_driver()?;
    supervisor.start(&mut driver, station)?;
    Ok(driver)
}

/// Log `err` and stop the device.
pub fn abort(err: SetupError) -> ! {
    error!("Setup failed: {}", err);
    std::process::abort()
}
