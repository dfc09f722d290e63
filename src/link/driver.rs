//! Radio driver abstraction.

use crate::config::StationConfig;
use std::fmt;

/// The station-mode operations the supervisor needs from a radio.
///
/// All calls only submit work. Their outcome arrives later as a
/// [`LinkEvent`](super::LinkEvent) through the notification queue.
pub trait LinkDriver {
    /// Put the radio in station mode with the given credentials.
    fn configure(&mut self, config: &StationConfig) -> Result<(), LinkError>;

    /// Start the radio. Completion is reported as `StationStarted`.
    fn start(&mut self) -> Result<(), LinkError>;

    /// Begin an association attempt. Failure is reported as `Disconnected`.
    fn connect(&mut self) -> Result<(), LinkError>;
}

/// Errors that can occur during link operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Driver could not be created.
    Init(String),
    /// SSID rejected by the driver.
    InvalidSsid,
    /// Password rejected by the driver.
    InvalidPassword,
    /// Driver refused the station configuration.
    Configure(String),
    /// Radio failed to start.
    Start(String),
    /// Connect request could not be submitted.
    Submit(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "driver init failed: {}", e),
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::Configure(e) => write!(f, "configuration rejected: {}", e),
            Self::Start(e) => write!(f, "start failed: {}", e),
            Self::Submit(e) => write!(f, "connect not submitted: {}", e),
        }
    }
}

impl std::error::Error for LinkError {}
