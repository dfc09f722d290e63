//! Device configuration.
//!
//! The device runs unattended, so everything here is a fixed constant that is
//! validated once at startup.
//!
//! # Components
//!
//! - [`station`] - WiFi station credentials and scan/auth thresholds
//! - [`broker`] - MQTT broker endpoint parsed from a URI

mod broker;
mod station;

use std::fmt;

pub use broker::{BrokerEndpoint, DEFAULT_BROKER_URI, DEFAULT_MQTTS_PORT, DEFAULT_MQTT_PORT};
pub use station::{
    AuthThreshold, ScanMethod, SortMethod, StationConfig, DEFAULT_PASSWORD,
    DEFAULT_RSSI_THRESHOLD, DEFAULT_SSID, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN,
};

/// Errors that can occur while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Broker URI has no `scheme://` prefix.
    InvalidUri(String),
    /// Broker URI scheme is not `mqtt` or `mqtts`.
    UnsupportedScheme(String),
    /// Broker URI has no host.
    MissingHost,
    /// Broker URI port is not a valid port number.
    InvalidPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::InvalidUri(uri) => write!(f, "invalid broker URI: {}", uri),
            Self::UnsupportedScheme(scheme) => write!(f, "unsupported broker scheme: {}", scheme),
            Self::MissingHost => write!(f, "broker URI has no host"),
            Self::InvalidPort(port) => write!(f, "invalid broker port: {}", port),
        }
    }
}

impl std::error::Error for ConfigError {}
