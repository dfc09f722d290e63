//! WiFi station configuration.
//!
//! Platform-independent credential and scan settings, testable on the host.
//!
//! # Example
//!
//! ```
//! use mqtt_station_esp32::config::{ScanMethod, SortMethod, StationConfig};
//!
//! let config = StationConfig::new("MyNetwork", "MyPassword").unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.scan_method, ScanMethod::AllChannels);
//! assert_eq!(config.sort_method, SortMethod::Signal);
//! ```

use super::ConfigError;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Access point the device joins.
pub const DEFAULT_SSID: &str = "belkin.a58";

/// Passphrase for [`DEFAULT_SSID`].
pub const DEFAULT_PASSWORD: &str = "ceca966f";

/// Weakest signal accepted when choosing an access point (dBm).
pub const DEFAULT_RSSI_THRESHOLD: i8 = -127;

/// How the radio looks for the configured access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMethod {
    /// Stop at the first matching access point.
    Fast,
    /// Scan every channel before choosing.
    #[default]
    AllChannels,
}

/// How matching access points are ranked after an all-channel scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMethod {
    /// Strongest signal first.
    #[default]
    Signal,
    /// Strongest security first.
    Security,
}

/// Weakest authentication mode the station will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthThreshold {
    #[default]
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    WpaWpa2Psk,
    Wpa3Psk,
}

/// Station credentials and association thresholds.
///
/// SSID and password are zeroed when the config is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct StationConfig {
    /// Network SSID (1-32 bytes).
    pub ssid: String,
    /// Network password (8-64 bytes for WPA2, empty for open networks).
    pub password: String,
    #[zeroize(skip)]
    pub scan_method: ScanMethod,
    #[zeroize(skip)]
    pub sort_method: SortMethod,
    /// Minimum RSSI in dBm.
    pub rssi_threshold: i8,
    #[zeroize(skip)]
    pub auth_threshold: AuthThreshold,
}

impl StationConfig {
    /// Create a new station configuration with default scan settings.
    ///
    /// Returns an error if SSID or password are invalid.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: password.into(),
            scan_method: ScanMethod::default(),
            sort_method: SortMethod::default(),
            rssi_threshold: DEFAULT_RSSI_THRESHOLD,
            auth_threshold: AuthThreshold::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration for an open network (no password).
    pub fn open(ssid: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new())
    }

    /// The configuration baked into the firmware.
    pub fn device_default() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_SSID, DEFAULT_PASSWORD)
    }

    /// Replace the scan and sort methods.
    pub fn with_scan(mut self, scan_method: ScanMethod, sort_method: SortMethod) -> Self {
        self.scan_method = scan_method;
        self.sort_method = sort_method;
        self
    }

    /// Replace the RSSI and authentication thresholds.
    pub fn with_thresholds(mut self, rssi_threshold: i8, auth_threshold: AuthThreshold) -> Self {
        self.rssi_threshold = rssi_threshold;
        self.auth_threshold = auth_threshold;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }

        // Empty is OK for open networks
        if !self.password.is_empty() && self.password.len() < MIN_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooShort {
                len: self.password.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: self.password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }

        Ok(())
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

impl fmt::Debug for StationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("scan_method", &self.scan_method)
            .field("sort_method", &self.sort_method)
            .field("rssi_threshold", &self.rssi_threshold)
            .field("auth_threshold", &self.auth_threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = StationConfig::new("TestNetwork", "password123").unwrap();
        assert_eq!(config.ssid, "TestNetwork");
        assert_eq!(config.password, "password123");
        assert!(!config.is_open());
    }

    #[test]
    fn test_device_default() {
        let config = StationConfig::device_default().unwrap();
        assert_eq!(config.ssid, DEFAULT_SSID);
        assert_eq!(config.scan_method, ScanMethod::AllChannels);
        assert_eq!(config.sort_method, SortMethod::Signal);
        assert_eq!(config.rssi_threshold, -127);
        assert_eq!(config.auth_threshold, AuthThreshold::Open);
    }

    #[test]
    fn test_open_network() {
        let config = StationConfig::open("OpenNetwork").unwrap();
        assert!(config.is_open());
    }

    #[test]
    fn test_empty_ssid() {
        let result = StationConfig::new("", "password123");
        assert_eq!(result.err(), Some(ConfigError::SsidEmpty));
    }

    #[test]
    fn test_ssid_length_bounds() {
        assert!(StationConfig::new("a".repeat(32), "password123").is_ok());
        let result = StationConfig::new("a".repeat(33), "password123");
        assert!(matches!(result, Err(ConfigError::SsidTooLong { len: 33, max: 32 })));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(matches!(
            StationConfig::new("TestNetwork", "short"),
            Err(ConfigError::PasswordTooShort { .. })
        ));
        assert!(StationConfig::new("TestNetwork", "12345678").is_ok());
        assert!(StationConfig::new("TestNetwork", "a".repeat(64)).is_ok());
        assert!(matches!(
            StationConfig::new("TestNetwork", "a".repeat(65)),
            Err(ConfigError::PasswordTooLong { .. })
        ));
    }

    #[test]
    fn test_builders_replace_settings() {
        let config = StationConfig::open("Lab")
            .unwrap()
            .with_scan(ScanMethod::Fast, SortMethod::Security)
            .with_thresholds(-70, AuthThreshold::Wpa2Psk);
        assert_eq!(config.scan_method, ScanMethod::Fast);
        assert_eq!(config.sort_method, SortMethod::Security);
        assert_eq!(config.rssi_threshold, -70);
        assert_eq!(config.auth_threshold, AuthThreshold::Wpa2Psk);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = StationConfig::new("TestNetwork", "supersecret").unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("TestNetwork"));
        assert!(!debug.contains("supersecret"));
    }
}
