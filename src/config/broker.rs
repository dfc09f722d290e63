//! MQTT broker endpoint.

use super::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Broker the device talks to.
pub const DEFAULT_BROKER_URI: &str = "mqtt://10.1.1.1:1883";

/// Default port for plain MQTT.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default port for MQTT over TLS.
pub const DEFAULT_MQTTS_PORT: u16 = 8883;

/// A parsed `mqtt://` or `mqtts://` broker address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    uri: String,
    host: String,
    port: u16,
    secure: bool,
}

impl BrokerEndpoint {
    /// Parse a broker URI of the form `scheme://host[:port][/path]`.
    ///
    /// The port defaults to 1883 for `mqtt` and 8883 for `mqtts`.
    pub fn parse(uri: &str) -> Result<Self, ConfigError> {
        let uri = uri.trim();
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| ConfigError::InvalidUri(uri.to_string()))?;

        let secure = match scheme.to_ascii_lowercase().as_str() {
            "mqtt" | "tcp" => false,
            "mqtts" | "ssl" => true,
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };

        let authority = rest.split('/').next().unwrap_or_default();
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| ConfigError::InvalidPort(port.to_string()))?;
                (host, port)
            }
            None if secure => (authority, DEFAULT_MQTTS_PORT),
            None => (authority, DEFAULT_MQTT_PORT),
        };

        if host.is_empty() {
            return Err(ConfigError::MissingHost);
        }

        Ok(Self {
            uri: uri.to_string(),
            host: host.to_string(),
            port,
            secure,
        })
    }

    /// The endpoint the firmware is built for.
    pub fn device_default() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_BROKER_URI)
    }

    /// The URI as given.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the endpoint requires TLS.
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl FromStr for BrokerEndpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_default() {
        let endpoint = BrokerEndpoint::device_default().unwrap();
        assert_eq!(endpoint.host(), "10.1.1.1");
        assert_eq!(endpoint.port(), 1883);
        assert!(!endpoint.is_secure());
        assert_eq!(endpoint.to_string(), DEFAULT_BROKER_URI);
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(BrokerEndpoint::parse("mqtt://broker.local").unwrap().port(), 1883);
        let secure = BrokerEndpoint::parse("mqtts://broker.local/").unwrap();
        assert_eq!(secure.port(), 8883);
        assert!(secure.is_secure());
    }

    #[test]
    fn test_path_is_ignored() {
        let endpoint: BrokerEndpoint = "MQTT://broker.local:1999/ws".parse().unwrap();
        assert_eq!(endpoint.host(), "broker.local");
        assert_eq!(endpoint.port(), 1999);
    }

    #[test]
    fn test_missing_scheme() {
        let result = BrokerEndpoint::parse("10.1.1.1:1883");
        assert!(matches!(result, Err(ConfigError::InvalidUri(_))));
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = BrokerEndpoint::parse("http://10.1.1.1");
        assert_eq!(
            result.err(),
            Some(ConfigError::UnsupportedScheme("http".to_string()))
        );
    }

    #[test]
    fn test_missing_host() {
        assert_eq!(
            BrokerEndpoint::parse("mqtt://:1883").err(),
            Some(ConfigError::MissingHost)
        );
        assert_eq!(
            BrokerEndpoint::parse("mqtt://").err(),
            Some(ConfigError::MissingHost)
        );
    }

    #[test]
    fn test_invalid_port() {
        assert!(matches!(
            BrokerEndpoint::parse("mqtt://broker:99999"),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            BrokerEndpoint::parse("mqtt://broker:0"),
            Err(ConfigError::InvalidPort(_))
        ));
    }
}
