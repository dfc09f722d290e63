//! ESP-IDF WiFi driver.
//!
//! Wraps `EspWifi` in non-blocking station mode. Driver and DHCP events are
//! forwarded from the system event loop task into the notification queue;
//! nothing here waits for a connection to complete.

use super::driver::{LinkDriver, LinkError};
use super::supervisor::LinkEvent;
use crate::address::AddressEvent;
use crate::config::{self, AuthThreshold, SortMethod, StationConfig};
use crate::event::{Notification, Notifier};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::netif::IpEvent;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AuthMethod, ClientConfiguration, Configuration, EspWifi, ScanMethod, ScanSortMethod,
    WifiEvent,
};
use esp_idf_sys::EspError;
use log::debug;
use std::net::IpAddr;

/// ESP32 station driver.
pub struct EspLink {
    wifi: EspWifi<'static>,
    _wifi_events: EspSubscription<'static, System>,
    _ip_events: EspSubscription<'static, System>,
}

impl EspLink {
    /// Create the driver and subscribe to station and DHCP events.
    ///
    /// NVS must already be initialized; the driver keeps its calibration
    /// data in the default partition.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        notifier: Notifier,
    ) -> Result<Self, LinkError> {
        let wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(init_error)?;

        let wifi_notifier = notifier.clone();
        let wifi_events = sysloop
            .subscribe::<WifiEvent, _>(move |event| {
                let event = match event {
                    WifiEvent::StaStarted => LinkEvent::StationStarted,
                    WifiEvent::StaConnected(info) => LinkEvent::Connected {
                        ssid: info.ssid().to_string(),
                        channel: info.channel(),
                    },
                    WifiEvent::StaDisconnected(info) => LinkEvent::Disconnected {
                        ssid: info.ssid().to_string(),
                    },
                    other => {
                        debug!("Unhandled WiFi event: {:?}", other);
                        return;
                    }
                };
                if wifi_notifier.send(Notification::Link(event)).is_err() {
                    debug!("WiFi notification dropped, queue closed");
                }
            })
            .map_err(init_error)?;

        let ip_events = sysloop
            .subscribe::<IpEvent, _>(move |event| {
                if let IpEvent::DhcpIpAssigned(assignment) = event {
                    let address = IpAddr::V4(assignment.ip());
                    let event = Notification::Address(AddressEvent::new(address));
                    if notifier.send(event).is_err() {
                        debug!("Address {} dropped, queue closed", address);
                    }
                }
            })
            .map_err(init_error)?;

        Ok(Self {
            wifi,
            _wifi_events: wifi_events,
            _ip_events: ip_events,
        })
    }
}

impl LinkDriver for EspLink {
    fn configure(&mut self, config: &StationConfig) -> Result<(), LinkError> {
        let scan_method = match config.scan_method {
            config::ScanMethod::Fast => ScanMethod::FastScan,
            config::ScanMethod::AllChannels => ScanMethod::CompleteScan(match config.sort_method {
                SortMethod::Signal => ScanSortMethod::Signal,
                SortMethod::Security => ScanSortMethod::Security,
            }),
        };

        // ClientConfiguration has no RSSI threshold; the driver default (-127) applies
        debug!("RSSI threshold {} dBm", config.rssi_threshold);

        let client = ClientConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidSsid)?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidPassword)?,
            auth_method: auth_method(config.auth_threshold),
            scan_method,
            ..Default::default()
        };

        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|e| LinkError::Configure(format!("{:?}", e)))
    }

    fn start(&mut self) -> Result<(), LinkError> {
        self.wifi
            .start()
            .map_err(|e| LinkError::Start(format!("{:?}", e)))
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        self.wifi
            .connect()
            .map_err(|e| LinkError::Submit(format!("{:?}", e)))
    }
}

/// Weakest accepted auth mode; the driver treats this as a threshold.
fn auth_method(threshold: AuthThreshold) -> AuthMethod {
    match threshold {
        AuthThreshold::Open => AuthMethod::None,
        AuthThreshold::Wep => AuthMethod::WEP,
        AuthThreshold::WpaPsk => AuthMethod::WPA,
        AuthThreshold::Wpa2Psk => AuthMethod::WPA2Personal,
        AuthThreshold::WpaWpa2Psk => AuthMethod::WPAWPA2Personal,
        AuthThreshold::Wpa3Psk => AuthMethod::WPA3Personal,
    }
}

fn init_error(e: EspError) -> LinkError {
    LinkError::Init(format!("{:?}", e))
}
