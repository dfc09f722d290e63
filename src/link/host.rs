//! Simulated station for host builds.
//!
//! On host systems the OS owns networking, so association always succeeds
//! immediately. The driver still reports every step through the notification
//! queue so the same supervisor, watcher and session code run unchanged.

use super::driver::{LinkDriver, LinkError};
use super::supervisor::LinkEvent;
use crate::address::AddressEvent;
use crate::config::StationConfig;
use crate::event::{Notification, Notifier};
use log::{debug, info};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Channel reported for the simulated association.
const HOST_CHANNEL: u8 = 0;

/// Host link driver.
#[derive(Debug)]
pub struct HostLink {
    notifier: Notifier,
    ssid: Option<String>,
    started: bool,
}

impl HostLink {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            ssid: None,
            started: false,
        }
    }

    /// Get the primary local IP address.
    ///
    /// Creates a UDP socket and "connects" it to a public IP (nothing is
    /// sent), then reads back which local address the OS chose.
    fn detect_local_ip() -> Option<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        Some(socket.local_addr().ok()?.ip())
    }

    fn post(&self, notification: Notification) -> Result<(), LinkError> {
        self.notifier
            .send(notification)
            .map_err(|_| LinkError::Submit("notification queue closed".to_string()))
    }
}

impl LinkDriver for HostLink {
    fn configure(&mut self, config: &StationConfig) -> Result<(), LinkError> {
        debug!("Host station configured for '{}'", config.ssid);
        self.ssid = Some(config.ssid.clone());
        Ok(())
    }

    fn start(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_none() {
            return Err(LinkError::Start("station not configured".to_string()));
        }
        self.started = true;
        self.post(Notification::Link(LinkEvent::StationStarted))
            .map_err(|e| LinkError::Start(e.to_string()))
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        if !self.started {
            return Err(LinkError::Submit("station not started".to_string()));
        }
        let ssid = self.ssid.clone().unwrap_or_default();
        self.post(Notification::Link(LinkEvent::Connected {
            ssid,
            channel: HOST_CHANNEL,
        }))?;

        let address = Self::detect_local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        info!("Host network ready, local IP: {}", address);
        self.post(Notification::Address(AddressEvent::new(address)))
    }
}
