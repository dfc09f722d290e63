//! Station link state machine.
//!
//! The supervisor never calls the driver from its event handler. It returns
//! the [`LinkAction`] to perform and the dispatcher executes it, which keeps
//! the reconnect logic testable without a radio.

use super::driver::{LinkDriver, LinkError};
use super::policy::ReconnectPolicy;
use crate::config::StationConfig;
use log::{debug, info};
use std::time::Duration;

/// Station connectivity as last reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Radio configured but not started yet.
    Idle,
    /// An association attempt is outstanding.
    Connecting,
    /// Associated with an access point.
    Connected { ssid: String, channel: u8 },
    /// Link lost; a retry is pending.
    Disconnected { ssid: String },
}

/// Link-layer notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    StationStarted,
    Connected { ssid: String, channel: u8 },
    Disconnected { ssid: String },
    /// A reconnect delay scheduled by the supervisor has elapsed.
    RetryElapsed,
}

/// What the dispatcher must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Submit a connect request now.
    Connect,
    /// Post [`LinkEvent::RetryElapsed`] after the delay.
    ScheduleConnect(Duration),
}

/// Owns station connectivity and decides every (re)connect.
#[derive(Debug)]
pub struct LinkSupervisor {
    state: LinkState,
    policy: ReconnectPolicy,
    /// Reconnects since the last successful association.
    attempt: u32,
    retry_scheduled: bool,
}

impl LinkSupervisor {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: LinkState::Idle,
            policy,
            attempt: 0,
            retry_scheduled: false,
        }
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Reconnect attempts since the last `Connected`.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether a delayed reconnect is waiting for its timer.
    pub fn retry_scheduled(&self) -> bool {
        self.retry_scheduled
    }

    /// Configure station mode and start the radio.
    ///
    /// The first connect happens on the `StationStarted` notification.
    pub fn start<D: LinkDriver>(
        &mut self,
        driver: &mut D,
        config: &StationConfig,
    ) -> Result<(), LinkError> {
        info!("Set WiFi mode as station for '{}'", config.ssid);
        driver.configure(config)?;
        info!("Start WiFi");
        driver.start()?;
        self.state = LinkState::Idle;
        Ok(())
    }

    /// React to a link notification.
    pub fn handle(&mut self, event: LinkEvent) -> Option<LinkAction> {
        match event {
            LinkEvent::StationStarted => {
                if self.state == LinkState::Connecting {
                    debug!("Station start while connecting, attempt already outstanding");
                    return None;
                }
                info!("WiFi station started, connecting ...");
                // This connect replaces any pending retry; its timer goes stale
                self.retry_scheduled = false;
                self.state = LinkState::Connecting;
                Some(LinkAction::Connect)
            }
            LinkEvent::Connected { ssid, channel } => {
                info!("Connected to '{}' on channel {}", ssid, channel);
                self.state = LinkState::Connected { ssid, channel };
                self.attempt = 0;
                self.retry_scheduled = false;
                None
            }
            LinkEvent::Disconnected { ssid } => {
                info!("Disconnected from '{}'", ssid);
                self.state = LinkState::Disconnected { ssid };
                if self.retry_scheduled {
                    debug!("Reconnect already scheduled");
                    return None;
                }

                let delay = self.policy.delay(self.attempt);
                self.attempt = self.attempt.saturating_add(1);
                if delay.is_zero() {
                    info!("Reconnecting (attempt {})", self.attempt);
                    self.state = LinkState::Connecting;
                    Some(LinkAction::Connect)
                } else {
                    info!("Reconnecting in {:?} (attempt {})", delay, self.attempt);
                    self.retry_scheduled = true;
                    Some(LinkAction::ScheduleConnect(delay))
                }
            }
            LinkEvent::RetryElapsed => {
                if !self.retry_scheduled {
                    debug!("Stale reconnect timer ignored");
                    return None;
                }
                self.retry_scheduled = false;
                self.state = LinkState::Connecting;
                Some(LinkAction::Connect)
            }
        }
    }
}

impl Default for LinkSupervisor {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
