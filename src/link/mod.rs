//! WiFi station link.
//!
//! # Components
//!
//! - [`supervisor`] - link state machine deciding when to (re)connect
//! - [`policy`] - reconnect delay policy
//! - [`driver`] - radio driver abstraction
//! - [`esp`] - ESP-IDF driver (ESP32 only)
//! - [`host`] - simulated station for development runs (host only)

mod driver;
mod policy;
mod supervisor;

#[cfg(feature = "esp32")]
mod esp;
#[cfg(not(target_os = "espidf"))]
mod host;

pub use driver::{LinkDriver, LinkError};
pub use policy::{Jitter, ReconnectPolicy};
pub use supervisor::{LinkAction, LinkEvent, LinkState, LinkSupervisor};

#[cfg(feature = "esp32")]
pub use esp::EspLink;
#[cfg(not(target_os = "espidf"))]
pub use host::HostLink;
