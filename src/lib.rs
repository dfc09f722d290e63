//! MQTT station firmware library.
//!
//! Brings up a WiFi station link and, for every acquired address, runs one
//! MQTT broker session through its subscribe/publish/unsubscribe plan. The
//! state machines are platform-independent and tested on the host machine;
//! ESP-IDF drivers live behind the `esp32` feature, host stand-ins are used
//! everywhere else.

pub mod address;
pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod event;
pub mod link;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use address::{AddressEvent, AddressWatcher};
pub use bootstrap::SetupError;
pub use config::{BrokerEndpoint, ConfigError, StationConfig};
pub use dispatcher::Dispatcher;
pub use event::{Notification, NotificationQueue, Notifier};
pub use link::{LinkDriver, LinkError, LinkEvent, LinkState, LinkSupervisor, ReconnectPolicy};
pub use session::{SessionConnector, SessionEvent, SessionOrchestrator, SessionPlan, SessionState};
pub use store::{PersistentStore, StoreError};
