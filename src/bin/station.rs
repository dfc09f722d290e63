//! MQTT station binary.
//!
//! Runs on both ESP32 and host platforms:
//! - **Host**: `cargo run --bin station` (set `MQTT_URI` to pick a broker)
//! - **ESP32**: `cargo espflash flash --bin station --features esp32 --release`
//!
//! Startup failures abort the process. After that the device runs forever,
//! reconnecting whenever the link drops.

use log::info;
use mqtt_station_esp32::address::AddressWatcher;
use mqtt_station_esp32::bootstrap;
use mqtt_station_esp32::config::{BrokerEndpoint, StationConfig};
use mqtt_station_esp32::dispatcher::Dispatcher;
use mqtt_station_esp32::event;
use mqtt_station_esp32::link::{LinkSupervisor, ReconnectPolicy};
use mqtt_station_esp32::session::SessionPlan;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ESP32: Initialize ESP-IDF before anything else
#[cfg(feature = "esp32")]
fn platform_init() {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    info!("ESP-IDF initialized");
}

// Host: Just initialize env_logger
#[cfg(not(feature = "esp32"))]
fn platform_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Broker endpoint; host runs may override it with `MQTT_URI`.
fn broker_endpoint() -> Result<BrokerEndpoint, bootstrap::SetupError> {
    #[cfg(not(feature = "esp32"))]
    if let Ok(uri) = std::env::var("MQTT_URI") {
        return Ok(BrokerEndpoint::parse(&uri)?);
    }
    Ok(BrokerEndpoint::device_default()?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    platform_init();

    info!("=== MQTT station starting ===");

    let station = StationConfig::device_default().unwrap_or_else(|e| bootstrap::abort(e.into()));
    let endpoint = broker_endpoint().unwrap_or_else(|e| bootstrap::abort(e));
    info!("Broker: {}", endpoint);

    let (notifier, queue) = event::channel();
    let mut supervisor = LinkSupervisor::new(ReconnectPolicy::default());
    let cancel = CancellationToken::new();

    #[cfg(feature = "esp32")]
    let (driver, connector) = {
        use esp_idf_hal::peripherals::Peripherals;
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;
        use mqtt_station_esp32::link::{EspLink, LinkError};
        use mqtt_station_esp32::session::EspMqttConnector;
        use mqtt_station_esp32::store::NvsFlash;

        let mut store = NvsFlash::new();
        let link_notifier = notifier.clone();
        let driver = bootstrap::run(
            &mut store,
            &mut supervisor,
            move || {
                let init = |e| LinkError::Init(format!("{:?}", e));
                let peripherals = Peripherals::take().map_err(init)?;
                let sysloop = EspSystemEventLoop::take().map_err(init)?;
                let nvs = EspDefaultNvsPartition::take().map_err(init)?;
                EspLink::new(peripherals.modem, sysloop, nvs, link_notifier)
            },
            &station,
        )
        .unwrap_or_else(|e| bootstrap::abort(e));
        (driver, EspMqttConnector::new())
    };

    #[cfg(not(feature = "esp32"))]
    let (driver, connector) = {
        use mqtt_station_esp32::link::{HostLink, LinkError};
        use mqtt_station_esp32::session::RumqttConnector;
        use mqtt_station_esp32::store::{default_store_path, DirStore};

        let root = default_store_path()
            .unwrap_or_else(|_| std::env::temp_dir().join("mqtt-station-esp32"));
        let mut store = DirStore::at(root);
        let link_notifier = notifier.clone();
        let driver = bootstrap::run(
            &mut store,
            &mut supervisor,
            move || Ok::<_, LinkError>(HostLink::new(link_notifier)),
            &station,
        )
        .unwrap_or_else(|e| bootstrap::abort(e));

        let shutdown = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, shutting down");
                shutdown.cancel();
            }
        });
        (driver, RumqttConnector::default())
    };

    let watcher = AddressWatcher::new(endpoint, Arc::new(SessionPlan::pokemon()));
    let dispatcher = Dispatcher::new(supervisor, watcher, driver, connector, notifier);
    dispatcher.run(queue, cancel).await;

    info!("=== MQTT station stopped ===");
}
