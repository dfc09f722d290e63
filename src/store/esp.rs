//! NVS flash partition.
//!
//! Calls `nvs_flash_init` directly so an incompatible partition is reported
//! to the caller instead of being silently erased. Later `EspNvsPartition`
//! handles reuse the already initialized partition.

use super::{PersistentStore, StoreError};
use esp_idf_sys::{
    esp, esp_err_t, nvs_flash_erase, nvs_flash_init, ESP_ERR_NVS_NEW_VERSION_FOUND,
    ESP_ERR_NVS_NO_FREE_PAGES,
};

/// The default NVS partition.
#[derive(Debug, Default)]
pub struct NvsFlash;

impl NvsFlash {
    pub fn new() -> Self {
        Self
    }
}

impl PersistentStore for NvsFlash {
    fn init(&mut self) -> Result<(), StoreError> {
        // SAFETY: plain ESP-IDF call, no pointers involved
        let code = unsafe { nvs_flash_init() };
        if code == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
            || code == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
        {
            return Err(StoreError::IncompatibleOrFull);
        }
        esp!(code).map_err(|e| StoreError::Io(format!("{:?}", e)))
    }

    fn erase(&mut self) -> Result<(), StoreError> {
        // SAFETY: plain ESP-IDF call, no pointers involved
        esp!(unsafe { nvs_flash_erase() }).map_err(|e| StoreError::Io(format!("{:?}", e)))
    }
}
