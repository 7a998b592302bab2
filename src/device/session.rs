//! Scoped device ownership.
//!
//! Handles opening a device and guarantees it is closed again on every exit
//! path, including early returns through `?` and panics.

use tracing::{info, warn};

use super::{CameraDevice, DeviceInfo};
use crate::error::AppResult;

/// An open device that closes itself when dropped.
pub struct DeviceSession {
    device: Box<dyn CameraDevice>,
    info: DeviceInfo,
}

impl DeviceSession {
    /// Open the device and read its identity.
    ///
    /// If anything fails after the device opened, it is closed before the
    /// error is returned.
    pub fn open(mut device: Box<dyn CameraDevice>) -> AppResult<Self> {
        device.open()?;
        let info = match device.device_info() {
            Ok(info) => info,
            Err(e) => {
                if let Err(close_err) = device.close() {
                    warn!("Failed to close device after identification error: {}", close_err);
                }
                return Err(e);
            }
        };
        info!(model = %info.model_name, serial = %info.serial_number, "Device session opened");
        Ok(Self { device, info })
    }

    /// Identity read at open time.
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Shared access to the device.
    pub fn device(&self) -> &dyn CameraDevice {
        self.device.as_ref()
    }

    /// Exclusive access to the device.
    pub fn device_mut(&mut self) -> &mut dyn CameraDevice {
        self.device.as_mut()
    }

    /// Close explicitly, surfacing the close error instead of logging it.
    pub fn close(mut self) -> AppResult<()> {
        self.device.close()
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if !self.device.is_open() {
            return;
        }
        if let Err(e) = self.device.close() {
            warn!(model = %self.info.model_name, "Failed to close device: {}", e);
        }
    }
}
