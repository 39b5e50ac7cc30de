//! Raw HID devices read through hidapi. Only available with the `hidraw`
//! feature; device name matching is always available.

#[cfg(feature = "hidraw")]
use std::{ffi::CString, time::Duration};

#[cfg(feature = "hidraw")]
use hidapi::{HidApi, HidDevice, HidError};

#[cfg(feature = "hidraw")]
use super::ReportSource;
use super::InputError;

/// Devices whose manufacturer or product name contains one of these, in any
/// case, are considered game controllers
pub const CONTROLLER_KEYWORDS: [&str; 7] = [
    "Sony",
    "PlayStation",
    "Wireless Controller",
    "PowerA",
    "XBX",
    "Xbox",
    "Controller",
];

/// Largest input report read from a device
#[cfg(feature = "hidraw")]
const MAX_REPORT_SIZE: usize = 256;

/// Attached HID device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSummary {
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String,
    pub product: String,
}

impl DeviceSummary {
    /// Returns true if the device looks like a game controller
    pub fn is_controller(&self) -> bool {
        is_controller_name(&self.manufacturer) || is_controller_name(&self.product)
    }
}

/// Returns true if the given device name matches a known controller keyword,
/// ignoring case
pub fn is_controller_name(name: &str) -> bool {
    let name = name.to_lowercase();
    CONTROLLER_KEYWORDS
        .iter()
        .any(|keyword| name.contains(keyword.to_lowercase().as_str()))
}

/// Return the first controller among the given devices
pub fn find_controller(devices: &[DeviceSummary]) -> Option<&DeviceSummary> {
    devices.iter().find(|d| d.is_controller())
}

#[cfg(feature = "hidraw")]
impl From<HidError> for InputError {
    fn from(value: HidError) -> Self {
        InputError::Device(value.to_string())
    }
}

/// List all HID devices attached to the system
#[cfg(feature = "hidraw")]
pub fn list_devices() -> Result<Vec<DeviceSummary>, InputError> {
    let api = HidApi::new()?;
    let devices = api
        .device_list()
        .map(|info| DeviceSummary {
            path: info.path().to_string_lossy().to_string(),
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            manufacturer: info.manufacturer_string().unwrap_or_default().to_string(),
            product: info.product_string().unwrap_or_default().to_string(),
        })
        .collect();

    Ok(devices)
}

#[cfg(not(feature = "hidraw"))]
pub fn list_devices() -> Result<Vec<DeviceSummary>, InputError> {
    Err(InputError::Device(
        "built without hidraw support".to_string(),
    ))
}

/// [HidrawSource] reads input reports from a HID device
#[cfg(feature = "hidraw")]
pub struct HidrawSource {
    device: HidDevice,
    name: String,
    buf: Vec<u8>,
}

#[cfg(feature = "hidraw")]
impl HidrawSource {
    /// Open the device at the given hidraw path (e.g. "/dev/hidraw3")
    pub fn open(path: &str) -> Result<Self, InputError> {
        let c_path = CString::new(path).map_err(|e| InputError::Device(e.to_string()))?;
        let api = HidApi::new()?;
        let device = api.open_path(&c_path)?;
        let info = device.get_device_info()?;
        let name = format!(
            "{} ({:04x}:{:04x})",
            info.product_string().unwrap_or(path),
            info.vendor_id(),
            info.product_id()
        );
        log::info!("Opened {name} at {path}");

        Ok(Self {
            device,
            name,
            buf: vec![0; MAX_REPORT_SIZE],
        })
    }

    /// Open the first attached device that looks like a game controller
    pub fn open_first_controller() -> Result<Self, InputError> {
        let devices = list_devices()?;
        let Some(device) = find_controller(&devices) else {
            return Err(InputError::NotFound);
        };
        log::debug!("Found controller: {device:?}");
        Self::open(&device.path)
    }
}

#[cfg(feature = "hidraw")]
impl ReportSource for HidrawSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn read_report(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, InputError> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let bytes_read = self.device.read_timeout(&mut self.buf[..], timeout_ms)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf[..bytes_read].to_vec()))
    }
}
