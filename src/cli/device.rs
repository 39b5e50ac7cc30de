use std::error::Error;

use tabled::{
    settings::{Panel, Style},
    Table, Tabled,
};

use crate::input::source::hidraw::{list_devices, DeviceSummary};

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "VID:PID")]
    id: String,
    #[tabled(rename = "Manufacturer")]
    manufacturer: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Controller")]
    controller: String,
}

impl From<&DeviceSummary> for DeviceRow {
    fn from(device: &DeviceSummary) -> Self {
        Self {
            path: device.path.clone(),
            id: format!("{:04x}:{:04x}", device.vendor_id, device.product_id),
            manufacturer: device.manufacturer.clone(),
            product: device.product.clone(),
            controller: if device.is_controller() { "yes" } else { "" }.to_string(),
        }
    }
}

pub fn handle_devices() -> Result<(), Box<dyn Error>> {
    let mut devices = list_devices()?;
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    let count = devices.len();

    let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("HID Devices"));
    println!("{table}");
    println!("{count} device(s) found");

    Ok(())
}
