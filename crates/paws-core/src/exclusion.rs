//! Administrative exclusion lists

use serde::{Deserialize, Serialize};

use crate::device::DeviceDescriptor;
use crate::geo::Shape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceExclusion {
    #[serde(default)]
    pub device_id: Option<String>,
    pub serial_number: String,
}

impl DeviceExclusion {
    pub fn matches(&self, device: &DeviceDescriptor) -> bool {
        if self.serial_number != device.serial_number {
            return false;
        }
        match &self.device_id {
            Some(id) => *id == device.device_id(),
            None => true,
        }
    }
}

/// Channels closed to new registrations inside the listed regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelExclusion {
    pub channels: Vec<u32>,
    pub regions: Vec<Shape>,
}

impl ChannelExclusion {
    /// True when `channel` is listed and any region overlaps any of `area`
    pub fn blocks(&self, channel: u32, area: &[Shape]) -> bool {
        self.channels.contains(&channel)
            && self
                .regions
                .iter()
                .any(|region| area.iter().any(|shape| region.intersects(shape)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExclusionEntry {
    Device(DeviceExclusion),
    Channel(ChannelExclusion),
}
