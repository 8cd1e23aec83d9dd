//! Spectrum-usage notifications kept for audit and interference queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{AntennaCharacteristics, DeviceDescriptor};
use crate::geo::{GeoLocation, GeoPoint};
use crate::spectrum::{EventTime, Spectrum, SpectrumSchedule};

/// One notified `Spectrum` with the schedule it was validated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedSpectrumRecord {
    pub row_key: String,
    pub device_id: String,
    pub device: DeviceDescriptor,
    pub location: GeoLocation,
    #[serde(default)]
    pub antenna: AntennaCharacteristics,
    #[serde(default)]
    pub master_device: Option<DeviceDescriptor>,
    #[serde(default)]
    pub master_location: Option<GeoLocation>,
    pub spectrum: Spectrum,
    pub schedule: SpectrumSchedule,
    pub event_time: EventTime,
    pub notified_at: DateTime<Utc>,
}

impl UsedSpectrumRecord {
    pub fn position(&self) -> Option<GeoPoint> {
        self.location.center()
    }

    /// Channel ids of the notified profiles, resolved through the stored schedule
    pub fn channels_in_use(&self) -> Vec<String> {
        let mut channels: Vec<String> = self
            .spectrum
            .profiles
            .iter()
            .filter_map(|p| self.schedule.profile_at(p.hz))
            .map(|p| p.channel_id.clone())
            .collect();
        channels.dedup();
        channels
    }
}
