//! PAWS request bodies and the operator-side request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{AntennaCharacteristics, DeviceDescriptor, DeviceOwner, IncumbentProfile};
use crate::geo::{GeoLocation, GeoPoint, Shape};
use crate::incumbent::IncumbentType;
use crate::spectrum::Spectrum;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesetInfoRequest {
    pub device_desc: DeviceDescriptor,
    #[serde(default)]
    pub location: Option<GeoLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSpectrumRequest {
    pub device_desc: DeviceDescriptor,
    pub location: GeoLocation,
    #[serde(default)]
    pub antenna: AntennaCharacteristics,
    #[serde(default)]
    pub owner: Option<DeviceOwner>,
    #[serde(default)]
    pub master_device_desc: Option<DeviceDescriptor>,
    #[serde(default)]
    pub master_device_location: Option<GeoLocation>,
}

impl AvailableSpectrumRequest {
    pub fn incumbent_profile(&self) -> Result<IncumbentProfile> {
        profile_at(&self.device_desc, &self.location, &self.antenna)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSpectrumBatchRequest {
    pub device_desc: DeviceDescriptor,
    pub locations: Vec<GeoLocation>,
    #[serde(default)]
    pub antenna: AntennaCharacteristics,
    #[serde(default)]
    pub master_device_desc: Option<DeviceDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub device_desc: DeviceDescriptor,
    pub location: GeoLocation,
    pub device_owner: DeviceOwner,
    #[serde(default)]
    pub antenna: AntennaCharacteristics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    pub device_desc: DeviceDescriptor,
    pub location: GeoLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceValidityRequest {
    pub device_descs: Vec<DeviceDescriptor>,
    #[serde(default)]
    pub master_device_desc: Option<DeviceDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifySpectrumUseRequest {
    pub device_desc: DeviceDescriptor,
    pub location: GeoLocation,
    #[serde(default)]
    pub antenna: AntennaCharacteristics,
    #[serde(default)]
    pub master_device_desc: Option<DeviceDescriptor>,
    #[serde(default)]
    pub master_device_location: Option<GeoLocation>,
    pub spectra: Vec<Spectrum>,
}

impl NotifySpectrumUseRequest {
    /// Availability request for the notifying device at its current location
    pub fn availability_request(&self) -> AvailableSpectrumRequest {
        AvailableSpectrumRequest {
            device_desc: self.device_desc.clone(),
            location: self.location.clone(),
            antenna: self.antenna,
            owner: None,
            master_device_desc: self.master_device_desc.clone(),
            master_device_location: self.master_device_location.clone(),
        }
    }
}

/// Operator query for devices operating around a victim receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterferenceQueryRequest {
    pub location: GeoPoint,
    pub radius_m: f64,
    pub requestor: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIncumbentRequest {
    pub incumbent_type: IncumbentType,
    pub reg_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludeIdsRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    pub serial_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludeChannelsRequest {
    pub channels: Vec<u32>,
    pub regions: Vec<Shape>,
}

/// Incumbent profile for a device at `location`
pub fn profile_at(
    device: &DeviceDescriptor,
    location: &GeoLocation,
    antenna: &AntennaCharacteristics,
) -> Result<IncumbentProfile> {
    let point = location
        .center()
        .filter(|p| p.is_valid())
        .ok_or_else(|| Error::invalid("location", "must contain a valid point or region"))?;
    Ok(IncumbentProfile {
        device: device.clone(),
        location: point,
        antenna: *antenna,
    })
}
