//! White-space device descriptors and device-side registry rows

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{GeoLocation, GeoPoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub serial_number: String,
    #[serde(default)]
    pub manufacturer_id: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub ruleset_ids: Vec<String>,
    #[serde(default)]
    pub etsi_en_device_type: Option<String>,
    #[serde(default)]
    pub etsi_en_device_emissions_class: Option<u8>,
    #[serde(default)]
    pub etsi_en_technology_id: Option<String>,
    #[serde(default)]
    pub etsi_en_device_category: Option<String>,
}

impl DeviceDescriptor {
    /// Registry key for a device: manufacturer plus serial number
    pub fn device_id(&self) -> String {
        format!("{}:{}", self.manufacturer_id, self.serial_number)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeightType {
    #[default]
    Agl,
    Amsl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntennaCharacteristics {
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub height_type: HeightType,
    #[serde(default)]
    pub height_uncertainty: f64,
}

/// Contact card for a registrant or device operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCard {
    pub name: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOwner {
    pub owner: ContactCard,
    #[serde(default)]
    pub operator: Option<ContactCard>,
}

/// Input to the propagation model for one availability computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncumbentProfile {
    pub device: DeviceDescriptor,
    pub location: GeoPoint,
    pub antenna: AntennaCharacteristics,
}

/// Row written by PAWS INIT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializedDevice {
    pub device_id: String,
    pub device: DeviceDescriptor,
    pub location: GeoLocation,
    pub initialized_at: DateTime<Utc>,
}

/// Cached outcome of a device-authorization check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedDevice {
    pub device_id: String,
    pub serial_number: String,
    pub last_validated: DateTime<Utc>,
}

impl ValidatedDevice {
    /// Freshness window of a cached validation
    pub fn ttl() -> Duration {
        Duration::days(1)
    }

    /// Stale once `now` is strictly past `last_validated + 1 day`
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now > self.last_validated + Self::ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validation_ttl_boundary() {
        let validated_at = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let row = ValidatedDevice {
            device_id: "acme:SN1".into(),
            serial_number: "SN1".into(),
            last_validated: validated_at,
        };

        assert!(!row.is_stale(validated_at + Duration::hours(23)));
        assert!(!row.is_stale(validated_at + Duration::hours(24)));
        assert!(row.is_stale(validated_at + Duration::hours(25)));
    }

    #[test]
    fn test_device_descriptor_from_paws_json() {
        let json = r#"{
            "serialNumber": "SN-0042",
            "manufacturerId": "acme",
            "modelId": "wsd-1",
            "rulesetIds": ["ETSI-EN-301-598-1.1.1"],
            "etsiEnDeviceType": "A",
            "etsiEnDeviceEmissionsClass": 3
        }"#;
        let device: DeviceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(device.device_id(), "acme:SN-0042");
        assert_eq!(device.etsi_en_device_emissions_class, Some(3));
        assert!(device.etsi_en_technology_id.is_none());
    }
}
