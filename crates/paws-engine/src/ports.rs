//! Collaborator interfaces
//!
//! The engine owns the protocol rules; storage, the propagation model, the
//! clutter raster, device authorization and report delivery are supplied by
//! the host through these traits.

use async_trait::async_trait;
use paws_core::clutter::ClutterKey;
use paws_core::{
    BoundingBox, BroadcastStation, ChannelExclusion, DeviceDescriptor, DeviceExclusion,
    ExclusionEntry, FreeChannel, GeoPoint, IncumbentProfile, IncumbentRegistration,
    IncumbentType, InitializedDevice, LpAuxDetail, Result, SequenceState, UlsLicense,
    UsedSpectrumRecord, ValidatedDevice,
};

use crate::report::InterferenceReport;

/// Durable partitioned store for registrations, reference data and usage
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn sequence_state(&self, region_key: &str) -> Result<Option<SequenceState>>;

    /// Replace the sequence state only if it still equals `expected`.
    ///
    /// Returns `false` when another writer got there first.
    async fn compare_and_swap_sequence(
        &self,
        region_key: &str,
        expected: Option<SequenceState>,
        next: SequenceState,
    ) -> Result<bool>;

    async fn insert_incumbent(&self, registration: IncumbentRegistration) -> Result<()>;

    async fn find_fixed_device(&self, serial_number: &str) -> Result<Option<IncumbentRegistration>>;

    /// Registrations of one type, optionally only those owned by `owner_id`
    async fn incumbents_of(
        &self,
        kind: IncumbentType,
        owner_id: Option<&str>,
    ) -> Result<Vec<IncumbentRegistration>>;

    /// Delete by registration id; `false` when nothing matched
    async fn delete_incumbent(&self, kind: IncumbentType, reg_id: &str) -> Result<bool>;

    async fn insert_lp_aux_detail(&self, detail: LpAuxDetail) -> Result<()>;

    async fn delete_lp_aux_detail(&self, reg_id: &str) -> Result<bool>;

    async fn broadcast_stations(&self, call_sign: &str) -> Result<Vec<BroadcastStation>>;

    async fn is_waived_call_sign(&self, call_sign: &str) -> Result<bool>;

    async fn is_licensed_call_sign(&self, call_sign: &str) -> Result<bool>;

    async fn uls_licenses(&self, file_number: &str) -> Result<Vec<UlsLicense>>;

    async fn all_uls_licenses(&self) -> Result<Vec<UlsLicense>>;

    async fn licensed_call_signs(&self) -> Result<Vec<String>>;

    async fn insert_exclusion(&self, row_key: String, entry: ExclusionEntry) -> Result<()>;

    async fn channel_exclusions(&self) -> Result<Vec<ChannelExclusion>>;

    async fn device_exclusions(&self) -> Result<Vec<DeviceExclusion>>;

    async fn upsert_initialized_device(&self, device: InitializedDevice) -> Result<()>;

    async fn find_initialized_device(&self, device_id: &str) -> Result<Option<InitializedDevice>>;

    async fn initialized_devices(&self) -> Result<Vec<InitializedDevice>>;

    async fn validated_device(&self, device_id: &str) -> Result<Option<ValidatedDevice>>;

    async fn upsert_validated_device(&self, device: ValidatedDevice) -> Result<()>;

    async fn insert_used_spectrum(&self, record: UsedSpectrumRecord) -> Result<()>;

    /// Usage records whose device position lies inside `bbox`
    async fn used_spectrum_in(&self, bbox: &BoundingBox) -> Result<Vec<UsedSpectrumRecord>>;

    async fn latest_used_spectrum(&self, device_id: &str) -> Result<Option<UsedSpectrumRecord>>;
}

/// External geometry and propagation model
#[async_trait]
pub trait PropagationService: Send + Sync {
    /// Channels free for the profile, with the maximum permitted power of each
    async fn free_channels(&self, profile: &IncumbentProfile) -> Result<Vec<FreeChannel>>;

    /// Whether `point` lies in the station's protected contour or keyhole
    fn within_protection(&self, station: &BroadcastStation, point: &GeoPoint) -> bool {
        station.contour.contains(point)
            || station
                .keyhole
                .as_ref()
                .is_some_and(|keyhole| keyhole.contains(point))
    }

    fn distance_m(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        a.distance_m(b)
    }
}

/// Terrain-clutter raster
#[async_trait]
pub trait ClutterLookup: Send + Sync {
    /// Every raster record stored for the cell; may be more than one
    async fn lookup(&self, key: &ClutterKey) -> Result<Vec<Vec<f64>>>;
}

/// External device-authorization service
#[async_trait]
pub trait DeviceAuthority: Send + Sync {
    async fn authorize(&self, device: &DeviceDescriptor) -> Result<bool>;
}

/// Delivery of finished reports
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, report: &InterferenceReport, recipient: &str) -> Result<()>;
}
