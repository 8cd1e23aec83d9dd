//! In-memory registry store
//!
//! Backs the development server and the test suite. Every table sits behind a
//! single `RwLock`, so the sequence compare-and-swap is trivially atomic.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use paws_core::{
    BoundingBox, BroadcastStation, ChannelExclusion, DeviceExclusion, Error, ExclusionEntry,
    IncumbentRegistration, IncumbentType, InitializedDevice, LpAuxDetail, Result, SequenceState,
    UlsLicense, UsedSpectrumRecord, ValidatedDevice,
};
use tokio::sync::RwLock;

use crate::ports::RegistryStore;

#[derive(Debug, Default)]
struct Tables {
    sequences: HashMap<String, SequenceState>,
    incumbents: HashMap<IncumbentType, BTreeMap<String, IncumbentRegistration>>,
    lp_aux_details: BTreeMap<String, LpAuxDetail>,
    stations: Vec<BroadcastStation>,
    waivers: HashSet<String>,
    licensed_call_signs: HashSet<String>,
    uls_licenses: Vec<UlsLicense>,
    exclusions: BTreeMap<String, ExclusionEntry>,
    initialized: HashMap<String, InitializedDevice>,
    validated: HashMap<String, ValidatedDevice>,
    used_spectrum: Vec<UsedSpectrumRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    tables: RwLock<Tables>,
    offline: AtomicBool,
}

fn normalize_call_sign(call_sign: &str) -> String {
    call_sign.trim().to_ascii_uppercase()
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent store call fail, as if the backing service were down
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Store("registry store unavailable".to_string()));
        }
        Ok(())
    }

    pub async fn add_broadcast_station(&self, station: BroadcastStation) {
        self.tables.write().await.stations.push(station);
    }

    pub async fn waive_call_sign(&self, call_sign: &str) {
        self.tables
            .write()
            .await
            .waivers
            .insert(normalize_call_sign(call_sign));
    }

    pub async fn add_licensed_call_sign(&self, call_sign: &str) {
        self.tables
            .write()
            .await
            .licensed_call_signs
            .insert(normalize_call_sign(call_sign));
    }

    pub async fn add_uls_license(&self, license: UlsLicense) {
        self.tables.write().await.uls_licenses.push(license);
    }

    pub async fn incumbents(&self, kind: IncumbentType) -> Vec<IncumbentRegistration> {
        self.tables
            .read()
            .await
            .incumbents
            .get(&kind)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn lp_aux_detail(&self, reg_id: &str) -> Option<LpAuxDetail> {
        self.tables.read().await.lp_aux_details.get(reg_id).cloned()
    }

    pub async fn exclusions(&self) -> Vec<ExclusionEntry> {
        self.tables.read().await.exclusions.values().cloned().collect()
    }

    pub async fn used_spectrum_records(&self) -> Vec<UsedSpectrumRecord> {
        self.tables.read().await.used_spectrum.clone()
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistry {
    async fn sequence_state(&self, region_key: &str) -> Result<Option<SequenceState>> {
        self.check_online()?;
        Ok(self.tables.read().await.sequences.get(region_key).copied())
    }

    async fn compare_and_swap_sequence(
        &self,
        region_key: &str,
        expected: Option<SequenceState>,
        next: SequenceState,
    ) -> Result<bool> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.sequences.get(region_key).copied() != expected {
            return Ok(false);
        }
        tables.sequences.insert(region_key.to_string(), next);
        Ok(true)
    }

    async fn insert_incumbent(&self, registration: IncumbentRegistration) -> Result<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        tables
            .incumbents
            .entry(registration.incumbent_type())
            .or_default()
            .insert(registration.reg_id().to_string(), registration);
        Ok(())
    }

    async fn find_fixed_device(&self, serial_number: &str) -> Result<Option<IncumbentRegistration>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .incumbents
            .get(&IncumbentType::FixedTvbd)
            .and_then(|rows| {
                rows.values()
                    .find(|r| r.serial_number() == Some(serial_number))
            })
            .cloned())
    }

    async fn incumbents_of(
        &self,
        kind: IncumbentType,
        owner_id: Option<&str>,
    ) -> Result<Vec<IncumbentRegistration>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        Ok(tables
            .incumbents
            .get(&kind)
            .map(|rows| {
                rows.values()
                    .filter(|r| owner_id.map_or(true, |id| r.owner_id == id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_incumbent(&self, kind: IncumbentType, reg_id: &str) -> Result<bool> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .incumbents
            .get_mut(&kind)
            .and_then(|rows| rows.remove(reg_id))
            .is_some())
    }

    async fn insert_lp_aux_detail(&self, detail: LpAuxDetail) -> Result<()> {
        self.check_online()?;
        self.tables
            .write()
            .await
            .lp_aux_details
            .insert(detail.reg_id.clone(), detail);
        Ok(())
    }

    async fn delete_lp_aux_detail(&self, reg_id: &str) -> Result<bool> {
        self.check_online()?;
        Ok(self
            .tables
            .write()
            .await
            .lp_aux_details
            .remove(reg_id)
            .is_some())
    }

    async fn broadcast_stations(&self, call_sign: &str) -> Result<Vec<BroadcastStation>> {
        self.check_online()?;
        let wanted = normalize_call_sign(call_sign);
        Ok(self
            .tables
            .read()
            .await
            .stations
            .iter()
            .filter(|s| normalize_call_sign(&s.call_sign) == wanted)
            .cloned()
            .collect())
    }

    async fn is_waived_call_sign(&self, call_sign: &str) -> Result<bool> {
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .await
            .waivers
            .contains(&normalize_call_sign(call_sign)))
    }

    async fn is_licensed_call_sign(&self, call_sign: &str) -> Result<bool> {
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .await
            .licensed_call_signs
            .contains(&normalize_call_sign(call_sign)))
    }

    async fn uls_licenses(&self, file_number: &str) -> Result<Vec<UlsLicense>> {
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .await
            .uls_licenses
            .iter()
            .filter(|l| l.file_number == file_number.trim())
            .cloned()
            .collect())
    }

    async fn all_uls_licenses(&self) -> Result<Vec<UlsLicense>> {
        self.check_online()?;
        Ok(self.tables.read().await.uls_licenses.clone())
    }

    async fn licensed_call_signs(&self) -> Result<Vec<String>> {
        self.check_online()?;
        let mut call_signs: Vec<String> = self
            .tables
            .read()
            .await
            .licensed_call_signs
            .iter()
            .cloned()
            .collect();
        call_signs.sort();
        Ok(call_signs)
    }

    async fn insert_exclusion(&self, row_key: String, entry: ExclusionEntry) -> Result<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.exclusions.contains_key(&row_key) {
            return Err(Error::Store(format!("duplicate exclusion row key {row_key}")));
        }
        tables.exclusions.insert(row_key, entry);
        Ok(())
    }

    async fn channel_exclusions(&self) -> Result<Vec<ChannelExclusion>> {
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .await
            .exclusions
            .values()
            .filter_map(|e| match e {
                ExclusionEntry::Channel(c) => Some(c.clone()),
                ExclusionEntry::Device(_) => None,
            })
            .collect())
    }

    async fn device_exclusions(&self) -> Result<Vec<DeviceExclusion>> {
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .await
            .exclusions
            .values()
            .filter_map(|e| match e {
                ExclusionEntry::Device(d) => Some(d.clone()),
                ExclusionEntry::Channel(_) => None,
            })
            .collect())
    }

    async fn upsert_initialized_device(&self, device: InitializedDevice) -> Result<()> {
        self.check_online()?;
        self.tables
            .write()
            .await
            .initialized
            .insert(device.device_id.clone(), device);
        Ok(())
    }

    async fn find_initialized_device(&self, device_id: &str) -> Result<Option<InitializedDevice>> {
        self.check_online()?;
        Ok(self.tables.read().await.initialized.get(device_id).cloned())
    }

    async fn initialized_devices(&self) -> Result<Vec<InitializedDevice>> {
        self.check_online()?;
        let mut devices: Vec<InitializedDevice> =
            self.tables.read().await.initialized.values().cloned().collect();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(devices)
    }

    async fn validated_device(&self, device_id: &str) -> Result<Option<ValidatedDevice>> {
        self.check_online()?;
        Ok(self.tables.read().await.validated.get(device_id).cloned())
    }

    async fn upsert_validated_device(&self, device: ValidatedDevice) -> Result<()> {
        self.check_online()?;
        self.tables
            .write()
            .await
            .validated
            .insert(device.device_id.clone(), device);
        Ok(())
    }

    async fn insert_used_spectrum(&self, record: UsedSpectrumRecord) -> Result<()> {
        self.check_online()?;
        self.tables.write().await.used_spectrum.push(record);
        Ok(())
    }

    async fn used_spectrum_in(&self, bbox: &BoundingBox) -> Result<Vec<UsedSpectrumRecord>> {
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .await
            .used_spectrum
            .iter()
            .filter(|r| r.position().is_some_and(|p| bbox.contains(&p)))
            .cloned()
            .collect())
    }

    async fn latest_used_spectrum(&self, device_id: &str) -> Result<Option<UsedSpectrumRecord>> {
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .await
            .used_spectrum
            .iter()
            .filter(|r| r.device_id == device_id)
            .max_by_key(|r| r.notified_at)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_compare_and_swap_rejects_stale_expectation() {
        let store = MemoryRegistry::new();
        let day = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let first = SequenceState { date: day, counter: 1 };

        assert!(store.compare_and_swap_sequence("GB", None, first).await.unwrap());
        assert!(!store.compare_and_swap_sequence("GB", None, first).await.unwrap());

        let second = SequenceState { date: day, counter: 2 };
        assert!(store
            .compare_and_swap_sequence("GB", Some(first), second)
            .await
            .unwrap());
        assert_eq!(store.sequence_state("GB").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_call_sign_lookup_ignores_case() {
        let store = MemoryRegistry::new();
        store.add_licensed_call_sign("wqab123").await;
        assert!(store.is_licensed_call_sign("WQAB123").await.unwrap());
        assert!(!store.is_licensed_call_sign("WQAB124").await.unwrap());
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = MemoryRegistry::new();
        store.set_offline(true);
        let err = store.sequence_state("GB").await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}
