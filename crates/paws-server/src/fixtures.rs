//! Table-driven collaborators for running the server without external models
//!
//! A fixtures file seeds the in-memory registry with reference data (broadcast
//! stations, waivers, licensed call signs, ULS licenses) and supplies the
//! free-channel table and clutter records the server answers from.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use paws_core::clutter::ClutterKey;
use paws_core::{BroadcastStation, FreeChannel, IncumbentProfile, Result, UlsLicense};
use paws_engine::report::InterferenceReport;
use paws_engine::{
    AllowListAuthority, ClutterLookup, DeviceAuthority, EngineConfig, HttpDeviceAuthority,
    MemoryRegistry, NotificationSink, PawsEngine, PropagationService,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixtures {
    pub stations: Vec<BroadcastStation>,
    pub waived_call_signs: Vec<String>,
    pub licensed_call_signs: Vec<String>,
    pub uls_licenses: Vec<UlsLicense>,
    /// Channels reported free at every location
    pub free_channels: Vec<FreeChannel>,
    /// Clutter records returned for every cell
    pub clutter: Vec<Vec<f64>>,
    /// Serials accepted when no remote authority is configured
    pub authorized_serials: Vec<String>,
}

impl Fixtures {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub async fn seed(&self, store: &MemoryRegistry) {
        for station in &self.stations {
            store.add_broadcast_station(station.clone()).await;
        }
        for call_sign in &self.waived_call_signs {
            store.waive_call_sign(call_sign).await;
        }
        for call_sign in &self.licensed_call_signs {
            store.add_licensed_call_sign(call_sign).await;
        }
        for license in &self.uls_licenses {
            store.add_uls_license(license.clone()).await;
        }
        tracing::info!(
            stations = self.stations.len(),
            licensed = self.licensed_call_signs.len(),
            uls = self.uls_licenses.len(),
            "Registry seeded from fixtures"
        );
    }

    /// Build an engine over a seeded in-memory registry
    pub async fn engine(&self, config: EngineConfig) -> Result<(PawsEngine, Arc<MemoryRegistry>)> {
        let store = Arc::new(MemoryRegistry::new());
        self.seed(&store).await;

        let authority: Arc<dyn DeviceAuthority> = match &config.device_authority_url {
            Some(url) => Arc::new(HttpDeviceAuthority::new(url)),
            None => Arc::new(AllowListAuthority::new(self.authorized_serials.clone())),
        };

        let engine = PawsEngine::builder(config)
            .store(store.clone())
            .propagation(Arc::new(TablePropagation::new(self.free_channels.clone())))
            .clutter(Arc::new(TableClutter::new(self.clutter.clone())))
            .authority(authority)
            .sink(Arc::new(LogSink))
            .build()?;
        Ok((engine, store))
    }
}

/// Propagation stand-in answering every location from one channel table
pub struct TablePropagation {
    channels: Vec<FreeChannel>,
}

impl TablePropagation {
    pub fn new(channels: Vec<FreeChannel>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl PropagationService for TablePropagation {
    async fn free_channels(&self, profile: &IncumbentProfile) -> Result<Vec<FreeChannel>> {
        tracing::trace!(serial = %profile.device.serial_number, "Answering from channel table");
        Ok(self.channels.clone())
    }
}

pub struct TableClutter {
    records: Vec<Vec<f64>>,
}

impl TableClutter {
    pub fn new(records: Vec<Vec<f64>>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ClutterLookup for TableClutter {
    async fn lookup(&self, _key: &ClutterKey) -> Result<Vec<Vec<f64>>> {
        Ok(self.records.clone())
    }
}

/// Delivers reports by logging where they were written
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, report: &InterferenceReport, recipient: &str) -> Result<()> {
        tracing::info!(
            recipient,
            path = %report.path.display(),
            rows = report.rows.len(),
            "Interference report ready"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paws_engine::RegistryStore;
    use std::io::Write;

    #[tokio::test]
    async fn test_fixtures_seed_registry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "licensedCallSigns": ["WQAB123"],
                "ulsLicenses": [{{
                    "fileNumber": "0001234567",
                    "venueName": "Arena",
                    "expiration": "2030-01-01T00:00:00Z"
                }}],
                "authorizedSerials": ["SN-1"]
            }}"#
        )
        .unwrap();

        let fixtures = Fixtures::load(file.path()).unwrap();
        let (_engine, store) = fixtures.engine(EngineConfig::default()).await.unwrap();

        assert!(store.is_licensed_call_sign("wqab123").await.unwrap());
        assert_eq!(store.uls_licenses("0001234567").await.unwrap().len(), 1);
    }
}
