//! Test doubles for the engine's collaborators

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use paws_core::clutter::ClutterKey;
use paws_core::{
    ContactCard, DeviceDescriptor, Error, FreeChannel, GeoPoint, IncumbentProfile, Polygon,
    RegionContext, Result,
};

use crate::config::EngineConfig;
use crate::engine::PawsEngine;
use crate::memory::MemoryRegistry;
use crate::ports::{ClutterLookup, DeviceAuthority, NotificationSink, PropagationService};
use crate::report::InterferenceReport;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 20, 9, 30, 0).unwrap()
}

pub fn context() -> RegionContext {
    RegionContext::new("WSDB", "GB", now())
}

pub fn channel(channel: u32, bandwidth: f64, dbm: f64) -> FreeChannel {
    let start_hz = 470e6 + f64::from(channel - 21) * 8e6;
    FreeChannel {
        channel,
        start_hz,
        stop_hz: start_hz + 8e6,
        bandwidth,
        max_power_dbm: dbm,
    }
}

pub fn device(serial: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        serial_number: serial.to_string(),
        manufacturer_id: "acme".to_string(),
        model_id: "wsd-1".to_string(),
        ruleset_ids: vec!["ETSI-EN-301-598-1.1.1".to_string()],
        etsi_en_device_type: Some("A".to_string()),
        etsi_en_device_emissions_class: Some(3),
        etsi_en_technology_id: Some("LTE".to_string()),
        etsi_en_device_category: Some("master".to_string()),
    }
}

pub fn contact() -> ContactCard {
    ContactCard {
        name: "Registrant".to_string(),
        email: "registrant@example.org".to_string(),
        ..Default::default()
    }
}

pub fn square(lat: f64, lon: f64, size: f64) -> Polygon {
    Polygon::new(vec![
        GeoPoint::new(lat, lon),
        GeoPoint::new(lat, lon + size),
        GeoPoint::new(lat + size, lon + size),
        GeoPoint::new(lat + size, lon),
    ])
}

/// Propagation model returning a fixed channel list
#[derive(Default)]
pub struct FixedPropagation {
    channels: Mutex<Vec<FreeChannel>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl FixedPropagation {
    pub fn new(channels: Vec<FreeChannel>) -> Self {
        Self {
            channels: Mutex::new(channels),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PropagationService for FixedPropagation {
    async fn free_channels(&self, _profile: &IncumbentProfile) -> Result<Vec<FreeChannel>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Propagation("model offline".to_string()));
        }
        Ok(self.channels.lock().unwrap().clone())
    }
}

/// Clutter raster with per-cell records; unknown cells return nothing
#[derive(Default)]
pub struct StaticClutter {
    cells: Mutex<HashMap<ClutterKey, Vec<Vec<f64>>>>,
    default_records: Mutex<Vec<Vec<f64>>>,
    keys: Mutex<Vec<ClutterKey>>,
}

impl StaticClutter {
    pub fn everywhere(records: Vec<Vec<f64>>) -> Self {
        Self {
            default_records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<ClutterKey> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClutterLookup for StaticClutter {
    async fn lookup(&self, key: &ClutterKey) -> Result<Vec<Vec<f64>>> {
        self.keys.lock().unwrap().push(*key);
        let cells = self.cells.lock().unwrap();
        Ok(cells
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default_records.lock().unwrap().clone()))
    }
}

/// Device authority with a fixed verdict that counts its calls
pub struct CountingAuthority {
    valid: AtomicBool,
    calls: AtomicUsize,
}

impl CountingAuthority {
    pub fn new(valid: bool) -> Self {
        Self {
            valid: AtomicBool::new(valid),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceAuthority for CountingAuthority {
    async fn authorize(&self, _device: &DeviceDescriptor) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.valid.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(InterferenceReport, String)>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<(InterferenceReport, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, report: &InterferenceReport, recipient: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((report.clone(), recipient.to_string()));
        Ok(())
    }
}

/// Engine wired to in-memory collaborators, with handles kept for assertions
pub struct Harness {
    pub engine: PawsEngine,
    pub store: Arc<MemoryRegistry>,
    pub propagation: Arc<FixedPropagation>,
    pub clutter: Arc<StaticClutter>,
    pub authority: Arc<CountingAuthority>,
    pub sink: Arc<RecordingSink>,
    pub report_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(channels: Vec<FreeChannel>) -> Self {
        Self::with_propagation(FixedPropagation::new(channels))
    }

    pub fn with_propagation(propagation: FixedPropagation) -> Self {
        let report_dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            report_dir: report_dir.path().to_path_buf(),
            ..EngineConfig::default()
        };

        let store = Arc::new(MemoryRegistry::new());
        let propagation = Arc::new(propagation);
        let clutter = Arc::new(StaticClutter::default());
        let authority = Arc::new(CountingAuthority::new(true));
        let sink = Arc::new(RecordingSink::default());

        let engine = PawsEngine::builder(config)
            .store(store.clone())
            .propagation(propagation.clone())
            .clutter(clutter.clone())
            .authority(authority.clone())
            .sink(sink.clone())
            .build()
            .unwrap();

        Self {
            engine,
            store,
            propagation,
            clutter,
            authority,
            sink,
            report_dir,
        }
    }

    pub fn with_clutter(mut self, clutter: StaticClutter) -> Self {
        let clutter = Arc::new(clutter);
        self.engine.clutter = clutter.clone();
        self.clutter = clutter;
        self
    }
}
