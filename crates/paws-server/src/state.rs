//! Shared server state

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use paws_engine::PawsEngine;

pub struct ServerState {
    pub engine: PawsEngine,
    /// Present when the process installed a Prometheus recorder
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<ServerState>;

pub fn create_shared_state(engine: PawsEngine, metrics: Option<PrometheusHandle>) -> SharedState {
    Arc::new(ServerState { engine, metrics })
}
