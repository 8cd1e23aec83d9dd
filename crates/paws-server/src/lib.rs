//! paws-server: HTTP edge for the white-space database
//!
//! Serves the PAWS device protocol as JSON-RPC on `/paws` and the operator
//! API under `/admin`, with health and Prometheus endpoints alongside.

pub mod error;
pub mod fixtures;
pub mod metrics;
pub mod routes;
pub mod rpc;
pub mod state;

pub use error::ServerError;
pub use fixtures::{Fixtures, LogSink, TableClutter, TablePropagation};
pub use metrics::init_prometheus_recorder;
pub use routes::create_router;
pub use rpc::{RpcError, RpcRequest, RpcResponse};
pub use state::{create_shared_state, ServerState, SharedState};
