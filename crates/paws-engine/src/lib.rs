//! paws-engine: the white-space database engine
//!
//! Implements the PAWS device operations, incumbent registration and the
//! operator interference query on top of the pure rules in `paws-core`.
//! Storage and the external models are reached through the traits in
//! [`ports`]; [`MemoryRegistry`] is the in-process store.

pub mod authority;
pub mod boundary;
pub mod config;
mod engine;
mod handlers;
mod interference;
pub mod memory;
pub mod ports;
mod queries;
pub mod report;
mod sequence;
mod workflow;

#[cfg(test)]
mod testing;

pub use authority::{AllowListAuthority, HttpDeviceAuthority};
pub use boundary::PawsOutcome;
pub use config::EngineConfig;
pub use engine::{EngineBuilder, PawsEngine};
pub use memory::MemoryRegistry;
pub use ports::{ClutterLookup, DeviceAuthority, NotificationSink, PropagationService, RegistryStore};
pub use report::{InterferenceReport, InterferenceRow};
pub use sequence::SequenceGenerator;
