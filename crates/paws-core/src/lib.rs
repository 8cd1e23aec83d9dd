//! paws-core: data model and pure rules for the white-space database
//!
//! This crate holds everything that does not need I/O:
//! - PAWS wire types (device descriptors, spectrum schedules, rule sets)
//! - Incumbent registration records and their field validation
//! - Geometry helpers (great-circle distance, polygon containment/overlap,
//!   national-grid projection)
//! - Clutter height banding and per-channel merging
//! - The error taxonomy and the protocol status codes it maps onto
//!
//! Collaborators (registry store, propagation model, clutter raster) live
//! behind traits in `paws-engine`.

pub mod clutter;
pub mod codes;
mod context;
pub mod device;
mod error;
pub mod exclusion;
pub mod geo;
pub mod incumbent;
pub mod paws;
pub mod spectrum;
pub mod usage;
pub mod validate;

pub use context::RegionContext;
pub use device::{
    AntennaCharacteristics, ContactCard, DeviceDescriptor, DeviceOwner, HeightType,
    IncumbentProfile, InitializedDevice, ValidatedDevice,
};
pub use error::{Error, ErrorKind};
pub use exclusion::{ChannelExclusion, DeviceExclusion, ExclusionEntry};
pub use geo::{BoundingBox, Ellipse, GeoLocation, GeoPoint, GridRef, Polygon, Shape};
pub use incumbent::{
    BroadcastStation, DeleteOutcome, DispositionAction, IncumbentDetails, IncumbentParameters,
    IncumbentRegistration, IncumbentType, LpAuxDetail, LpAuxLicenseInfo, RegistrationDisposition,
    RegistrationResult, SequenceState, TimeWindow, UlsLicense,
};
pub use spectrum::{
    ChannelPlan, EventTime, FreeChannel, GeoSpectrumSpec, RulesetInfo, Spectrum,
    SpectrumProfile, SpectrumSchedule, SpectrumSpec,
};
pub use usage::UsedSpectrumRecord;
pub use validate::FieldError;

pub type Result<T> = std::result::Result<T, Error>;
