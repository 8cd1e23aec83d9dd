//! Incumbent registrations and the reference data used to gate them

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{AntennaCharacteristics, ContactCard, DeviceDescriptor, DeviceOwner};
use crate::geo::{GeoLocation, GeoPoint, Polygon, Shape};

/// Width of the zero-padded sequence suffix of a registration id
pub const SEQUENCE_WIDTH: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncumbentType {
    #[serde(rename = "MVPD")]
    Mvpd,
    #[serde(rename = "TBAS")]
    TempBas,
    #[serde(rename = "LPAux")]
    LicensedLpAux,
    #[serde(rename = "UnlicensedLPAux")]
    UnlicensedLpAux,
    #[serde(rename = "FixedTVBD")]
    FixedTvbd,
}

impl IncumbentType {
    /// Storage partition holding registrations of this type
    pub fn table(&self) -> &'static str {
        match self {
            IncumbentType::Mvpd => "MVPDRegistration",
            IncumbentType::TempBas => "TempBASRegistration",
            IncumbentType::LicensedLpAux => "LPAuxRegistration",
            IncumbentType::UnlicensedLpAux => "UnlicensedLPAuxRegistration",
            IncumbentType::FixedTvbd => "FixedTVBDRegistration",
        }
    }

    /// Whether registrations of this type keep a denormalized detail row
    pub fn has_detail(&self) -> bool {
        matches!(
            self,
            IncumbentType::LicensedLpAux | IncumbentType::UnlicensedLpAux
        )
    }
}

impl fmt::Display for IncumbentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IncumbentType::Mvpd => "MVPD",
            IncumbentType::TempBas => "TBAS",
            IncumbentType::LicensedLpAux => "LPAux",
            IncumbentType::UnlicensedLpAux => "UnlicensedLPAux",
            IncumbentType::FixedTvbd => "FixedTVBD",
        };
        f.write_str(name)
    }
}

/// New or replacement registration; serialized as `1` / `2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DispositionAction {
    New,
    Update,
}

impl DispositionAction {
    pub fn code(&self) -> u8 {
        match self {
            DispositionAction::New => 1,
            DispositionAction::Update => 2,
        }
    }
}

impl From<DispositionAction> for u8 {
    fn from(action: DispositionAction) -> Self {
        action.code()
    }
}

impl TryFrom<u8> for DispositionAction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DispositionAction::New),
            2 => Ok(DispositionAction::Update),
            other => Err(format!("unknown disposition action {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDisposition {
    pub reg_id: String,
    pub reg_date: DateTime<Utc>,
    pub action: DispositionAction,
}

/// `YYMMDD` + org code + 7-digit zero-padded sequence
pub fn format_reg_id(date: NaiveDate, org_code: &str, sequence: u32) -> String {
    format!(
        "{}{}{:0width$}",
        date.format("%y%m%d"),
        org_code,
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Per-region registration counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceState {
    pub date: NaiveDate,
    pub counter: u32,
}

impl SequenceState {
    /// State after issuing the next number on `today`.
    ///
    /// A stored date later than `today` belongs to a request stamped after
    /// midnight that committed first; the counter carries on from it.
    pub fn advance(current: Option<&SequenceState>, today: NaiveDate) -> SequenceState {
        match current {
            Some(state) if state.date >= today => SequenceState {
                date: state.date,
                counter: state.counter + 1,
            },
            _ => SequenceState {
                date: today,
                counter: 1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Cable headend receive site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MvpdParams {
    pub contact: ContactCard,
    pub call_sign: String,
    pub channel: u32,
    pub receive_location: GeoPoint,
    #[serde(default)]
    pub transmitter_location: Option<GeoPoint>,
    #[serde(default)]
    pub events: Vec<TimeWindow>,
}

/// Temporary broadcast auxiliary link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempBasParams {
    pub contact: ContactCard,
    #[serde(default)]
    pub call_sign: Option<String>,
    pub channel: u32,
    pub receive_location: GeoPoint,
    pub transmit_location: GeoPoint,
    pub events: Vec<TimeWindow>,
}

/// Licensed low-power auxiliary (wireless microphone) venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LpAuxParams {
    pub contact: ContactCard,
    pub call_sign: String,
    pub channel: u32,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub points: Vec<GeoPoint>,
    #[serde(default)]
    pub quadrilateral: Option<Vec<GeoPoint>>,
    pub events: Vec<TimeWindow>,
}

/// Unlicensed low-power auxiliary venue, backed by a ULS license record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlicensedLpAuxParams {
    pub contact: ContactCard,
    pub uls_file_number: String,
    pub venue_name: String,
    pub channel: u32,
    #[serde(default)]
    pub points: Vec<GeoPoint>,
    #[serde(default)]
    pub quadrilateral: Option<Vec<GeoPoint>>,
    pub events: Vec<TimeWindow>,
}

/// Footprint of an LP-Aux venue: its points and optional keyhole quadrilateral
pub fn lp_aux_shapes(points: &[GeoPoint], quadrilateral: Option<&Vec<GeoPoint>>) -> Vec<Shape> {
    let mut shapes = Vec::new();
    match points {
        [] => {}
        [single] => shapes.push(Shape::Point(*single)),
        many => shapes.push(Shape::MultiPoint(many.to_vec())),
    }
    if let Some(corners) = quadrilateral {
        shapes.push(Shape::Polygon(Polygon::new(corners.clone())));
    }
    shapes
}

/// Registration request for one incumbent, tagged by type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "incumbentType")]
pub enum IncumbentParameters {
    #[serde(rename = "MVPD")]
    Mvpd(MvpdParams),
    #[serde(rename = "TBAS")]
    TempBas(TempBasParams),
    #[serde(rename = "LPAux")]
    LicensedLpAux(LpAuxParams),
    #[serde(rename = "UnlicensedLPAux")]
    UnlicensedLpAux(UnlicensedLpAuxParams),
}

impl IncumbentParameters {
    pub fn incumbent_type(&self) -> IncumbentType {
        match self {
            IncumbentParameters::Mvpd(_) => IncumbentType::Mvpd,
            IncumbentParameters::TempBas(_) => IncumbentType::TempBas,
            IncumbentParameters::LicensedLpAux(_) => IncumbentType::LicensedLpAux,
            IncumbentParameters::UnlicensedLpAux(_) => IncumbentType::UnlicensedLpAux,
        }
    }
}

/// Type-specific part of a stored registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "incumbentType")]
pub enum IncumbentDetails {
    #[serde(rename = "MVPD", rename_all = "camelCase")]
    Mvpd {
        call_sign: String,
        transmitter_location: Option<GeoPoint>,
    },
    #[serde(rename = "TBAS", rename_all = "camelCase")]
    TempBas { call_sign: Option<String> },
    #[serde(rename = "LPAux", rename_all = "camelCase")]
    LicensedLpAux {
        call_sign: String,
        venue_name: Option<String>,
    },
    #[serde(rename = "UnlicensedLPAux", rename_all = "camelCase")]
    UnlicensedLpAux {
        uls_file_number: String,
        venue_name: String,
    },
    #[serde(rename = "FixedTVBD", rename_all = "camelCase")]
    FixedTvbd {
        device: DeviceDescriptor,
        location: GeoLocation,
        antenna: AntennaCharacteristics,
        owner: DeviceOwner,
    },
}

impl IncumbentDetails {
    pub fn incumbent_type(&self) -> IncumbentType {
        match self {
            IncumbentDetails::Mvpd { .. } => IncumbentType::Mvpd,
            IncumbentDetails::TempBas { .. } => IncumbentType::TempBas,
            IncumbentDetails::LicensedLpAux { .. } => IncumbentType::LicensedLpAux,
            IncumbentDetails::UnlicensedLpAux { .. } => IncumbentType::UnlicensedLpAux,
            IncumbentDetails::FixedTvbd { .. } => IncumbentType::FixedTvbd,
        }
    }
}

/// A persisted incumbent registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncumbentRegistration {
    pub owner_id: String,
    pub disposition: RegistrationDisposition,
    pub contact: ContactCard,
    pub channel: Option<u32>,
    pub locations: Vec<Shape>,
    #[serde(default)]
    pub events: Vec<TimeWindow>,
    pub licensed: bool,
    pub details: IncumbentDetails,
}

impl IncumbentRegistration {
    pub fn incumbent_type(&self) -> IncumbentType {
        self.details.incumbent_type()
    }

    pub fn reg_id(&self) -> &str {
        &self.disposition.reg_id
    }

    /// Serial number of a fixed device registration
    pub fn serial_number(&self) -> Option<&str> {
        match &self.details {
            IncumbentDetails::FixedTvbd { device, .. } => Some(&device.serial_number),
            _ => None,
        }
    }

    /// Denormalized detail row for LP-Aux registrations
    pub fn lp_aux_detail(&self) -> Option<LpAuxDetail> {
        let (call_sign, uls_file_number, venue_name) = match &self.details {
            IncumbentDetails::LicensedLpAux {
                call_sign,
                venue_name,
            } => (Some(call_sign.clone()), None, venue_name.clone()),
            IncumbentDetails::UnlicensedLpAux {
                uls_file_number,
                venue_name,
            } => (None, Some(uls_file_number.clone()), Some(venue_name.clone())),
            _ => return None,
        };

        Some(LpAuxDetail {
            reg_id: self.disposition.reg_id.clone(),
            incumbent_type: self.incumbent_type(),
            channel: self.channel,
            call_sign,
            uls_file_number,
            venue_name,
            contact_name: self.contact.name.clone(),
            locations: self.locations.clone(),
            events: self.events.clone(),
            licensed: self.licensed,
        })
    }
}

/// Flattened LP-Aux row consulted by the protection calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LpAuxDetail {
    pub reg_id: String,
    pub incumbent_type: IncumbentType,
    pub channel: Option<u32>,
    pub call_sign: Option<String>,
    pub uls_file_number: Option<String>,
    pub venue_name: Option<String>,
    pub contact_name: String,
    pub locations: Vec<Shape>,
    pub events: Vec<TimeWindow>,
    pub licensed: bool,
}

/// Licensed TV broadcast station with its protected service area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastStation {
    pub call_sign: String,
    pub channel: u32,
    pub transmitter: GeoPoint,
    pub contour: Polygon,
    #[serde(default)]
    pub keyhole: Option<Polygon>,
}

/// ULS license backing an unlicensed LP-Aux venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UlsLicense {
    pub file_number: String,
    pub venue_name: String,
    pub expiration: DateTime<Utc>,
}

impl UlsLicense {
    pub fn matches_venue(&self, venue_name: &str) -> bool {
        self.venue_name.trim().eq_ignore_ascii_case(venue_name.trim())
    }
}

/// LP-Aux license as listed to operators.
///
/// Licensed entries are call signs with no venue or expiry; unlicensed
/// entries come from ULS venue licenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LpAuxLicenseInfo {
    pub license_id: String,
    pub licensed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

impl LpAuxLicenseInfo {
    pub fn call_sign(call_sign: &str) -> Self {
        Self {
            license_id: call_sign.to_string(),
            licensed: true,
            venue_name: None,
            expiration: None,
        }
    }
}

impl From<UlsLicense> for LpAuxLicenseInfo {
    fn from(license: UlsLicense) -> Self {
        Self {
            license_id: license.file_number,
            licensed: false,
            venue_name: Some(license.venue_name),
            expiration: Some(license.expiration),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub success: bool,
    pub reg_id: Option<String>,
    pub errors: Vec<String>,
}

impl RegistrationResult {
    pub fn registered(reg_id: impl Into<String>) -> Self {
        Self {
            success: true,
            reg_id: Some(reg_id.into()),
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            reg_id: None,
            errors,
        }
    }
}

/// Outcome of a delete-by-id request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteOutcome::Deleted => f.write_str("Success"),
            DeleteOutcome::NotFound => f.write_str("No incumbents found"),
        }
    }
}
