//! Interference report layout and CSV rendering

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use paws_core::{ChannelPlan, GeoPoint, Result};
use serde::Serialize;

const NOT_AVAILABLE: &str = "N/A";

/// Identity and category columns, in output order
const IDENTITY_COLUMNS: [&str; 13] = [
    "DeviceId",
    "SerialNumber",
    "ManufacturerId",
    "ModelId",
    "DeviceType",
    "EmissionClass",
    "TechnologyId",
    "DeviceCategory",
    "Latitude",
    "Longitude",
    "LocationUncertainty",
    "Distance",
    "Bandwidth",
];

/// One candidate device found inside the query radius
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterferenceRow {
    pub device_id: String,
    pub serial_number: String,
    pub manufacturer_id: String,
    pub model_id: String,
    pub device_type: Option<String>,
    pub emission_class: u8,
    pub technology_id: Option<String>,
    pub device_category: Option<String>,
    pub location: GeoPoint,
    pub uncertainty_m: f64,
    pub distance_m: f64,
    pub bandwidth_hz: f64,
    /// Offered max power per plan channel (`P0`); `None` when not offered
    pub offered_dbm: Vec<Option<f64>>,
    /// Clutter-derived protection value per plan channel (`P1`)
    pub protection: Vec<f64>,
    pub channels_in_use: Vec<String>,
}

/// A finished report, already written to disk
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterferenceReport {
    pub path: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub center: GeoPoint,
    pub radius_m: f64,
    pub rows: Vec<InterferenceRow>,
}

pub fn header(plan: &ChannelPlan) -> Vec<String> {
    let mut columns: Vec<String> = IDENTITY_COLUMNS.iter().map(|c| c.to_string()).collect();
    for channel in plan.channels() {
        columns.push(format!("P0_{channel}"));
        columns.push(format!("P1_{channel}"));
    }
    columns.push("ChannelsInUse".to_string());
    columns
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn fields(row: &InterferenceRow, plan: &ChannelPlan) -> Vec<String> {
    let mut out = vec![
        row.device_id.clone(),
        row.serial_number.clone(),
        row.manufacturer_id.clone(),
        row.model_id.clone(),
        row.device_type.clone().unwrap_or_default(),
        row.emission_class.to_string(),
        row.technology_id.clone().unwrap_or_default(),
        row.device_category.clone().unwrap_or_default(),
        format!("{:.6}", row.location.latitude),
        format!("{:.6}", row.location.longitude),
        format!("{:.1}", row.uncertainty_m),
        format!("{:.0}", row.distance_m),
        row.bandwidth_hz.to_string(),
    ];

    for position in 0..plan.len() {
        out.push(match row.offered_dbm.get(position).copied().flatten() {
            Some(dbm) => format!("{dbm:.1}"),
            None => NOT_AVAILABLE.to_string(),
        });
        out.push(match row.protection.get(position).copied() {
            Some(value) if value != 0.0 => format!("{value:.1}"),
            _ => NOT_AVAILABLE.to_string(),
        });
    }

    out.push(row.channels_in_use.join(";"));
    out
}

/// Render the fixed-layout CSV, header first
pub fn render_csv(plan: &ChannelPlan, rows: &[InterferenceRow]) -> String {
    let mut csv = String::new();
    let _ = writeln!(csv, "{}", header(plan).join(","));
    for row in rows {
        let line: Vec<String> = fields(row, plan).iter().map(|f| escape(f)).collect();
        let _ = writeln!(csv, "{}", line.join(","));
    }
    csv
}

/// Write the CSV under `dir` and return its path
pub fn write_csv(
    dir: &Path,
    generated_at: DateTime<Utc>,
    plan: &ChannelPlan,
    rows: &[InterferenceRow],
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "interference-{}.csv",
        generated_at.format("%Y%m%dT%H%M%S%3fZ")
    ));
    std::fs::write(&path, render_csv(plan, rows))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(plan: &ChannelPlan) -> InterferenceRow {
        let mut offered = vec![None; plan.len()];
        offered[0] = Some(20.0);
        let mut protection = vec![0.0; plan.len()];
        protection[0] = 12.5;
        protection[1] = 3.0;

        InterferenceRow {
            device_id: "acme:SN1".into(),
            serial_number: "SN1".into(),
            manufacturer_id: "acme".into(),
            model_id: "wsd, rev 2".into(),
            device_type: Some("A".into()),
            emission_class: 3,
            technology_id: None,
            device_category: Some("master".into()),
            location: GeoPoint::new(51.5, -0.12),
            uncertainty_m: 50.0,
            distance_m: 1234.4,
            bandwidth_hz: 8e6,
            offered_dbm: offered,
            protection,
            channels_in_use: vec!["21".into(), "22".into()],
        }
    }

    #[test]
    fn test_header_has_fixed_width() {
        let plan = ChannelPlan { first: 21, last: 23 };
        let columns = header(&plan);
        assert_eq!(columns.len(), 13 + 2 * 3 + 1);
        assert_eq!(columns[13], "P0_21");
        assert_eq!(columns[14], "P1_21");
        assert_eq!(columns.last().unwrap(), "ChannelsInUse");
    }

    #[test]
    fn test_row_marks_missing_values() {
        let plan = ChannelPlan { first: 21, last: 23 };
        let csv = render_csv(&plan, &[row(&plan)]);
        let line = csv.lines().nth(1).unwrap();

        assert!(line.contains("\"wsd, rev 2\""));
        assert!(line.ends_with(",20.0,12.5,N/A,3.0,N/A,N/A,21;22"));
        assert!(line.contains(",50.0,1234,8000000,"));
    }

    #[test]
    fn test_write_csv_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let plan = ChannelPlan { first: 21, last: 22 };
        let now = Utc::now();

        let path = write_csv(&dir.path().join("out"), now, &plan, &[row(&plan)]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("interference-"));
    }
}
