//! Terrain-clutter banding and merging

use serde::{Deserialize, Serialize};

/// Antenna height band used to key the clutter raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeightBand {
    /// Below 2.5 m
    Low,
    /// 2.5 m up to 7.5 m
    Medium,
    /// 7.5 m up to 20 m
    High,
    /// 20 m and above
    Mast,
}

impl HeightBand {
    pub fn from_height(height_m: f64) -> Self {
        if height_m < 2.5 {
            HeightBand::Low
        } else if height_m < 7.5 {
            HeightBand::Medium
        } else if height_m < 20.0 {
            HeightBand::High
        } else {
            HeightBand::Mast
        }
    }

    /// Band index as stored in the raster keys
    pub fn index(&self) -> u8 {
        match self {
            HeightBand::Low => 0,
            HeightBand::Medium => 1,
            HeightBand::High => 2,
            HeightBand::Mast => 3,
        }
    }
}

/// Raster key for one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClutterKey {
    pub easting: i64,
    pub northing: i64,
    pub height_band: HeightBand,
    pub emission_class: u8,
}

/// Merge raster records for one cell by taking the minimum per position.
///
/// Records may have different lengths; a position only present in some
/// records takes the minimum of those.
pub fn merge_min(records: &[Vec<f64>]) -> Vec<f64> {
    let width = records.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|i| {
            records
                .iter()
                .filter_map(|r| r.get(i).copied())
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}
