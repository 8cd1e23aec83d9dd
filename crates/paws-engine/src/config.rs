//! Engine configuration

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use paws_core::validate::Validator;
use paws_core::{ChannelPlan, RegionContext, Result, RulesetInfo};
use serde::{Deserialize, Serialize};

/// Regulatory distance limit for MVPD receive sites
pub const DEFAULT_MVPD_DISTANCE_LIMIT_M: f64 = 80_000.0;

/// Clutter raster resolution
pub const DEFAULT_CLUTTER_CELL_M: u32 = 100;

/// Emission class assumed when a device does not declare one
pub const DEFAULT_EMISSION_CLASS: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Organisation code embedded in every registration id
    pub org_code: String,
    /// Partition key for the sequence counter
    pub region_key: String,
    /// Rule sets this database operates
    pub rulesets: Vec<RulesetInfo>,
    pub channel_plan: ChannelPlan,
    pub mvpd_distance_limit_m: f64,
    pub clutter_cell_m: u32,
    pub default_emission_class: u8,
    /// Directory interference reports are written to
    pub report_dir: PathBuf,
    /// Base URL of the external device-authorization service
    pub device_authority_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            org_code: "WSDB".to_string(),
            region_key: "GB".to_string(),
            rulesets: vec![RulesetInfo {
                authority: "gb".to_string(),
                ruleset_id: "ETSI-EN-301-598-1.1.1".to_string(),
                max_location_change: Some(50.0),
                max_polling_secs: Some(900),
            }],
            channel_plan: ChannelPlan::default(),
            mvpd_distance_limit_m: DEFAULT_MVPD_DISTANCE_LIMIT_M,
            clutter_cell_m: DEFAULT_CLUTTER_CELL_M,
            default_emission_class: DEFAULT_EMISSION_CLASS,
            report_dir: PathBuf::from("reports"),
            device_authority_url: None,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        v.check(!self.org_code.is_empty(), "orgCode", "must not be empty");
        v.check(
            !self.channel_plan.is_empty(),
            "channelPlan",
            "last channel must not precede the first",
        );
        v.check(self.clutter_cell_m > 0, "clutterCellM", "must be positive");
        v.finish()
    }

    pub fn context_at(&self, now: DateTime<Utc>) -> RegionContext {
        RegionContext::new(&self.org_code, &self.region_key, now)
    }

    pub fn context(&self) -> RegionContext {
        self.context_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"orgCode": "TVWS", "channelPlan": {{"first": 2, "last": 51}}}}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.org_code, "TVWS");
        assert_eq!(config.channel_plan, ChannelPlan { first: 2, last: 51 });
        assert_eq!(config.region_key, "GB");
        assert_eq!(config.mvpd_distance_limit_m, DEFAULT_MVPD_DISTANCE_LIMIT_M);
    }

    #[test]
    fn test_inverted_channel_plan_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"channelPlan": {{"first": 60, "last": 21}}}}"#).unwrap();

        let Err(paws_core::Error::Validation(errors)) = EngineConfig::load(file.path()) else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "channelPlan");
    }
}
