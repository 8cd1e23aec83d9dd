//! Spectrum schedules and the channel-list transformations behind them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoLocation;
use crate::{Error, Result};

/// One channel the propagation service considers free at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeChannel {
    pub channel: u32,
    pub start_hz: f64,
    pub stop_hz: f64,
    pub bandwidth: f64,
    pub max_power_dbm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumProfile {
    pub channel_id: String,
    pub hz: f64,
    pub dbm: f64,
}

impl From<&FreeChannel> for SpectrumProfile {
    fn from(channel: &FreeChannel) -> Self {
        Self {
            channel_id: channel.channel.to_string(),
            hz: channel.start_hz,
            dbm: channel.max_power_dbm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spectrum {
    pub resolution_bw_hz: f64,
    pub profiles: Vec<SpectrumProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
}

impl EventTime {
    pub fn overlaps(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> bool {
        self.start_time <= stop && start <= self.stop_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumSchedule {
    pub event_time: EventTime,
    pub spectra: Vec<Spectrum>,
}

impl SpectrumSchedule {
    /// Build a schedule holding one `Spectrum` per distinct bandwidth.
    ///
    /// Spectra appear in the order their bandwidth is first seen in `channels`.
    pub fn from_channels(event_time: EventTime, channels: &[FreeChannel]) -> Self {
        let mut spectra: Vec<Spectrum> = Vec::new();
        for channel in channels {
            let profile = SpectrumProfile::from(channel);
            match spectra
                .iter_mut()
                .find(|s| s.resolution_bw_hz == channel.bandwidth)
            {
                Some(spectrum) => spectrum.profiles.push(profile),
                None => spectra.push(Spectrum {
                    resolution_bw_hz: channel.bandwidth,
                    profiles: vec![profile],
                }),
            }
        }
        Self { event_time, spectra }
    }

    pub fn spectrum_for(&self, resolution_bw_hz: f64) -> Option<&Spectrum> {
        self.spectra
            .iter()
            .find(|s| s.resolution_bw_hz == resolution_bw_hz)
    }

    /// Verify that every profile of `notified` is offered verbatim.
    ///
    /// Fails with `SpectrumUnavailable` naming the first offending
    /// bandwidth/frequency pair.
    pub fn verify(&self, notified: &Spectrum) -> Result<()> {
        let offered = self.spectrum_for(notified.resolution_bw_hz).ok_or_else(|| {
            Error::SpectrumUnavailable(format!(
                "Bandwidth {} Hz is not available",
                notified.resolution_bw_hz
            ))
        })?;

        for profile in &notified.profiles {
            let found = offered
                .profiles
                .iter()
                .any(|p| p.dbm == profile.dbm && p.hz == profile.hz);
            if !found {
                return Err(Error::SpectrumUnavailable(format!(
                    "Frequency {} Hz at {} dBm is not available with bandwidth {} Hz",
                    profile.hz, profile.dbm, notified.resolution_bw_hz
                )));
            }
        }
        Ok(())
    }

    /// Offered profile for a start frequency, in any bandwidth
    pub fn profile_at(&self, hz: f64) -> Option<&SpectrumProfile> {
        self.spectra
            .iter()
            .flat_map(|s| s.profiles.iter())
            .find(|p| p.hz == hz)
    }
}

/// Sum of the bandwidths of every free channel
pub fn max_total_bandwidth(channels: &[FreeChannel]) -> f64 {
    channels.iter().map(|c| c.bandwidth).sum()
}

/// Widest run of channels whose band edges abut
pub fn max_contiguous_bandwidth(channels: &[FreeChannel]) -> f64 {
    let mut sorted: Vec<&FreeChannel> = channels.iter().collect();
    sorted.sort_by(|a, b| a.start_hz.total_cmp(&b.start_hz));

    let mut best = 0.0_f64;
    let mut run = 0.0_f64;
    let mut prev_stop: Option<f64> = None;
    for channel in sorted {
        run = match prev_stop {
            Some(stop) if (channel.start_hz - stop).abs() < 1.0 => run + channel.bandwidth,
            _ => channel.bandwidth,
        };
        best = best.max(run);
        prev_stop = Some(channel.stop_hz);
    }
    best
}

/// Regulatory rule set a database operates under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesetInfo {
    pub authority: String,
    pub ruleset_id: String,
    #[serde(default)]
    pub max_location_change: Option<f64>,
    #[serde(default)]
    pub max_polling_secs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumSpec {
    pub ruleset_info: RulesetInfo,
    pub spectrum_schedules: Vec<SpectrumSchedule>,
    pub needs_spectrum_report: bool,
    pub max_total_bw_hz: f64,
    pub max_contiguous_bw_hz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSpectrumSpec {
    pub location: GeoLocation,
    pub spectrum_specs: Vec<SpectrumSpec>,
}

/// Inclusive range of TV channel numbers the database manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPlan {
    pub first: u32,
    pub last: u32,
}

impl ChannelPlan {
    pub fn contains(&self, channel: u32) -> bool {
        (self.first..=self.last).contains(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.last - self.first + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    /// Zero-based position of `channel` inside the plan
    pub fn position(&self, channel: u32) -> Option<usize> {
        self.contains(channel)
            .then(|| (channel - self.first) as usize)
    }
}

impl Default for ChannelPlan {
    fn default() -> Self {
        Self { first: 21, last: 60 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn channel(channel: u32, start_mhz: f64, bandwidth: f64, dbm: f64) -> FreeChannel {
        FreeChannel {
            channel,
            start_hz: start_mhz * 1e6,
            stop_hz: start_mhz * 1e6 + bandwidth * 1e6,
            bandwidth,
            max_power_dbm: dbm,
        }
    }

    fn window() -> EventTime {
        EventTime {
            start_time: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            stop_time: Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_groups_by_bandwidth() {
        let channels = vec![
            channel(21, 470.0, 6.0, 20.0),
            channel(23, 482.0, 8.0, 30.0),
            channel(22, 476.0, 6.0, 17.0),
        ];
        let schedule = SpectrumSchedule::from_channels(window(), &channels);

        assert_eq!(schedule.spectra.len(), 2);
        let six = schedule.spectrum_for(6.0).unwrap();
        assert_eq!(six.profiles.len(), 2);
        assert_eq!(six.profiles[0].dbm, 20.0);
        assert_eq!(six.profiles[1].dbm, 17.0);
        let eight = schedule.spectrum_for(8.0).unwrap();
        assert_eq!(eight.profiles.len(), 1);
        assert_eq!(eight.profiles[0].channel_id, "23");
        assert_eq!(eight.profiles[0].hz, 482e6);
    }

    #[test]
    fn test_verify_rejects_wrong_power() {
        let schedule = SpectrumSchedule::from_channels(window(), &[channel(21, 470.0, 8.0, 20.0)]);
        let ok = Spectrum {
            resolution_bw_hz: 8.0,
            profiles: vec![SpectrumProfile {
                channel_id: "21".into(),
                hz: 470e6,
                dbm: 20.0,
            }],
        };
        assert!(schedule.verify(&ok).is_ok());

        let mut too_loud = ok.clone();
        too_loud.profiles[0].dbm = 23.0;
        let err = schedule.verify(&too_loud).unwrap_err();
        assert!(matches!(err, Error::SpectrumUnavailable(_)));
        assert!(err.to_string().contains("470000000"));

        let mut wrong_bw = ok;
        wrong_bw.resolution_bw_hz = 6.0;
        assert!(schedule.verify(&wrong_bw).unwrap_err().to_string().contains("Bandwidth 6"));
    }

    #[test]
    fn test_contiguous_bandwidth() {
        let channels = vec![
            channel(25, 502.0, 8.0, 20.0),
            channel(21, 470.0, 8.0, 20.0),
            channel(22, 478.0, 8.0, 20.0),
            channel(23, 486.0, 8.0, 20.0),
        ];
        assert_eq!(max_total_bandwidth(&channels), 32.0);
        assert_eq!(max_contiguous_bandwidth(&channels), 24.0);
        assert_eq!(max_contiguous_bandwidth(&[]), 0.0);
    }

    #[test]
    fn test_channel_plan_positions() {
        let plan = ChannelPlan::default();
        assert_eq!(plan.len(), 40);
        assert_eq!(plan.position(21), Some(0));
        assert_eq!(plan.position(60), Some(39));
        assert_eq!(plan.position(61), None);

        let inverted = ChannelPlan { first: 60, last: 21 };
        assert!(inverted.is_empty());
        assert_eq!(inverted.len(), 0);
        assert_eq!(inverted.channels().count(), 0);
    }
}
