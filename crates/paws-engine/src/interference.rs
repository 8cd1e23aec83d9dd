//! Operator interference queries

use std::collections::BTreeSet;

use paws_core::clutter::{self, ClutterKey, HeightBand};
use paws_core::geo::to_national_grid;
use paws_core::paws::InterferenceQueryRequest;
use paws_core::validate::Validator;
use paws_core::{BoundingBox, GeoPoint, RegionContext, Result, UsedSpectrumRecord};
use tracing::{debug, info};

use crate::engine::PawsEngine;
use crate::report::{self, InterferenceReport, InterferenceRow};

impl PawsEngine {
    /// Find devices that notified spectrum use within `radius_m` of a victim
    /// receiver, write the CSV report and send it to the requestor.
    ///
    /// Each device appears once, described by its most recent notification.
    pub async fn interference_query(
        &self,
        ctx: &RegionContext,
        request: &InterferenceQueryRequest,
    ) -> Result<InterferenceReport> {
        let mut v = Validator::new();
        v.point(&request.location, "location");
        v.check(
            request.radius_m.is_finite() && request.radius_m > 0.0,
            "radiusM",
            "must be a positive distance",
        );
        v.check(request.requestor.contains('@'), "requestor", "must be an email address");
        if let (Some(start), Some(end)) = (request.start_time, request.end_time) {
            v.check(start <= end, "startTime", "must not be after endTime");
        }
        v.finish()?;

        let center = &request.location;
        let bbox = BoundingBox::around(center, request.radius_m);
        let candidates = self.store.used_spectrum_in(&bbox).await?;

        let device_ids: BTreeSet<String> = candidates
            .into_iter()
            .filter(|r| {
                r.position()
                    .is_some_and(|p| self.propagation.distance_m(center, &p) <= request.radius_m)
            })
            .map(|r| r.device_id)
            .collect();
        debug!(candidates = device_ids.len(), "Devices inside query radius");

        let mut rows = Vec::with_capacity(device_ids.len());
        for device_id in &device_ids {
            let Some(record) = self.store.latest_used_spectrum(device_id).await? else {
                continue;
            };
            if !in_window(&record, request) {
                continue;
            }
            let Some(position) = record.position() else {
                continue;
            };
            let distance = self.propagation.distance_m(center, &position);
            match self.interference_row(&record, position, distance).await? {
                Some(row) => rows.push(row),
                None => debug!(%device_id, "Used bandwidth missing from stored schedule, skipped"),
            }
        }
        rows.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));

        let plan = &self.config.channel_plan;
        let path = report::write_csv(&self.config.report_dir, ctx.now, plan, &rows)?;
        let report = InterferenceReport {
            path,
            generated_at: ctx.now,
            center: *center,
            radius_m: request.radius_m,
            rows,
        };
        self.sink.send(&report, &request.requestor).await?;

        info!(
            rows = report.rows.len(),
            path = %report.path.display(),
            requestor = %request.requestor,
            "Interference report sent"
        );
        Ok(report)
    }

    /// `None` when the stored schedule offers nothing at the used bandwidth
    async fn interference_row(
        &self,
        record: &UsedSpectrumRecord,
        position: GeoPoint,
        distance_m: f64,
    ) -> Result<Option<InterferenceRow>> {
        let Some(offered) = record.schedule.spectrum_for(record.spectrum.resolution_bw_hz) else {
            return Ok(None);
        };
        let plan = &self.config.channel_plan;
        let device = &record.device;
        let emission_class = device
            .etsi_en_device_emissions_class
            .unwrap_or(self.config.default_emission_class);

        let (easting, northing) = to_national_grid(&position).bucket(self.config.clutter_cell_m);
        let key = ClutterKey {
            easting,
            northing,
            height_band: HeightBand::from_height(record.antenna.height),
            emission_class,
        };
        let protection = clutter::merge_min(&self.clutter.lookup(&key).await?);

        let offered_dbm = plan
            .channels()
            .map(|ch| {
                let channel_id = ch.to_string();
                offered
                    .profiles
                    .iter()
                    .find(|p| p.channel_id == channel_id)
                    .map(|p| p.dbm)
            })
            .collect();

        Ok(Some(InterferenceRow {
            device_id: record.device_id.clone(),
            serial_number: device.serial_number.clone(),
            manufacturer_id: device.manufacturer_id.clone(),
            model_id: device.model_id.clone(),
            device_type: device.etsi_en_device_type.clone(),
            emission_class,
            technology_id: device.etsi_en_technology_id.clone(),
            device_category: device.etsi_en_device_category.clone(),
            location: position,
            uncertainty_m: record.location.uncertainty_m(),
            distance_m,
            bandwidth_hz: record.spectrum.resolution_bw_hz,
            offered_dbm,
            protection,
            channels_in_use: record.channels_in_use(),
        }))
    }
}

/// A record passes when no window was asked for, or its event time overlaps it
fn in_window(record: &UsedSpectrumRecord, request: &InterferenceQueryRequest) -> bool {
    match (request.start_time, request.end_time) {
        (None, None) => true,
        (start, end) => record.event_time.overlaps(
            start.unwrap_or(record.event_time.start_time),
            end.unwrap_or(record.event_time.stop_time),
        ),
    }
}
