//! PAWS device-facing operations

use std::sync::Arc;

use paws_core::paws::{
    profile_at, AvailableSpectrumBatchRequest, AvailableSpectrumRequest, DeviceValidityRequest,
    InitRequest, NotifySpectrumUseRequest, RegistrationRequest, RulesetInfoRequest,
};
use paws_core::spectrum::{max_contiguous_bandwidth, max_total_bandwidth};
use paws_core::validate::Validator;
use paws_core::{
    DeviceDescriptor, DispositionAction, Error, EventTime, FreeChannel, GeoSpectrumSpec,
    IncumbentDetails, IncumbentRegistration, IncumbentType, InitializedDevice, RegionContext,
    RegistrationDisposition, Result, RulesetInfo, Shape, SpectrumSchedule, SpectrumSpec,
    UsedSpectrumRecord, ValidatedDevice,
};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::PawsEngine;

fn check_device(device: &DeviceDescriptor, field: &str) -> Result<()> {
    Validator::new().device(device, field).finish()
}

fn event_time(ctx: &RegionContext) -> EventTime {
    EventTime {
        start_time: ctx.now,
        stop_time: ctx.validity_end(),
    }
}

fn spectrum_spec(
    ruleset: &RulesetInfo,
    schedule: &SpectrumSchedule,
    channels: &[FreeChannel],
) -> SpectrumSpec {
    SpectrumSpec {
        ruleset_info: ruleset.clone(),
        spectrum_schedules: vec![schedule.clone()],
        needs_spectrum_report: true,
        max_total_bw_hz: max_total_bandwidth(channels),
        max_contiguous_bw_hz: max_contiguous_bandwidth(channels),
    }
}

impl PawsEngine {
    /// Configured rule sets the device declares support for.
    ///
    /// A device that declares none is offered every configured rule set.
    pub fn rule_set_info(&self, request: &RulesetInfoRequest) -> Result<Vec<RulesetInfo>> {
        check_device(&request.device_desc, "deviceDesc")?;
        self.applicable_rulesets(&request.device_desc)
    }

    fn applicable_rulesets(&self, device: &DeviceDescriptor) -> Result<Vec<RulesetInfo>> {
        if device.ruleset_ids.is_empty() {
            return Ok(self.config.rulesets.clone());
        }
        let matched: Vec<RulesetInfo> = self
            .config
            .rulesets
            .iter()
            .filter(|r| device.ruleset_ids.contains(&r.ruleset_id))
            .cloned()
            .collect();
        if matched.is_empty() {
            return Err(Error::Unsupported(device.ruleset_ids.join(",")));
        }
        Ok(matched)
    }

    /// Current availability at one location: exactly one schedule covering
    /// now through the end of the validity window.
    pub async fn available_spectrum(
        &self,
        ctx: &RegionContext,
        request: &AvailableSpectrumRequest,
    ) -> Result<Vec<SpectrumSchedule>> {
        check_device(&request.device_desc, "deviceDesc")?;
        let profile = request.incumbent_profile()?;

        let channels = self.propagation.free_channels(&profile).await?;
        debug!(
            device = %request.device_desc.serial_number,
            free = channels.len(),
            "Computed free channels"
        );
        Ok(vec![SpectrumSchedule::from_channels(event_time(ctx), &channels)])
    }

    /// Availability for many locations, computed concurrently.
    ///
    /// Results are returned in completion order; callers match them to their
    /// request by the location each carries. Any failing location fails the
    /// whole batch.
    pub async fn available_spectrum_batch(
        &self,
        ctx: &RegionContext,
        request: &AvailableSpectrumBatchRequest,
    ) -> Result<Vec<GeoSpectrumSpec>> {
        let mut v = Validator::new();
        v.device(&request.device_desc, "deviceDesc");
        v.check(!request.locations.is_empty(), "locations", "must not be empty");
        v.finish()?;
        let rulesets = Arc::new(self.applicable_rulesets(&request.device_desc)?);

        let results = Arc::new(Mutex::new(Vec::with_capacity(request.locations.len())));
        let event_time = event_time(ctx);
        let mut tasks = JoinSet::new();

        for location in request.locations.iter().cloned() {
            let engine = self.clone();
            let results = results.clone();
            let rulesets = rulesets.clone();
            let device = request.device_desc.clone();
            let antenna = request.antenna;

            tasks.spawn(async move {
                let profile = profile_at(&device, &location, &antenna)?;
                let channels = engine.propagation.free_channels(&profile).await?;
                let schedule = SpectrumSchedule::from_channels(event_time, &channels);
                let spectrum_specs = rulesets
                    .iter()
                    .map(|r| spectrum_spec(r, &schedule, &channels))
                    .collect();

                results.lock().await.push(GeoSpectrumSpec {
                    location,
                    spectrum_specs,
                });
                Ok::<(), Error>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            joined.map_err(|e| Error::Internal(format!("availability task failed: {e}")))??;
        }

        let specs = std::mem::take(&mut *results.lock().await);
        info!(
            device = %request.device_desc.serial_number,
            locations = specs.len(),
            "Batch availability computed"
        );
        Ok(specs)
    }

    /// Register a fixed device, replacing any earlier registration of the
    /// same serial number.
    pub async fn register(
        &self,
        ctx: &RegionContext,
        request: &RegistrationRequest,
    ) -> Result<RegistrationDisposition> {
        Validator::new()
            .device(&request.device_desc, "deviceDesc")
            .contact(&request.device_owner.owner, "deviceOwner.owner")
            .finish()?;
        let point = profile_at(&request.device_desc, &request.location, &request.antenna)?.location;
        self.ensure_not_excluded(&request.device_desc).await?;

        let serial = &request.device_desc.serial_number;
        let existing = self.store.find_fixed_device(serial).await?;
        let action = if existing.is_some() {
            DispositionAction::Update
        } else {
            DispositionAction::New
        };
        let disposition = self.sequences.next_disposition(ctx, action).await?;

        let registration = IncumbentRegistration {
            owner_id: request.device_desc.device_id(),
            disposition: disposition.clone(),
            contact: request.device_owner.owner.clone(),
            channel: None,
            locations: vec![Shape::Point(point)],
            events: Vec::new(),
            licensed: false,
            details: IncumbentDetails::FixedTvbd {
                device: request.device_desc.clone(),
                location: request.location.clone(),
                antenna: request.antenna,
                owner: request.device_owner.clone(),
            },
        };
        self.store.insert_incumbent(registration).await?;

        if let Some(previous) = existing {
            self.store
                .delete_incumbent(IncumbentType::FixedTvbd, previous.reg_id())
                .await?;
            debug!(replaced = %previous.reg_id(), "Superseded fixed device registration");
        }

        info!(
            serial = %serial,
            reg_id = %disposition.reg_id,
            action = disposition.action.code(),
            "Fixed device registered"
        );
        Ok(disposition)
    }

    /// Record that a device has come up at a location
    pub async fn initialize(&self, ctx: &RegionContext, request: &InitRequest) -> Result<()> {
        check_device(&request.device_desc, "deviceDesc")?;
        profile_at(&request.device_desc, &request.location, &Default::default())?;

        let device_id = request.device_desc.device_id();
        self.store
            .upsert_initialized_device(InitializedDevice {
                device_id: device_id.clone(),
                device: request.device_desc.clone(),
                location: request.location.clone(),
                initialized_at: ctx.now,
            })
            .await?;

        info!(%device_id, "Device initialized");
        Ok(())
    }

    /// Validate the device at `index` in the request.
    ///
    /// A validation younger than one day is served from cache without
    /// contacting the authority.
    pub async fn validate_device(
        &self,
        ctx: &RegionContext,
        request: &DeviceValidityRequest,
        index: usize,
    ) -> Result<()> {
        let device = request.device_descs.get(index).ok_or_else(|| {
            Error::invalid("deviceDescs", format!("has no device at index {index}"))
        })?;
        check_device(device, &format!("deviceDescs[{index}]"))?;
        self.ensure_not_excluded(device).await?;

        let device_id = device.device_id();
        if let Some(cached) = self.store.validated_device(&device_id).await? {
            if !cached.is_stale(ctx.now) {
                debug!(%device_id, "Device validation served from cache");
                return Ok(());
            }
        }

        if !self.authority.authorize(device).await? {
            warn!(%device_id, "Device rejected by authority");
            return Err(Error::Unauthorized(device.serial_number.clone()));
        }

        self.store
            .upsert_validated_device(ValidatedDevice {
                device_id: device_id.clone(),
                serial_number: device.serial_number.clone(),
                last_validated: ctx.now,
            })
            .await?;
        info!(%device_id, "Device validated");
        Ok(())
    }

    async fn ensure_not_excluded(&self, device: &DeviceDescriptor) -> Result<()> {
        let exclusions = self.store.device_exclusions().await?;
        if exclusions.iter().any(|e| e.matches(device)) {
            warn!(serial = %device.serial_number, "Excluded device refused");
            return Err(Error::Unauthorized(device.serial_number.clone()));
        }
        Ok(())
    }

    /// Check notified spectra against freshly computed availability and
    /// record one usage row per spectrum. Nothing is stored unless every
    /// spectrum passes.
    pub async fn notify_spectrum_usage(
        &self,
        ctx: &RegionContext,
        request: &NotifySpectrumUseRequest,
    ) -> Result<usize> {
        let mut v = Validator::new();
        v.device(&request.device_desc, "deviceDesc");
        v.check(!request.spectra.is_empty(), "spectra", "must not be empty");
        v.finish()?;

        let schedule = self
            .available_spectrum(ctx, &request.availability_request())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("availability returned no schedule".to_string()))?;

        for spectrum in &request.spectra {
            schedule.verify(spectrum)?;
        }

        let device_id = request.device_desc.device_id();
        for (i, spectrum) in request.spectra.iter().enumerate() {
            let record = UsedSpectrumRecord {
                row_key: format!("{}-{}-{}", device_id, ctx.now.timestamp_millis(), i),
                device_id: device_id.clone(),
                device: request.device_desc.clone(),
                location: request.location.clone(),
                antenna: request.antenna,
                master_device: request.master_device_desc.clone(),
                master_location: request.master_device_location.clone(),
                spectrum: spectrum.clone(),
                schedule: schedule.clone(),
                event_time: schedule.event_time,
                notified_at: ctx.now,
            };
            self.store.insert_used_spectrum(record).await?;
        }

        info!(%device_id, spectra = request.spectra.len(), "Spectrum use recorded");
        Ok(request.spectra.len())
    }
}
