//! Incumbent registration, deletion and administrative exclusions

use paws_core::incumbent::{
    lp_aux_shapes, LpAuxParams, MvpdParams, TempBasParams, UnlicensedLpAuxParams,
};
use paws_core::paws::{DeleteIncumbentRequest, ExcludeChannelsRequest, ExcludeIdsRequest};
use paws_core::validate;
use paws_core::{
    ChannelExclusion, ContactCard, DeleteOutcome, DeviceExclusion, DispositionAction, Error,
    ErrorKind, ExclusionEntry, IncumbentDetails, IncumbentParameters, IncumbentRegistration,
    RegionContext, RegistrationResult, Result, Shape, TimeWindow,
};
use tracing::{error, info, warn};

use crate::engine::PawsEngine;

/// Common columns of a registration, before a disposition is allocated
struct Draft {
    contact: ContactCard,
    channel: u32,
    locations: Vec<Shape>,
    events: Vec<TimeWindow>,
    licensed: bool,
    details: IncumbentDetails,
}

impl PawsEngine {
    /// Register a protected incumbent.
    ///
    /// Field and business-rule failures come back as an unsuccessful
    /// [`RegistrationResult`]; only infrastructure faults are returned as `Err`.
    pub async fn register_incumbent(
        &self,
        ctx: &RegionContext,
        params: IncumbentParameters,
        user_id: &str,
    ) -> Result<RegistrationResult> {
        let kind = params.incumbent_type();
        let outcome = match &params {
            IncumbentParameters::Mvpd(p) => self.register_mvpd(ctx, p, user_id).await,
            IncumbentParameters::TempBas(p) => self.register_temp_bas(ctx, p, user_id).await,
            IncumbentParameters::LicensedLpAux(p) => self.register_lp_aux(ctx, p, user_id).await,
            IncumbentParameters::UnlicensedLpAux(p) => {
                self.register_unlicensed_lp_aux(ctx, p, user_id).await
            }
        };

        match outcome {
            Ok(reg_id) => {
                info!(%kind, %reg_id, user_id, "Incumbent registered");
                Ok(RegistrationResult::registered(reg_id))
            }
            Err(e) if e.kind() != ErrorKind::Infrastructure => {
                warn!(%kind, user_id, error = %e, "Incumbent registration refused");
                Ok(RegistrationResult::failed(e.messages()))
            }
            Err(e) => Err(e),
        }
    }

    async fn register_mvpd(
        &self,
        ctx: &RegionContext,
        params: &MvpdParams,
        user_id: &str,
    ) -> Result<String> {
        validate::mvpd(params, &self.config.channel_plan)?;

        if self.store.is_waived_call_sign(&params.call_sign).await? {
            info!(call_sign = %params.call_sign, "Call sign waived, skipping contour check");
        } else {
            self.check_mvpd_protection(params).await?;
        }

        let draft = Draft {
            contact: params.contact.clone(),
            channel: params.channel,
            locations: vec![Shape::Point(params.receive_location)],
            events: params.events.clone(),
            licensed: true,
            details: IncumbentDetails::Mvpd {
                call_sign: params.call_sign.clone(),
                transmitter_location: params.transmitter_location,
            },
        };
        self.persist(ctx, user_id, draft).await
    }

    /// The receive site must sit inside the nearest station's protected
    /// contour (or keyhole) and within the regulatory distance limit.
    async fn check_mvpd_protection(&self, params: &MvpdParams) -> Result<()> {
        let site = &params.receive_location;
        let stations = self.store.broadcast_stations(&params.call_sign).await?;

        let nearest = stations
            .iter()
            .map(|s| (self.propagation.distance_m(&s.transmitter, site), s))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .ok_or_else(|| {
                Error::Rejected(format!("Call sign {} does not exist", params.call_sign))
            })?;

        let (distance, station) = nearest;
        if !self.propagation.within_protection(station, site) {
            return Err(Error::Rejected(format!(
                "Receive site is outside the protected contour of {}",
                station.call_sign
            )));
        }
        if distance > self.config.mvpd_distance_limit_m {
            return Err(Error::Rejected(format!(
                "Receive site is {:.1} km from {}, beyond the {:.0} km limit",
                distance / 1000.0,
                station.call_sign,
                self.config.mvpd_distance_limit_m / 1000.0
            )));
        }
        Ok(())
    }

    async fn register_temp_bas(
        &self,
        ctx: &RegionContext,
        params: &TempBasParams,
        user_id: &str,
    ) -> Result<String> {
        validate::temp_bas(params, &self.config.channel_plan)?;

        let draft = Draft {
            contact: params.contact.clone(),
            channel: params.channel,
            locations: vec![Shape::Point(params.receive_location)],
            events: params.events.clone(),
            licensed: true,
            details: IncumbentDetails::TempBas {
                call_sign: params.call_sign.clone(),
            },
        };
        self.persist(ctx, user_id, draft).await
    }

    async fn register_lp_aux(
        &self,
        ctx: &RegionContext,
        params: &LpAuxParams,
        user_id: &str,
    ) -> Result<String> {
        validate::lp_aux(params, &self.config.channel_plan)?;

        if !self.store.is_licensed_call_sign(&params.call_sign).await? {
            return Err(Error::Rejected(format!(
                "Call sign {} does not exist",
                params.call_sign
            )));
        }

        let locations = lp_aux_shapes(&params.points, params.quadrilateral.as_ref());
        self.check_channel_exclusions(params.channel, &locations).await?;

        let draft = Draft {
            contact: params.contact.clone(),
            channel: params.channel,
            locations,
            events: params.events.clone(),
            licensed: true,
            details: IncumbentDetails::LicensedLpAux {
                call_sign: params.call_sign.clone(),
                venue_name: params.venue_name.clone(),
            },
        };
        self.persist(ctx, user_id, draft).await
    }

    async fn register_unlicensed_lp_aux(
        &self,
        ctx: &RegionContext,
        params: &UnlicensedLpAuxParams,
        user_id: &str,
    ) -> Result<String> {
        validate::unlicensed_lp_aux(params, &self.config.channel_plan)?;

        let license = self
            .store
            .uls_licenses(&params.uls_file_number)
            .await?
            .into_iter()
            .find(|l| l.matches_venue(&params.venue_name))
            .ok_or_else(|| {
                Error::Rejected(format!(
                    "ULS file number {} is not licensed for venue {}",
                    params.uls_file_number, params.venue_name
                ))
            })?;

        if let Some(window) = params
            .events
            .iter()
            .find(|w| w.start >= license.expiration || w.end >= license.expiration)
        {
            return Err(Error::Rejected(format!(
                "Event {} to {} extends past license expiration {}",
                window.start, window.end, license.expiration
            )));
        }

        let locations = lp_aux_shapes(&params.points, params.quadrilateral.as_ref());
        let draft = Draft {
            contact: params.contact.clone(),
            channel: params.channel,
            locations,
            events: params.events.clone(),
            licensed: false,
            details: IncumbentDetails::UnlicensedLpAux {
                uls_file_number: params.uls_file_number.clone(),
                venue_name: params.venue_name.clone(),
            },
        };
        self.persist(ctx, user_id, draft).await
    }

    async fn check_channel_exclusions(&self, channel: u32, area: &[Shape]) -> Result<()> {
        let exclusions = self.store.channel_exclusions().await?;
        if exclusions.iter().any(|e| e.blocks(channel, area)) {
            return Err(Error::Rejected(format!(
                "Channel {channel} is excluded in the requested area"
            )));
        }
        Ok(())
    }

    /// Allocate a registration id and write the registration, then its LP-Aux
    /// detail row where the type has one.
    ///
    /// The two writes are not atomic: if the detail write fails the primary
    /// row stays behind and the error names its id.
    async fn persist(&self, ctx: &RegionContext, user_id: &str, draft: Draft) -> Result<String> {
        let disposition = self
            .sequences
            .next_disposition(ctx, DispositionAction::New)
            .await?;

        let registration = IncumbentRegistration {
            owner_id: user_id.to_string(),
            disposition,
            contact: draft.contact,
            channel: Some(draft.channel),
            locations: draft.locations,
            events: draft.events,
            licensed: draft.licensed,
            details: draft.details,
        };
        let reg_id = registration.reg_id().to_string();
        let detail = registration.lp_aux_detail();

        self.store.insert_incumbent(registration).await?;

        if let Some(detail) = detail {
            if let Err(e) = self.store.insert_lp_aux_detail(detail).await {
                error!(%reg_id, error = %e, "LP-Aux detail write failed after registration was stored");
                return Err(e);
            }
        }
        Ok(reg_id)
    }

    /// Delete a registration by id, cascading to its LP-Aux detail row
    pub async fn delete_incumbent_info(
        &self,
        request: &DeleteIncumbentRequest,
    ) -> Result<DeleteOutcome> {
        validate::Validator::new()
            .required(&request.reg_id, "regId")
            .finish()?;

        let kind = request.incumbent_type;
        if !self.store.delete_incumbent(kind, &request.reg_id).await? {
            info!(%kind, reg_id = %request.reg_id, "No incumbent to delete");
            return Ok(DeleteOutcome::NotFound);
        }
        if kind.has_detail() {
            self.store.delete_lp_aux_detail(&request.reg_id).await?;
        }

        info!(%kind, reg_id = %request.reg_id, "Incumbent deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Add a device to the exclusion list; returns the new row key
    pub async fn exclude_ids(&self, ctx: &RegionContext, request: &ExcludeIdsRequest) -> Result<String> {
        validate::exclude_ids(request)?;

        let entry = ExclusionEntry::Device(DeviceExclusion {
            device_id: request.device_id.clone(),
            serial_number: request.serial_number.trim().to_string(),
        });
        let row_key = exclusion_row_key(ctx);
        self.store.insert_exclusion(row_key.clone(), entry).await?;

        info!(%row_key, serial_number = %request.serial_number, "Device excluded");
        Ok(row_key)
    }

    /// Close channels inside regions; returns the new row key
    pub async fn exclude_channels(
        &self,
        ctx: &RegionContext,
        request: &ExcludeChannelsRequest,
    ) -> Result<String> {
        validate::exclude_channels(request, &self.config.channel_plan)?;

        let entry = ExclusionEntry::Channel(ChannelExclusion {
            channels: request.channels.clone(),
            regions: request.regions.clone(),
        });
        let row_key = exclusion_row_key(ctx);
        self.store.insert_exclusion(row_key.clone(), entry).await?;

        info!(%row_key, channels = ?request.channels, "Channels excluded");
        Ok(row_key)
    }
}

fn exclusion_row_key(ctx: &RegionContext) -> String {
    format!(
        "{}-{}",
        ctx.now.format("%Y%m%d%H%M%S"),
        hex::encode(rand::random::<[u8; 8]>())
    )
}
