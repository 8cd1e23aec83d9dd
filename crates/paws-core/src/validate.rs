//! Field validation
//!
//! Validators collect every field problem they find and return them together;
//! business rules that depend on stored state run afterwards in the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::{ContactCard, DeviceDescriptor};
use crate::geo::{GeoPoint, Shape};
use crate::incumbent::{
    LpAuxParams, MvpdParams, TempBasParams, TimeWindow, UnlicensedLpAuxParams,
};
use crate::paws::{ExcludeChannelsRequest, ExcludeIdsRequest};
use crate::spectrum::ChannelPlan;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Accumulates field errors
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn required(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "is required")
    }

    pub fn point(&mut self, point: &GeoPoint, field: &str) -> &mut Self {
        self.check(point.is_valid(), field, "must be a valid latitude/longitude")
    }

    pub fn channel(&mut self, channel: u32, plan: &ChannelPlan, field: &str) -> &mut Self {
        if !plan.contains(channel) {
            self.errors.push(FieldError::new(
                field,
                format!("must be between {} and {}", plan.first, plan.last),
            ));
        }
        self
    }

    pub fn contact(&mut self, contact: &ContactCard, field: &str) -> &mut Self {
        self.required(&contact.name, &format!("{field}.name"));
        self.check(
            contact.email.contains('@'),
            &format!("{field}.email"),
            "must be an email address",
        )
    }

    pub fn events(&mut self, events: &[TimeWindow], required: bool, field: &str) -> &mut Self {
        if required && events.is_empty() {
            self.errors
                .push(FieldError::new(field, "must contain at least one time window"));
        }
        for (i, window) in events.iter().enumerate() {
            self.check(
                window.start < window.end,
                &format!("{field}[{i}]"),
                "must start before it ends",
            );
        }
        self
    }

    pub fn venue(
        &mut self,
        points: &[GeoPoint],
        quadrilateral: Option<&Vec<GeoPoint>>,
    ) -> &mut Self {
        self.check(
            !points.is_empty() || quadrilateral.is_some(),
            "points",
            "must contain at least one point or a quadrilateral",
        );
        for (i, p) in points.iter().enumerate() {
            self.point(p, &format!("points[{i}]"));
        }
        if let Some(corners) = quadrilateral {
            self.check(corners.len() == 4, "quadrilateral", "must have exactly four corners");
            for (i, p) in corners.iter().enumerate() {
                self.point(p, &format!("quadrilateral[{i}]"));
            }
        }
        self
    }

    pub fn device(&mut self, device: &DeviceDescriptor, field: &str) -> &mut Self {
        self.required(&device.serial_number, &format!("{field}.serialNumber"));
        if let Some(class) = device.etsi_en_device_emissions_class {
            self.check(
                (1..=5).contains(&class),
                &format!("{field}.etsiEnDeviceEmissionsClass"),
                "must be between 1 and 5",
            );
        }
        self
    }

    pub fn shape(&mut self, shape: &Shape, field: &str) -> &mut Self {
        if let Shape::Polygon(polygon) = shape {
            self.check(polygon.exterior.len() >= 3, field, "must have at least three vertices");
        }
        self.check(!shape.points().is_empty(), field, "must not be empty");
        for p in shape.points() {
            if !p.is_valid() {
                return self.check(false, field, "must be a valid latitude/longitude");
            }
        }
        self
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

pub fn mvpd(params: &MvpdParams, plan: &ChannelPlan) -> Result<()> {
    Validator::new()
        .contact(&params.contact, "contact")
        .required(&params.call_sign, "callSign")
        .channel(params.channel, plan, "channel")
        .point(&params.receive_location, "receiveLocation")
        .events(&params.events, false, "events")
        .finish()
}

pub fn temp_bas(params: &TempBasParams, plan: &ChannelPlan) -> Result<()> {
    Validator::new()
        .contact(&params.contact, "contact")
        .channel(params.channel, plan, "channel")
        .point(&params.receive_location, "receiveLocation")
        .point(&params.transmit_location, "transmitLocation")
        .events(&params.events, true, "events")
        .finish()
}

pub fn lp_aux(params: &LpAuxParams, plan: &ChannelPlan) -> Result<()> {
    Validator::new()
        .contact(&params.contact, "contact")
        .required(&params.call_sign, "callSign")
        .channel(params.channel, plan, "channel")
        .venue(&params.points, params.quadrilateral.as_ref())
        .events(&params.events, true, "events")
        .finish()
}

pub fn unlicensed_lp_aux(params: &UnlicensedLpAuxParams, plan: &ChannelPlan) -> Result<()> {
    Validator::new()
        .contact(&params.contact, "contact")
        .required(&params.uls_file_number, "ulsFileNumber")
        .required(&params.venue_name, "venueName")
        .channel(params.channel, plan, "channel")
        .venue(&params.points, params.quadrilateral.as_ref())
        .events(&params.events, true, "events")
        .finish()
}

pub fn exclude_ids(request: &ExcludeIdsRequest) -> Result<()> {
    let mut v = Validator::new();
    v.required(&request.serial_number, "serialNumber");
    if let Some(id) = &request.device_id {
        v.required(id, "deviceId");
    }
    v.finish()
}

pub fn exclude_channels(request: &ExcludeChannelsRequest, plan: &ChannelPlan) -> Result<()> {
    let mut v = Validator::new();
    v.check(!request.channels.is_empty(), "channels", "must not be empty");
    for (i, channel) in request.channels.iter().enumerate() {
        v.channel(*channel, plan, &format!("channels[{i}]"));
    }
    v.check(!request.regions.is_empty(), "regions", "must not be empty");
    for (i, region) in request.regions.iter().enumerate() {
        v.shape(region, &format!("regions[{i}]"));
    }
    v.finish()
}
