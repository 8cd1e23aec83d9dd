//! Device-authorization backends

use std::collections::HashSet;

use async_trait::async_trait;
use paws_core::{DeviceDescriptor, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::DeviceAuthority;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeRequest<'a> {
    device_desc: &'a DeviceDescriptor,
}

#[derive(Deserialize)]
struct AuthorizeResponse {
    valid: bool,
}

/// Remote authorization service reached over HTTP.
///
/// `POST {base}/devices/validate` with `{"deviceDesc": ...}`, answered by
/// `{"valid": bool}`.
pub struct HttpDeviceAuthority {
    http: Client,
    base_url: String,
}

impl HttpDeviceAuthority {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DeviceAuthority for HttpDeviceAuthority {
    async fn authorize(&self, device: &DeviceDescriptor) -> Result<bool> {
        let url = format!("{}/devices/validate", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&AuthorizeRequest { device_desc: device })
            .send()
            .await
            .map_err(|e| Error::Authority(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Authority(format!(
                "{} returned {}",
                url,
                resp.status().as_u16()
            )));
        }

        let body: AuthorizeResponse = resp
            .json()
            .await
            .map_err(|e| Error::Authority(e.to_string()))?;
        tracing::debug!(serial = %device.serial_number, valid = body.valid, "Authority answered");
        Ok(body.valid)
    }
}

/// Local list of authorized serial numbers, for deployments without a
/// remote authority
#[derive(Debug, Default)]
pub struct AllowListAuthority {
    serials: HashSet<String>,
}

impl AllowListAuthority {
    pub fn new<I, S>(serials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            serials: serials.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl DeviceAuthority for AllowListAuthority {
    async fn authorize(&self, device: &DeviceDescriptor) -> Result<bool> {
        Ok(self.serials.contains(&device.serial_number))
    }
}
