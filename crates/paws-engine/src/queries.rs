//! Read-side operator queries over registrations, devices and licenses

use paws_core::{
    BroadcastStation, Error, IncumbentRegistration, IncumbentType, InitializedDevice,
    LpAuxLicenseInfo, Result,
};
use tracing::debug;

use crate::engine::PawsEngine;

impl PawsEngine {
    /// Registrations of one incumbent type, optionally only those created
    /// by `owner_id`.
    pub async fn get_incumbents(
        &self,
        kind: IncumbentType,
        owner_id: Option<&str>,
    ) -> Result<Vec<IncumbentRegistration>> {
        let owner_id = owner_id.map(str::trim).filter(|id| !id.is_empty());
        let rows = self.store.incumbents_of(kind, owner_id).await?;
        debug!(%kind, owner = ?owner_id, rows = rows.len(), "Listed incumbents");
        Ok(rows)
    }

    /// The initialized device stored under `device_id` (`manufacturerId:serialNumber`)
    pub async fn get_device_info(&self, device_id: &str) -> Result<InitializedDevice> {
        self.store
            .find_initialized_device(device_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("device {device_id}")))
    }

    /// Every initialized device, ordered by device id
    pub async fn get_devices(&self) -> Result<Vec<InitializedDevice>> {
        self.store.initialized_devices().await
    }

    /// Licensed call signs, or the ULS venue licenses backing unlicensed
    /// LP-Aux registrations.
    pub async fn get_lp_aux_license_info(&self, licensed: bool) -> Result<Vec<LpAuxLicenseInfo>> {
        if licensed {
            let call_signs = self.store.licensed_call_signs().await?;
            return Ok(call_signs
                .iter()
                .map(|c| LpAuxLicenseInfo::call_sign(c))
                .collect());
        }

        let mut licenses = self.store.all_uls_licenses().await?;
        licenses.sort_by(|a, b| a.file_number.cmp(&b.file_number));
        Ok(licenses.into_iter().map(LpAuxLicenseInfo::from).collect())
    }

    /// Broadcast stations transmitting under an MVPD call sign
    pub async fn get_mvpd_call_sign_info(&self, call_sign: &str) -> Result<Vec<BroadcastStation>> {
        let stations = self.store.broadcast_stations(call_sign).await?;
        if stations.is_empty() {
            return Err(Error::NotFound(format!("call sign {}", call_sign.trim())));
        }
        Ok(stations)
    }
}
