//! JSON-RPC 2.0 dispatch for the PAWS device surface
//!
//! Every PAWS method answers with either a `result` carrying its success
//! `code`, or an `error` whose `code` is the PAWS status of the failure.

use std::time::Instant;

use paws_core::paws::{
    AvailableSpectrumBatchRequest, AvailableSpectrumRequest, DeviceValidityRequest, InitRequest,
    NotifySpectrumUseRequest, RegistrationRequest, RulesetInfoRequest,
};
use paws_core::{codes, RegionContext};
use paws_engine::boundary::{self, PawsOutcome};
use paws_engine::PawsEngine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::metrics;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl From<PawsOutcome> for RpcError {
    fn from(outcome: PawsOutcome) -> Self {
        Self {
            code: outcome.code,
            message: outcome.message.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn parse_error(message: String) -> Self {
        Self::failure(
            Value::Null,
            RpcError {
                code: PARSE_ERROR,
                message,
            },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GetRulesetInfo,
    GetSpectrum,
    GetSpectrumBatch,
    Register,
    Init,
    VerifyDevice,
    NotifySpectrumUse,
}

impl Method {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "spectrum.paws.getRulesetInfo" => Method::GetRulesetInfo,
            "spectrum.paws.getSpectrum" => Method::GetSpectrum,
            "spectrum.paws.getSpectrumBatch" => Method::GetSpectrumBatch,
            "spectrum.paws.register" => Method::Register,
            "spectrum.paws.init" => Method::Init,
            "spectrum.paws.verifyDevice" => Method::VerifyDevice,
            "spectrum.paws.notifySpectrumUse" => Method::NotifySpectrumUse,
            _ => return None,
        })
    }

    /// Short name used in logs and metric labels
    pub fn name(&self) -> &'static str {
        match self {
            Method::GetRulesetInfo => "getRulesetInfo",
            Method::GetSpectrum => "getSpectrum",
            Method::GetSpectrumBatch => "getSpectrumBatch",
            Method::Register => "register",
            Method::Init => "init",
            Method::VerifyDevice => "verifyDevice",
            Method::NotifySpectrumUse => "notifySpectrumUse",
        }
    }
}

fn params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError {
        code: INVALID_PARAMS,
        message: format!("Invalid params: {e}"),
    })
}

/// Map an engine result through the status boundary into an RPC body
fn respond<T>(
    method: Method,
    result: paws_core::Result<T>,
    success: impl FnOnce(&T) -> i32,
    body: impl FnOnce(T, i32) -> Value,
) -> Result<Value, RpcError> {
    let outcome = boundary::outcome(method.name(), &result, success);
    match result {
        Ok(value) => Ok(body(value, outcome.code)),
        Err(_) => Err(outcome.into()),
    }
}

pub async fn dispatch(engine: &PawsEngine, request: RpcRequest) -> RpcResponse {
    if request.jsonrpc != JSONRPC_VERSION {
        tracing::debug!(version = %request.jsonrpc, "Non-2.0 JSON-RPC envelope accepted");
    }
    let Some(method) = Method::parse(&request.method) else {
        return RpcResponse::failure(
            request.id,
            RpcError {
                code: METHOD_NOT_FOUND,
                message: format!("Unknown method {}", request.method),
            },
        );
    };

    let started = Instant::now();
    let ctx = engine.context();
    let response = match call(engine, &ctx, method, request.params).await {
        Ok(result) => RpcResponse::success(request.id, result),
        Err(error) => {
            metrics::record_error(method.name(), error.code);
            RpcResponse::failure(request.id, error)
        }
    };
    metrics::record_request(method.name(), started.elapsed().as_secs_f64());
    response
}

async fn call(
    engine: &PawsEngine,
    ctx: &RegionContext,
    method: Method,
    raw: Value,
) -> Result<Value, RpcError> {
    match method {
        Method::GetRulesetInfo => {
            let request: RulesetInfoRequest = params(raw)?;
            respond(method, engine.rule_set_info(&request), |_| codes::OK, |infos, code| {
                json!({ "code": code, "rulesetInfos": infos })
            })
        }
        Method::GetSpectrum => {
            let request: AvailableSpectrumRequest = params(raw)?;
            let result = engine.available_spectrum(ctx, &request).await;
            respond(method, result, |_| codes::OK, |schedules, code| {
                json!({
                    "code": code,
                    "timestamp": ctx.now,
                    "deviceDesc": request.device_desc,
                    "spectrumSchedules": schedules,
                })
            })
        }
        Method::GetSpectrumBatch => {
            let request: AvailableSpectrumBatchRequest = params(raw)?;
            let result = engine.available_spectrum_batch(ctx, &request).await;
            respond(method, result, |_| codes::OK, |specs, code| {
                json!({
                    "code": code,
                    "timestamp": ctx.now,
                    "deviceDesc": request.device_desc,
                    "geoSpectrumSpecs": specs,
                })
            })
        }
        Method::Register => {
            let request: RegistrationRequest = params(raw)?;
            let result = engine.register(ctx, &request).await;
            respond(
                method,
                result,
                |disposition| i32::from(disposition.action.code()),
                |disposition, code| json!({ "code": code, "disposition": disposition }),
            )
        }
        Method::Init => {
            let request: InitRequest = params(raw)?;
            let rulesets = engine.config().rulesets.clone();
            respond(method, engine.initialize(ctx, &request).await, |_| codes::OK, |_, code| {
                json!({ "code": code, "rulesetInfos": rulesets })
            })
        }
        Method::VerifyDevice => {
            let request: DeviceValidityRequest = params(raw)?;
            let mut validities = Vec::with_capacity(request.device_descs.len());
            for (index, device) in request.device_descs.iter().enumerate() {
                let result = engine.validate_device(ctx, &request, index).await;
                let outcome = boundary::outcome(method.name(), &result, |_| codes::VALIDATED);
                validities.push(json!({
                    "deviceDesc": device,
                    "isValid": outcome.is_success(),
                    "code": outcome.code,
                    "reason": outcome.message,
                }));
            }
            Ok(json!({ "code": codes::OK, "deviceValidities": validities }))
        }
        Method::NotifySpectrumUse => {
            let request: NotifySpectrumUseRequest = params(raw)?;
            let result = engine.notify_spectrum_usage(ctx, &request).await;
            respond(method, result, |_| codes::OK, |recorded, code| {
                json!({ "code": code, "recorded": recorded })
            })
        }
    }
}
