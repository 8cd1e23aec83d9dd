//! End-to-end tests: a real server on a loopback port, driven over HTTP

use anyhow::Result;
use paws_core::{FreeChannel, GeoPoint};
use paws_engine::EngineConfig;
use paws_server::{create_router, create_shared_state, Fixtures, RpcResponse};
use serde_json::{json, Value};
use tokio::net::TcpListener;

struct TestServer {
    base: String,
    http: reqwest::Client,
    _reports: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Result<Self> {
        let reports = tempfile::tempdir()?;
        let config = EngineConfig {
            report_dir: reports.path().to_path_buf(),
            ..EngineConfig::default()
        };

        let (engine, _store) = fixtures().engine(config).await?;
        let app = create_router(create_shared_state(engine, None));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("test server stopped: {e}");
            }
        });

        Ok(Self {
            base: format!("http://{addr}"),
            http: reqwest::Client::new(),
            _reports: reports,
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<RpcResponse> {
        let body = json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 });
        let resp = self
            .http
            .post(format!("{}/paws", self.base))
            .json(&body)
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    async fn admin(&self, path: &str, body: Value) -> Result<(u16, Value)> {
        let resp = self
            .http
            .post(format!("{}{}", self.base, path))
            .header("x-user-id", "e2e")
            .json(&body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        Ok((status, resp.json().await?))
    }
}

fn free_channel(channel: u32, dbm: f64) -> FreeChannel {
    let start_hz = 470e6 + f64::from(channel - 21) * 8e6;
    FreeChannel {
        channel,
        start_hz,
        stop_hz: start_hz + 8e6,
        bandwidth: 8e6,
        max_power_dbm: dbm,
    }
}

fn fixtures() -> Fixtures {
    Fixtures {
        free_channels: vec![free_channel(21, 36.0), free_channel(22, 30.0), free_channel(30, 20.0)],
        clutter: vec![vec![4.0; 40], vec![6.0, 1.5]],
        authorized_serials: vec!["SN-1".to_string()],
        licensed_call_signs: vec!["WQAB123".to_string()],
        ..Fixtures::default()
    }
}

fn device(serial: &str) -> Value {
    json!({
        "serialNumber": serial,
        "manufacturerId": "acme",
        "modelId": "wsd-1",
        "rulesetIds": ["ETSI-EN-301-598-1.1.1"],
        "etsiEnDeviceEmissionsClass": 3
    })
}

fn location(lat: f64, lon: f64) -> Value {
    json!({ "point": { "center": GeoPoint::new(lat, lon) } })
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let server = TestServer::start().await?;
    let body: Value = reqwest::get(format!("{}/health", server.base)).await?.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["org_code"], "WSDB");

    let metrics = reqwest::get(format!("{}/metrics", server.base)).await?;
    assert_eq!(metrics.status().as_u16(), 404);
    Ok(())
}

#[tokio::test]
async fn test_device_flow_through_interference_report() -> Result<()> {
    let server = TestServer::start().await?;

    let init = server
        .rpc("spectrum.paws.init", json!({ "deviceDesc": device("SN-1"), "location": location(51.5, -0.12) }))
        .await?;
    assert_eq!(init.result.unwrap()["code"], 0);

    let spectrum = server
        .rpc(
            "spectrum.paws.getSpectrum",
            json!({ "deviceDesc": device("SN-1"), "location": location(51.5, -0.12) }),
        )
        .await?;
    let result = spectrum.result.expect("spectrum result");
    let schedules = result["spectrumSchedules"].as_array().unwrap();
    assert_eq!(schedules.len(), 1);
    let offered = &schedules[0]["spectra"][0];
    assert_eq!(offered["profiles"].as_array().unwrap().len(), 3);

    let notify = server
        .rpc(
            "spectrum.paws.notifySpectrumUse",
            json!({
                "deviceDesc": device("SN-1"),
                "location": location(51.5, -0.12),
                "spectra": [{
                    "resolutionBwHz": 8e6,
                    "profiles": [offered["profiles"][1].clone()]
                }]
            }),
        )
        .await?;
    assert!(notify.error.is_none(), "{:?}", notify.error);
    assert_eq!(notify.result.unwrap()["recorded"], 1);

    let (status, report) = server
        .admin(
            "/admin/interference",
            json!({
                "location": { "latitude": 51.501, "longitude": -0.12 },
                "radiusM": 2000.0,
                "requestor": "ops@example.org"
            }),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(report["code"], 1);
    assert_eq!(report["rows"][0]["channelsInUse"], json!(["22"]));
    assert_eq!(report["rows"][0]["protection"][1], 1.5);

    let csv = std::fs::read_to_string(report["report"].as_str().unwrap())?;
    assert!(csv.starts_with("DeviceId,SerialNumber,"));
    assert!(csv.lines().nth(1).unwrap().ends_with(",22"));
    Ok(())
}

#[tokio::test]
async fn test_notify_unoffered_power_is_spectrum_unavailable() -> Result<()> {
    let server = TestServer::start().await?;
    let notify = server
        .rpc(
            "spectrum.paws.notifySpectrumUse",
            json!({
                "deviceDesc": device("SN-1"),
                "location": location(51.5, -0.12),
                "spectra": [{
                    "resolutionBwHz": 8e6,
                    "profiles": [{ "channelId": "22", "hz": 478e6, "dbm": 31.0 }]
                }]
            }),
        )
        .await?;
    let error = notify.error.expect("notify should fail");
    assert_eq!(error.code, -202);
    assert!(error.message.contains("478000000"));
    Ok(())
}

#[tokio::test]
async fn test_register_returns_new_then_update() -> Result<()> {
    let server = TestServer::start().await?;
    let params = json!({
        "deviceDesc": device("SN-5"),
        "location": location(52.2, 0.12),
        "deviceOwner": { "owner": { "name": "Owner", "email": "owner@example.org" } }
    });

    let first = server.rpc("spectrum.paws.register", params.clone()).await?;
    assert_eq!(first.result.unwrap()["code"], 1);
    let second = server.rpc("spectrum.paws.register", params).await?;
    let result = second.result.unwrap();
    assert_eq!(result["code"], 2);
    assert!(result["disposition"]["regId"].as_str().unwrap().contains("WSDB"));
    Ok(())
}

#[tokio::test]
async fn test_verify_device_reports_each_device() -> Result<()> {
    let server = TestServer::start().await?;
    let response = server
        .rpc(
            "spectrum.paws.verifyDevice",
            json!({ "deviceDescs": [device("SN-1"), device("SN-2")] }),
        )
        .await?;
    let result = response.result.unwrap();
    let validities = result["deviceValidities"].as_array().unwrap();
    assert_eq!(validities[0]["code"], 1);
    assert_eq!(validities[0]["isValid"], true);
    assert_eq!(validities[1]["code"], -301);
    assert_eq!(validities[1]["isValid"], false);
    Ok(())
}

#[tokio::test]
async fn test_excluded_device_is_unauthorized() -> Result<()> {
    let server = TestServer::start().await?;
    let (status, body) = server
        .admin("/admin/exclusions/ids", json!({ "serialNumber": "SN-1" }))
        .await?;
    assert_eq!(status, 200);
    assert!(body["rowKey"].as_str().is_some());

    let response = server
        .rpc("spectrum.paws.verifyDevice", json!({ "deviceDescs": [device("SN-1")] }))
        .await?;
    assert_eq!(response.result.unwrap()["deviceValidities"][0]["code"], -301);
    Ok(())
}

#[tokio::test]
async fn test_rpc_envelope_errors() -> Result<()> {
    let server = TestServer::start().await?;

    let unknown = server.rpc("spectrum.paws.fly", json!({})).await?;
    assert_eq!(unknown.error.unwrap().code, -32601);

    let bad_params = server.rpc("spectrum.paws.init", json!({ "location": 5 })).await?;
    assert_eq!(bad_params.error.unwrap().code, -32602);

    let malformed: RpcResponse = server
        .http
        .post(format!("{}/paws", server.base))
        .body("{not json")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(malformed.error.unwrap().code, -32700);

    let unsupported = server
        .rpc(
            "spectrum.paws.getRulesetInfo",
            json!({ "deviceDesc": { "serialNumber": "SN-1", "rulesetIds": ["FCC-Part-15H"] } }),
        )
        .await?;
    assert_eq!(unsupported.error.unwrap().code, -102);
    Ok(())
}

#[tokio::test]
async fn test_lp_aux_registration_and_delete() -> Result<()> {
    let server = TestServer::start().await?;
    let start = chrono::Utc::now() + chrono::Duration::hours(1);
    let (status, registered) = server
        .admin(
            "/admin/incumbents",
            json!({
                "incumbentType": "LPAux",
                "contact": { "name": "Venue Ops", "email": "ops@example.org" },
                "callSign": "WQAB123",
                "channel": 33,
                "points": [{ "latitude": 51.5009, "longitude": -0.1774 }],
                "events": [{ "start": start, "end": start + chrono::Duration::hours(3) }]
            }),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(registered["success"], true, "{registered}");
    let reg_id = registered["regId"].as_str().unwrap().to_string();

    let delete = json!({ "incumbentType": "LPAux", "regId": reg_id });
    let (_, deleted) = server.admin("/admin/incumbents/delete", delete.clone()).await?;
    assert_eq!(deleted["result"], "Success");
    let (_, again) = server.admin("/admin/incumbents/delete", delete).await?;
    assert_eq!(again["result"], "No incumbents found");

    let (status, refused) = server
        .admin(
            "/admin/incumbents",
            json!({
                "incumbentType": "LPAux",
                "contact": { "name": "Venue Ops", "email": "ops@example.org" },
                "callSign": "NOPE1",
                "channel": 33,
                "points": [{ "latitude": 51.5009, "longitude": -0.1774 }],
                "events": [{ "start": start, "end": start + chrono::Duration::hours(3) }]
            }),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(refused["success"], false);
    assert_eq!(refused["errors"][0], "Call sign NOPE1 does not exist");
    Ok(())
}

#[tokio::test]
async fn test_admin_reads() -> Result<()> {
    let server = TestServer::start().await?;
    server
        .rpc("spectrum.paws.init", json!({ "deviceDesc": device("SN-1"), "location": location(51.5, -0.12) }))
        .await?;

    let info = reqwest::get(format!("{}/admin/devices/acme:SN-1", server.base)).await?;
    assert_eq!(info.status().as_u16(), 200);
    let info: Value = info.json().await?;
    assert_eq!(info["device"]["serialNumber"], "SN-1");

    let missing = reqwest::get(format!("{}/admin/devices/acme:SN-404", server.base)).await?;
    assert_eq!(missing.status().as_u16(), 404);
    let missing: Value = missing.json().await?;
    assert_eq!(missing["code"], "NOT_FOUND");

    let devices: Value = reqwest::get(format!("{}/admin/devices", server.base)).await?.json().await?;
    assert_eq!(devices.as_array().unwrap().len(), 1);

    let licenses: Value = reqwest::get(format!("{}/admin/licenses?licensed=true", server.base))
        .await?
        .json()
        .await?;
    assert_eq!(licenses[0]["licenseId"], "WQAB123");

    let start = chrono::Utc::now() + chrono::Duration::hours(1);
    let (_, registered) = server
        .admin(
            "/admin/incumbents",
            json!({
                "incumbentType": "LPAux",
                "contact": { "name": "Venue Ops", "email": "ops@example.org" },
                "callSign": "WQAB123",
                "channel": 33,
                "points": [{ "latitude": 51.5009, "longitude": -0.1774 }],
                "events": [{ "start": start, "end": start + chrono::Duration::hours(3) }]
            }),
        )
        .await?;
    assert_eq!(registered["success"], true, "{registered}");

    let mine: Value = reqwest::get(format!("{}/admin/incumbents?type=LPAux&userId=e2e", server.base))
        .await?
        .json()
        .await?;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let others: Value = reqwest::get(format!("{}/admin/incumbents?type=LPAux&userId=someone", server.base))
        .await?
        .json()
        .await?;
    assert!(others.as_array().unwrap().is_empty());
    Ok(())
}
