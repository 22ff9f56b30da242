#![allow(dead_code)]

use serde_json::{Value, json};
use switchbot_ac::{AcController, Credentials, Defaults, SwitchBotClient};
use wiremock::MockServer;

pub const AC_ID: &str = "02-AC-0001";
pub const HUB_ID: &str = "C0FFEE000001";

pub fn client(server: &MockServer) -> SwitchBotClient {
    SwitchBotClient::builder(Credentials::new("test-token", "test-secret"))
        .base_url(server.uri())
        .build()
        .expect("client builds")
}

pub fn controller(server: &MockServer) -> AcController {
    AcController::new(client(server), AC_ID, Defaults::default())
}

pub fn envelope(body: Value) -> Value {
    json!({"statusCode": 100, "message": "success", "body": body})
}

pub fn device_list() -> Value {
    envelope(json!({
        "deviceList": [
            {"deviceId": HUB_ID, "deviceName": "Hub 2", "deviceType": "Hub 2", "hubDeviceId": ""}
        ],
        "infraredRemoteList": [
            {"deviceId": AC_ID, "deviceName": "Bedroom AC", "remoteType": "Air Conditioner", "hubDeviceId": HUB_ID},
            {"deviceId": "02-TV-0001", "deviceName": "TV", "remoteType": "TV", "hubDeviceId": ""}
        ]
    }))
}

pub fn ac_status(temperature: i64, mode: &str, fan: &str) -> Value {
    envelope(json!({
        "power": "on",
        "temperature": temperature,
        "mode": mode,
        "fanSpeed": fan
    }))
}
