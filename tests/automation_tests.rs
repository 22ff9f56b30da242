mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use common::{AC_ID, HUB_ID, ac_status, client, controller, device_list, envelope};
use serde_json::json;
use switchbot_ac::automation::{
    Automation, Decision, DecisionContext, DecisionLog, DecisionStrategy, RunOptions, RunOutcome,
    WeatherClient, Window,
};
use switchbot_ac::config::{Config, LocationConfig};
use switchbot_ac::{AcController, AcMode, Action, Error, Result};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone)]
struct Scripted {
    decision: Option<Decision>,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn returning(decision: Decision) -> Self {
        Self {
            decision: Some(decision),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing() -> Self {
        Self {
            decision: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl DecisionStrategy for Scripted {
    async fn decide(&self, context: &DecisionContext) -> Result<Decision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(context.room.and_then(|r| r.temperature), Some(27.0));
        self.decision
            .clone()
            .ok_or_else(|| Error::Parse("model returned prose".to_string()))
    }
}

async fn mount_switchbot(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_list()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/devices/{HUB_ID}/status")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({"temperature": 27.0, "humidity": 58}))),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/devices/{AC_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ac_status(26, "cool", "auto")))
        .mount(server)
        .await;
}

async fn mount_weather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "35.6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current": {
                "temperature_2m": 24.1,
                "apparent_temperature": 25.0,
                "relative_humidity_2m": 80,
                "weather_code": 2
            }
        })))
        .mount(server)
        .await;
}

fn location(timezone: &str) -> LocationConfig {
    LocationConfig {
        lat: 35.6,
        lon: 139.7,
        timezone: timezone.to_string(),
    }
}

fn automation_with(
    controller: AcController,
    weather: &MockServer,
    strategy: Scripted,
    dir: &TempDir,
    location: LocationConfig,
) -> Automation<Scripted> {
    Automation::new(
        controller,
        WeatherClient::new(weather.uri()).unwrap(),
        strategy,
        DecisionLog::new(dir.path().join("decisions.ndjson")),
        Window::new(22, 7),
        location,
    )
}

fn automation(
    switchbot: &MockServer,
    weather: &MockServer,
    strategy: Scripted,
    dir: &TempDir,
) -> Automation<Scripted> {
    automation_with(controller(switchbot), weather, strategy, dir, location("UTC"))
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, hour, 0, 0).unwrap()
}

fn cool_to_22() -> Decision {
    Decision {
        action: Action::AdjustTemp,
        temperature: Some(22.0),
        reasoning: "room is warm".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn outside_schedule_does_nothing() {
    let (switchbot, weather) = (MockServer::start().await, MockServer::start().await);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&switchbot)
        .await;
    let dir = TempDir::new().unwrap();
    let strategy = Scripted::returning(cool_to_22());
    let job = automation(&switchbot, &weather, strategy.clone(), &dir);

    let outcome = job.run_once(at(14), RunOptions::default()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::OutsideSchedule { hour: 14 }));
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("decisions.ndjson").exists());
}

#[tokio::test]
async fn executes_and_records_decision() {
    let (switchbot, weather) = (MockServer::start().await, MockServer::start().await);
    mount_switchbot(&switchbot).await;
    mount_weather(&weather).await;
    Mock::given(method("POST"))
        .and(path(format!("/devices/{AC_ID}/commands")))
        .and(body_json(json!({
            "command": "setAll",
            "parameter": "22,cool,auto,on",
            "commandType": "command"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
        .expect(1)
        .mount(&switchbot)
        .await;

    let dir = TempDir::new().unwrap();
    let job = automation(&switchbot, &weather, Scripted::returning(cool_to_22()), &dir);
    let RunOutcome::Completed(report) = job.run_once(at(1), RunOptions::default()).await.unwrap()
    else {
        panic!("should run inside the window");
    };
    assert!(report.executed);
    assert_eq!(report.reason, "Success");
    assert_eq!(report.weather.unwrap().description, "partly cloudy");

    let history = DecisionLog::new(dir.path().join("decisions.ndjson"))
        .recent(10)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, Action::AdjustTemp);
    assert_eq!(history[0].room_temperature, Some(27.0));
    assert_eq!(history[0].outside_temperature, Some(24.1));
    assert_eq!(history[0].ac_mode, Some(AcMode::Cool));
    assert!(history[0].executed);
}

#[tokio::test]
async fn dry_run_sends_and_records_nothing() {
    let (switchbot, weather) = (MockServer::start().await, MockServer::start().await);
    mount_switchbot(&switchbot).await;
    mount_weather(&weather).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&switchbot)
        .await;

    let dir = TempDir::new().unwrap();
    let job = automation(&switchbot, &weather, Scripted::returning(cool_to_22()), &dir);
    let options = RunOptions {
        dry_run: true,
        force: true,
    };
    let RunOutcome::Completed(report) = job.run_once(at(15), options).await.unwrap() else {
        panic!("force should override the window");
    };
    assert!(!report.executed);
    assert_eq!(report.reason, "Dry run");
    assert!(!dir.path().join("decisions.ndjson").exists());
}

#[tokio::test]
async fn final_hour_turns_off_without_asking() {
    let (switchbot, weather) = (MockServer::start().await, MockServer::start().await);
    mount_switchbot(&switchbot).await;
    mount_weather(&weather).await;
    Mock::given(method("POST"))
        .and(path(format!("/devices/{AC_ID}/commands")))
        .and(body_json(json!({
            "command": "turnOff",
            "parameter": "default",
            "commandType": "command"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
        .expect(1)
        .mount(&switchbot)
        .await;

    let dir = TempDir::new().unwrap();
    let strategy = Scripted::returning(cool_to_22());
    let job = automation(&switchbot, &weather, strategy.clone(), &dir);
    let RunOutcome::Completed(report) = job.run_once(at(6), RunOptions::default()).await.unwrap()
    else {
        panic!("6:00 is inside the window");
    };
    assert_eq!(report.decision.action, Action::TurnOff);
    assert!(report.executed);
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn strategy_failure_degrades_to_no_action() {
    let (switchbot, weather) = (MockServer::start().await, MockServer::start().await);
    mount_switchbot(&switchbot).await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&weather)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&switchbot)
        .await;

    let dir = TempDir::new().unwrap();
    let job = automation(&switchbot, &weather, Scripted::failing(), &dir);
    let RunOutcome::Completed(report) = job.run_once(at(23), RunOptions::default()).await.unwrap()
    else {
        panic!("23:00 is inside the window");
    };
    assert!(report.weather.is_none());
    assert_eq!(report.decision.action, Action::None);
    assert!(report.decision.reasoning.starts_with("decision failed"));
    assert_eq!(report.reason, "No action");

    let history = DecisionLog::new(dir.path().join("decisions.ndjson"))
        .recent(10)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].executed);
}

async fn expect_command(server: &MockServer, command: &str, parameter: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/devices/{AC_ID}/commands")))
        .and(body_json(json!({
            "command": command,
            "parameter": parameter,
            "commandType": "command"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn final_hour_tracks_daylight_saving() {
    let (switchbot, weather) = (MockServer::start().await, MockServer::start().await);
    mount_switchbot(&switchbot).await;
    mount_weather(&weather).await;
    expect_command(&switchbot, "turnOff", "default").await;

    let dir = TempDir::new().unwrap();
    let strategy = Scripted::returning(cool_to_22());
    let job = automation_with(
        controller(&switchbot),
        &weather,
        strategy.clone(),
        &dir,
        location("Asia/Jerusalem"),
    );
    // 03:30 UTC is 06:30 in Jerusalem summer time.
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 3, 30, 0).unwrap();
    let RunOutcome::Completed(report) = job.run_once(now, RunOptions::default()).await.unwrap()
    else {
        panic!("06:30 local is inside the window");
    };
    assert_eq!(report.decision.action, Action::TurnOff);
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_timezone_fails_run() {
    let (switchbot, weather) = (MockServer::start().await, MockServer::start().await);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&switchbot)
        .await;

    let dir = TempDir::new().unwrap();
    let job = automation_with(
        controller(&switchbot),
        &weather,
        Scripted::returning(cool_to_22()),
        &dir,
        location("Nowhere/Special"),
    );
    let err = job.run_once(at(1), RunOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn missing_mode_uses_preferred_mode() {
    let (switchbot, weather) = (MockServer::start().await, MockServer::start().await);
    mount_switchbot(&switchbot).await;
    mount_weather(&weather).await;
    expect_command(&switchbot, "setAll", "19,heat,auto,on").await;

    let config = Config::from_toml_str(
        r#"
        [defaults]
        mode = "cool"

        [rules]
        preferred_mode = "heat"
        "#,
    )
    .unwrap();
    let ac = AcController::new(client(&switchbot), AC_ID, config.automation_defaults());
    let decision = Decision {
        action: Action::TurnOn,
        temperature: Some(19.0),
        mode: None,
        reasoning: "room is cold".to_string(),
        ..Default::default()
    };

    let dir = TempDir::new().unwrap();
    let job = automation_with(ac, &weather, Scripted::returning(decision), &dir, location("UTC"));
    let RunOutcome::Completed(report) = job.run_once(at(2), RunOptions::default()).await.unwrap()
    else {
        panic!("02:00 is inside the window");
    };
    assert!(report.executed);
    assert_eq!(report.command.unwrap().parameter, "19,heat,auto,on");
}
