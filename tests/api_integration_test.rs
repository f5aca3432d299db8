// API integration tests that verify HTTP endpoints
// Tests the actual Axum router with in-memory datasets

use std::sync::{Arc, RwLock};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Datelike, NaiveDate};
use http_body_util::BodyExt; // For `.collect()`
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot`

use seasonal_forecast_service::api::{create_router, AppState, RuntimeSettings};
use seasonal_forecast_service::forecast::TemperatureModelKind;
use seasonal_forecast_service::services::{
    CropService, RainfallService, SuitabilityService, TemperatureService,
};
use seasonal_forecast_service::store::{
    CropRainfallRule, CropRepository, CropTemperatureRule, RainfallObservation,
    RainfallRepository, TemperatureObservation, TemperatureRepository,
};

const FORECAST_YEAR: i32 = 2025;
const STATION_NAME: &str = "Goondiwindi Airport Average 2023 (QLD)";

fn temperature_fixture() -> Vec<TemperatureObservation> {
    let mut observations = Vec::new();
    let mut date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    while date <= end {
        let doy = date.ordinal() as f64;
        let temp = 20.0 + 10.0 * (2.0 * std::f64::consts::PI * doy / 365.0).cos();
        observations.push(TemperatureObservation {
            station_id: "41560".to_string(),
            station_name: STATION_NAME.to_string(),
            date,
            avg_temp: Some(temp),
        });
        date = date.succ_opt().unwrap();
    }
    observations
}

fn rainfall_fixture() -> Vec<RainfallObservation> {
    let mut observations = Vec::new();
    for year in [2023, 2024] {
        for month in 1..=12u32 {
            observations.push(RainfallObservation {
                station_id: "41560".to_string(),
                year,
                month,
                rainfall_mm: 40.0 + month as f64 * 2.0,
            });
        }
    }
    observations
}

fn crop_fixture() -> CropRepository {
    CropRepository::new(
        vec![CropTemperatureRule {
            crop: "Wheat".to_string(),
            temp_min: 10.0,
            temp_max: 26.0,
            best: Some(20.0),
        }],
        vec![CropRainfallRule {
            crop: "Wheat".to_string(),
            rainfall_min: 250.0,
            rainfall_max: 600.0,
        }],
    )
}

fn test_state() -> AppState {
    let temperature_repo = TemperatureRepository::new(temperature_fixture());
    let rainfall_repo = RainfallRepository::new(rainfall_fixture());
    let crop_repo = crop_fixture();

    AppState {
        temperature_service: TemperatureService::new(temperature_repo.clone(), FORECAST_YEAR),
        rainfall_service: RainfallService::new(rainfall_repo, FORECAST_YEAR),
        crop_service: CropService::new(crop_repo.clone()),
        suitability_service: SuitabilityService::new(temperature_repo, crop_repo, FORECAST_YEAR),
        settings: Arc::new(RwLock::new(RuntimeSettings {
            default_model: TemperatureModelKind::DecisionTree,
        })),
    }
}

fn create_test_app() -> Router {
    create_router(test_state())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_status_endpoint() {
    let app = create_test_app();
    let (status, json) = get_json(app, "/api/v1/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["default_model"], "decision_tree");
    assert_eq!(json["states_count"], 7);
    assert_eq!(json["crops_count"], 1);
    assert_eq!(json["rainfall_stations_count"], 1);
}

#[tokio::test]
async fn test_status_survives_a_poisoned_settings_lock() {
    let state = test_state();

    // Poison the settings lock by panicking while holding the writer.
    let settings = state.settings.clone();
    let _ = std::thread::spawn(move || {
        let _guard = settings.write().unwrap();
        panic!("poison the lock");
    })
    .join();
    assert!(state.settings.is_poisoned());

    let app = create_router(state);
    let (status, json) = get_json(app, "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["default_model"], "decision_tree");
}

#[tokio::test]
async fn test_states_list_all_seven() {
    let app = create_test_app();
    let (status, json) = get_json(app, "/api/v1/states").await;

    assert_eq!(status, StatusCode::OK);
    let states = json.as_array().unwrap();
    assert_eq!(states.len(), 7);
    assert!(states.iter().any(|s| s == "Queensland (QLD)"));
}

#[tokio::test]
async fn test_years_and_months() {
    let app = create_test_app();
    let (status, json) = get_json(app.clone(), "/api/v1/years").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([2023, FORECAST_YEAR]));

    let (status, json) = get_json(app, "/api/v1/months").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_month_name() {
    let app = create_test_app();
    let (status, json) = get_json(app.clone(), "/api/v1/month_name?month=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "February");

    let (status, _) = get_json(app, "/api/v1/month_name?month=13").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_crop_limits() {
    let app = create_test_app();
    let (status, json) = get_json(app.clone(), "/api/v1/crop/limits?crop=wheat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["min"], 10.0);
    assert_eq!(json["best"], 20.0);

    let (status, _) = get_json(app, "/api/v1/crop/limits?crop=durian").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_temps_for_a_historical_month() {
    let app = create_test_app();
    let uri = format!("/api/v1/temps?month=2&year=2023&states={}", "Queensland%20(QLD)");
    let (status, json) = get_json(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 28);
    assert_eq!(rows[0]["state"], "Queensland (QLD)");
    assert_eq!(rows[0]["day"], 1);
}

#[tokio::test]
async fn test_temps_reject_a_non_historical_year() {
    let app = create_test_app();
    let uri = format!(
        "/api/v1/temps?month=2&year={}&states=Queensland%20(QLD)",
        FORECAST_YEAR
    );
    let (status, _) = get_json(app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forecast_month_for_a_forecast_label() {
    let app = create_test_app();
    let uri = format!(
        "/api/v1/model/forecast?month=4&year={}&states=Goondiwindi%202025%20(QLD)&model=decision_tree",
        FORECAST_YEAR
    );
    let (status, json) = get_json(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 30);
    assert_eq!(rows[0]["state"], "Goondiwindi 2025 (QLD)");
    assert_eq!(rows[0]["month"], 4);
}

#[tokio::test]
async fn test_forecast_rejects_an_unknown_model() {
    let app = create_test_app();
    let uri = format!(
        "/api/v1/model/forecast?month=4&year={}&states=Goondiwindi%202025%20(QLD)&model=xgboost",
        FORECAST_YEAR
    );
    let (status, _) = get_json(app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rainfall_actuals_and_stations() {
    let app = create_test_app();
    let (status, json) = get_json(app.clone(), "/api/v1/rainfall/stations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!(["41560"]));

    let (status, json) =
        get_json(app, "/api/v1/rainfall/actuals?year=2023&stations=41560").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0]["station"], "41560");
    assert_eq!(rows[0]["month"], 1);
}

#[tokio::test]
async fn test_rainfall_forecast_year_gate() {
    let app = create_test_app();
    let (status, _) =
        get_json(app.clone(), "/api/v1/model/rainfall-forecast?year=2024&stations=41560").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/api/v1/model/rainfall-forecast?year={}&stations=41560",
        FORECAST_YEAR
    );
    let (status, json) = get_json(app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 12);
    assert!(rows.iter().all(|r| r["yhat"].as_f64().unwrap() >= 0.0));
}

#[tokio::test]
async fn test_crop_suitability_post() {
    let app = create_test_app();
    let body = json!({"year": 2023, "month": 7, "day": 1, "state": "QLD"});
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/model/suitability")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["crop"], "Wheat");
    assert_eq!(results[0]["station_id"], "41560");
}

#[tokio::test]
async fn test_crop_suitability_rejects_invalid_state() {
    let app = create_test_app();
    let body = json!({"year": 2023, "month": 7, "day": 1, "state": "ZZ"});
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/model/suitability")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_map_status() {
    let app = create_test_app();
    let (status, json) = get_json(app, "/api/v1/model/map-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "operational");
    assert_eq!(json["models_trained"], 1);
    assert_eq!(json["data_loaded"], true);
}

#[tokio::test]
async fn test_config_update_changes_the_default_model() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/api/v1/config")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"default_model": "polynomial"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["default_model"], "polynomial");

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/api/v1/config")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"default_model": "xgboost"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
