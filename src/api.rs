use std::sync::{Arc, RwLock};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::forecast::{ForecastError, TemperatureModelKind};
use crate::services::suitability_service::{
    CropSuitabilityResult, MapStatus, SuitabilityError, SuitabilityQuery,
};
use crate::services::temperature_service::{ForecastRow, TempRow};
use crate::services::{CropService, RainfallService, SuitabilityService, TemperatureService};

/// Settings mutable at runtime via `PUT /config`.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub default_model: TemperatureModelKind,
}

#[derive(Clone)]
pub struct AppState {
    pub temperature_service: TemperatureService,
    pub rainfall_service: RainfallService,
    pub crop_service: CropService,
    pub suitability_service: SuitabilityService,
    pub settings: Arc<RwLock<RuntimeSettings>>,
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/status", get(status))
        .route("/config", put(update_config))
        .route("/states", get(get_states))
        .route("/states/forecast", get(get_forecast_states))
        .route("/years", get(get_years))
        .route("/months", get(get_months))
        .route("/month_name", get(get_month_name))
        .route("/crops", get(list_crops))
        .route("/crop/limits", get(crop_limits))
        .route("/crop/rainfall-limits", get(crop_rainfall_limits))
        .route("/temps", get(get_monthly_temps))
        .route("/model/forecast", get(forecast_month))
        .route("/rainfall/stations", get(list_rainfall_stations))
        .route("/rainfall/crops", get(list_rainfall_crops))
        .route("/rainfall/actuals", get(get_rainfall_actuals))
        .route("/model/rainfall-forecast", get(forecast_rainfall_year))
        .route("/model/suitability", post(crop_suitability))
        .route("/model/map-status", get(map_status))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

/// Settings guard that survives lock poisoning: `RuntimeSettings` is a
/// plain value, so a writer that panicked cannot have left it
/// inconsistent.
fn read_settings(state: &AppState) -> std::sync::RwLockReadGuard<'_, RuntimeSettings> {
    state.settings.read().unwrap_or_else(|e| e.into_inner())
}

/// Comma-separated query values, trimmed, empties dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn month_name(month: u32) -> Option<&'static str> {
    Some(match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => return None,
    })
}

fn forecast_error_status(e: &ForecastError) -> StatusCode {
    // Every core failure is an internal fault; leniency cases never
    // reach this point.
    error!("forecast failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

fn suitability_error_status(e: &SuitabilityError) -> StatusCode {
    match e {
        SuitabilityError::InvalidState { .. }
        | SuitabilityError::InvalidDate { .. }
        | SuitabilityError::UnsupportedYear { .. } => StatusCode::BAD_REQUEST,
        SuitabilityError::NoActualData { .. } => StatusCode::NOT_FOUND,
        SuitabilityError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        SuitabilityError::RulesMissing => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ----------------------- meta / admin ---------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub version: &'static str,
    pub default_model: TemperatureModelKind,
    pub years: Vec<i32>,
    pub states_count: usize,
    pub crops_count: usize,
    pub rainfall_stations_count: usize,
    pub rainfall_crops_count: usize,
    pub endpoints: Vec<&'static str>,
}

#[instrument(skip(state))]
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    debug!("status requested");
    let default_model = read_settings(&state).default_model;
    Json(StatusResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        default_model,
        years: state.temperature_service.years(),
        states_count: state.temperature_service.state_labels().len(),
        crops_count: state.crop_service.temperature_crops().len(),
        rainfall_stations_count: state.rainfall_service.repository().station_count(),
        rainfall_crops_count: state.crop_service.rainfall_crops().len(),
        endpoints: vec![
            "/status",
            "/config (PUT)",
            "/states",
            "/states/forecast",
            "/years",
            "/months",
            "/month_name",
            "/crops",
            "/crop/limits",
            "/temps",
            "/model/forecast",
            "/rainfall/stations",
            "/rainfall/crops",
            "/crop/rainfall-limits",
            "/rainfall/actuals",
            "/model/rainfall-forecast",
            "/model/suitability (POST)",
            "/model/map-status",
        ],
    })
}

#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    pub default_model: Option<String>,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub ok: bool,
    pub default_model: TemperatureModelKind,
}

#[instrument(skip(state))]
async fn update_config(
    State(state): State<AppState>,
    Json(patch): Json<ConfigUpdate>,
) -> Result<Json<ConfigResponse>, StatusCode> {
    if let Some(raw) = &patch.default_model {
        let Some(kind) = TemperatureModelKind::parse(raw) else {
            warn!(model = %raw, "rejected config update: invalid model");
            return Err(StatusCode::BAD_REQUEST);
        };
        state
            .settings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .default_model = kind;
        info!(model = kind.as_str(), "default model updated");
    }
    let default_model = read_settings(&state).default_model;
    Ok(Json(ConfigResponse {
        ok: true,
        default_model,
    }))
}

// ----------------------- reference data -------------------------------

#[instrument(skip(state))]
async fn get_states(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.temperature_service.state_labels())
}

#[instrument(skip(state))]
async fn get_forecast_states(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.temperature_service.forecast_labels())
}

#[instrument(skip(state))]
async fn get_years(State(state): State<AppState>) -> Json<Vec<i32>> {
    Json(state.temperature_service.years())
}

async fn get_months() -> Json<Vec<u32>> {
    Json((1..=12).collect())
}

#[derive(Debug, Deserialize)]
pub struct MonthNameParams {
    pub month: u32,
}

#[derive(Serialize)]
pub struct MonthNameResponse {
    pub name: &'static str,
}

async fn get_month_name(
    Query(params): Query<MonthNameParams>,
) -> Result<Json<MonthNameResponse>, StatusCode> {
    month_name(params.month)
        .map(|name| Json(MonthNameResponse { name }))
        .ok_or(StatusCode::BAD_REQUEST)
}

#[instrument(skip(state))]
async fn list_crops(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.crop_service.temperature_crops())
}

#[derive(Debug, Deserialize)]
pub struct CropParams {
    pub crop: String,
}

#[instrument(skip(state), fields(crop = %params.crop))]
async fn crop_limits(
    State(state): State<AppState>,
    Query(params): Query<CropParams>,
) -> Result<impl IntoResponse, StatusCode> {
    state
        .crop_service
        .temperature_limits(&params.crop)
        .map(Json)
        .ok_or_else(|| {
            warn!("crop not found: {}", params.crop);
            StatusCode::NOT_FOUND
        })
}

#[instrument(skip(state), fields(crop = %params.crop))]
async fn crop_rainfall_limits(
    State(state): State<AppState>,
    Query(params): Query<CropParams>,
) -> Result<impl IntoResponse, StatusCode> {
    state
        .crop_service
        .rainfall_limits(&params.crop)
        .map(Json)
        .ok_or_else(|| {
            warn!("crop not found: {}", params.crop);
            StatusCode::NOT_FOUND
        })
}

// ----------------------- temperature ----------------------------------

#[derive(Debug, Deserialize)]
pub struct TempsParams {
    pub month: u32,
    pub year: i32,
    /// Comma-separated display labels, e.g. "Queensland (QLD)".
    pub states: String,
}

#[instrument(skip(state), fields(month = params.month, year = params.year))]
async fn get_monthly_temps(
    State(state): State<AppState>,
    Query(params): Query<TempsParams>,
) -> Result<Json<Vec<TempRow>>, StatusCode> {
    if !(1..=12).contains(&params.month) {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !state.temperature_service.is_historical_year(params.year) {
        warn!(year = params.year, "actuals requested for a non-historical year");
        return Err(StatusCode::BAD_REQUEST);
    }
    let displays = split_list(&params.states);
    if displays.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let rows = state
        .temperature_service
        .monthly_actuals(params.month, params.year, &displays);
    info!(rows = rows.len(), "retrieved temperature actuals");
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub month: u32,
    pub year: i32,
    pub states: String,
    /// polynomial | decision_tree | random_forest
    pub model: Option<String>,
}

#[instrument(skip(state), fields(month = params.month, year = params.year))]
async fn forecast_month(
    State(state): State<AppState>,
    Query(params): Query<ForecastParams>,
) -> Result<Json<Vec<ForecastRow>>, StatusCode> {
    if !(1..=12).contains(&params.month) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let displays = split_list(&params.states);
    if displays.is_empty() {
        return Ok(Json(Vec::new()));
    }

    // An explicit model parameter must be valid; only the configured
    // default path is lenient.
    let kind = match &params.model {
        Some(raw) => TemperatureModelKind::parse(raw).ok_or_else(|| {
            warn!(model = %raw, "rejected forecast: invalid model");
            StatusCode::BAD_REQUEST
        })?,
        None => read_settings(&state).default_model,
    };

    let rows = state
        .temperature_service
        .forecast_month(params.month, params.year, &displays, kind)
        .map_err(|e| forecast_error_status(&e))?;
    info!(
        rows = rows.len(),
        model = kind.as_str(),
        "temperature forecast complete"
    );
    Ok(Json(rows))
}

// ----------------------- rainfall -------------------------------------

#[instrument(skip(state))]
async fn list_rainfall_stations(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.rainfall_service.station_ids())
}

#[instrument(skip(state))]
async fn list_rainfall_crops(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.crop_service.rainfall_crops())
}

#[derive(Debug, Deserialize)]
pub struct RainfallActualsParams {
    pub year: i32,
    /// Comma-separated station IDs.
    pub stations: String,
}

#[instrument(skip(state), fields(year = params.year))]
async fn get_rainfall_actuals(
    State(state): State<AppState>,
    Query(params): Query<RainfallActualsParams>,
) -> Json<Vec<crate::services::rainfall_service::RainfallActualRow>> {
    let stations = split_list(&params.stations);
    if stations.is_empty() {
        return Json(Vec::new());
    }
    let rows = state.rainfall_service.actuals(params.year, &stations);
    info!(rows = rows.len(), "retrieved rainfall actuals");
    Json(rows)
}

#[derive(Debug, Deserialize)]
pub struct RainfallForecastParams {
    pub year: i32,
    pub stations: String,
}

#[derive(Serialize)]
pub struct RainfallForecastRow {
    pub station: String,
    pub year: i32,
    pub month: u32,
    pub yhat: f64,
}

#[instrument(skip(state), fields(year = params.year))]
async fn forecast_rainfall_year(
    State(state): State<AppState>,
    Query(params): Query<RainfallForecastParams>,
) -> Result<Json<Vec<RainfallForecastRow>>, StatusCode> {
    if params.year != state.rainfall_service.forecast_year() {
        warn!(
            year = params.year,
            supported = state.rainfall_service.forecast_year(),
            "rejected rainfall forecast: unsupported year"
        );
        return Err(StatusCode::BAD_REQUEST);
    }
    let stations = split_list(&params.stations);
    if stations.is_empty() {
        return Ok(Json(Vec::new()));
    }
    if state.rainfall_service.repository().is_empty() {
        error!("rainfall dataset not loaded");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let forecasts = state
        .rainfall_service
        .forecast_year_ahead(&stations)
        .map_err(|e| forecast_error_status(&e))?;
    info!(rows = forecasts.len(), "rainfall forecast complete");
    Ok(Json(
        forecasts
            .into_iter()
            .map(|f| RainfallForecastRow {
                station: f.station_id,
                year: f.year,
                month: f.month,
                yhat: f.predicted_rainfall_mm,
            })
            .collect(),
    ))
}

// ----------------------- map / suitability ----------------------------

#[instrument(skip(state), fields(state_abbr = %query.state, year = query.year))]
async fn crop_suitability(
    State(state): State<AppState>,
    Json(query): Json<SuitabilityQuery>,
) -> Result<Json<Vec<CropSuitabilityResult>>, StatusCode> {
    let results = state.suitability_service.evaluate(&query).map_err(|e| {
        warn!("suitability query failed: {}", e);
        suitability_error_status(&e)
    })?;
    info!(crops = results.len(), "suitability evaluated");
    Ok(Json(results))
}

#[instrument(skip(state))]
async fn map_status(State(state): State<AppState>) -> Json<MapStatus> {
    Json(state.suitability_service.status())
}
