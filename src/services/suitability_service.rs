use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::forecast::temperature::MODEL_SEED;
use crate::model::{RandomForestRegressor, Regressor};
use crate::stations::{state_abbreviations, station_id_for_state};
use crate::store::TemperatureRepository;

/// Minimum usable rows before a station gets a startup model.
const MIN_TRAINING_ROWS: usize = 50;
const FOREST_TREES: usize = 100;
const FOREST_MAX_DEPTH: usize = 15;
const FOREST_MIN_SPLIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum SuitabilityError {
    #[error("invalid state '{state}'; valid states: {valid}")]
    InvalidState { state: String, valid: String },
    #[error("invalid date: {day}/{month}/{year}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("no actual temperature data for {state} on {day}/{month}/{year}")]
    NoActualData {
        state: String,
        year: i32,
        month: u32,
        day: u32,
    },
    #[error("prediction model not available for {state}")]
    ModelUnavailable { state: String },
    #[error("year {year} not supported; use a historical year or {forecast_year}")]
    UnsupportedYear { year: i32, forecast_year: i32 },
    #[error("crop suitability rules missing")]
    RulesMissing,
}

/// Point query, one (state, date) pair.
#[derive(Debug, Clone, Deserialize)]
pub struct SuitabilityQuery {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub state: String,
}

/// Per-crop verdict for the queried point.
#[derive(Debug, Clone, Serialize)]
pub struct CropSuitabilityResult {
    pub crop: String,
    pub is_suitable: bool,
    pub temp_min: f64,
    pub temp_max: f64,
    pub avg_temp: f64,
    pub station_id: String,
    pub station_name: String,
    pub best_temp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapStatus {
    pub status: &'static str,
    pub models_trained: usize,
    pub stations: Vec<&'static str>,
    pub data_loaded: bool,
    pub crops_loaded: bool,
    pub total_records: usize,
}

/// Point temperature lookup/prediction plus the crop range check.
///
/// One random-forest model per representative station is trained once at
/// construction and held read-only behind an `Arc` for the process
/// lifetime; concurrent point queries share the fitted models without
/// mutation.
#[derive(Clone)]
pub struct SuitabilityService {
    repo: TemperatureRepository,
    crops: crate::store::CropRepository,
    models: Arc<HashMap<String, RandomForestRegressor>>,
    station_names: Arc<HashMap<String, String>>,
    forecast_year: i32,
}

impl SuitabilityService {
    pub fn new(
        repo: TemperatureRepository,
        crops: crate::store::CropRepository,
        forecast_year: i32,
    ) -> Self {
        let name_clean_re = Regex::new(r"\s+Average|\s+\(").expect("name clean regex");
        let mut models = HashMap::new();
        let mut station_names = HashMap::new();

        for state in state_abbreviations() {
            let station_id = station_id_for_state(state).expect("mapped state");
            let rows = repo.find_by_station_id(station_id);
            if let Some(first) = rows.first() {
                let cleaned = name_clean_re
                    .split(&first.station_name)
                    .next()
                    .unwrap_or(&first.station_name)
                    .trim()
                    .to_string();
                station_names.insert(station_id.to_string(), cleaned);
            }

            let mut x = Vec::new();
            let mut y = Vec::new();
            for obs in &rows {
                if let Some(temp) = obs.avg_temp {
                    x.push(vec![obs.date.ordinal() as f64, obs.date.month() as f64]);
                    y.push(temp);
                }
            }
            if x.len() < MIN_TRAINING_ROWS {
                warn!(
                    state,
                    station_id,
                    rows = x.len(),
                    "skipping startup model: insufficient data"
                );
                continue;
            }

            let mut model =
                RandomForestRegressor::new(FOREST_TREES, Some(FOREST_MAX_DEPTH), MODEL_SEED)
                    .with_split_size(FOREST_MIN_SPLIT);
            match model.fit(&x, &y) {
                Ok(()) => {
                    info!(state, station_id, samples = x.len(), "trained startup model");
                    models.insert(station_id.to_string(), model);
                }
                Err(e) => warn!(state, station_id, error = %e, "startup model fit failed"),
            }
        }
        info!(
            trained = models.len(),
            mapped = state_abbreviations().len(),
            "map temperature models ready"
        );

        Self {
            repo,
            crops,
            models: Arc::new(models),
            station_names: Arc::new(station_names),
            forecast_year,
        }
    }

    /// Actual lookup for historical years, single-row model evaluation
    /// for the forecast year. The result is rounded to 0.1 °C.
    fn point_temperature(
        &self,
        query: &SuitabilityQuery,
    ) -> Result<(f64, String), SuitabilityError> {
        let station_id =
            station_id_for_state(&query.state).ok_or_else(|| SuitabilityError::InvalidState {
                state: query.state.clone(),
                valid: state_abbreviations().join(", "),
            })?;

        let date = NaiveDate::from_ymd_opt(query.year, query.month, query.day).ok_or(
            SuitabilityError::InvalidDate {
                year: query.year,
                month: query.month,
                day: query.day,
            },
        )?;

        let avg_temp = if query.year == self.forecast_year {
            let model =
                self.models
                    .get(station_id)
                    .ok_or_else(|| SuitabilityError::ModelUnavailable {
                        state: query.state.clone(),
                    })?;
            model.predict_one(&[date.ordinal() as f64, query.month as f64])
        } else if self.repo.years().contains(&query.year) {
            self.repo
                .find_by_station_and_date(station_id, date)
                .and_then(|obs| obs.avg_temp)
                .ok_or_else(|| SuitabilityError::NoActualData {
                    state: query.state.clone(),
                    year: query.year,
                    month: query.month,
                    day: query.day,
                })?
        } else {
            return Err(SuitabilityError::UnsupportedYear {
                year: query.year,
                forecast_year: self.forecast_year,
            });
        };

        Ok(((avg_temp * 10.0).round() / 10.0, station_id.to_string()))
    }

    /// Evaluate every crop rule against the resolved point temperature.
    /// The rule is a plain range check, not a learned model.
    pub fn evaluate(
        &self,
        query: &SuitabilityQuery,
    ) -> Result<Vec<CropSuitabilityResult>, SuitabilityError> {
        let (avg_temp, station_id) = self.point_temperature(query)?;

        let rules = self.crops.temperature_rules();
        if rules.is_empty() {
            return Err(SuitabilityError::RulesMissing);
        }

        let station_name = self
            .station_names
            .get(&station_id)
            .cloned()
            .unwrap_or_else(|| format!("Station {station_id}"));

        Ok(rules
            .iter()
            .map(|rule| CropSuitabilityResult {
                crop: rule.crop.clone(),
                is_suitable: avg_temp >= rule.temp_min && avg_temp <= rule.temp_max,
                temp_min: rule.temp_min,
                temp_max: rule.temp_max,
                avg_temp,
                station_id: station_id.clone(),
                station_name: station_name.clone(),
                best_temp: rule
                    .best
                    .unwrap_or((rule.temp_min + rule.temp_max) / 2.0),
            })
            .collect())
    }

    pub fn status(&self) -> MapStatus {
        MapStatus {
            status: "operational",
            models_trained: self.models.len(),
            stations: state_abbreviations(),
            data_loaded: !self.repo.is_empty(),
            crops_loaded: !self.crops.temperature_rules().is_empty(),
            total_records: self.repo.len(),
        }
    }
}
