use std::sync::Arc;

use chrono::Datelike;
use serde::Serialize;

use crate::forecast::{forecast_temperature, ForecastError, TemperatureModelKind};
use crate::stations::{StationResolver, STATE_DISPLAY_NAMES};
use crate::store::TemperatureRepository;

/// One daily actual for the `/temps` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TempRow {
    pub state: String,
    pub day: u32,
    pub temp: f64,
}

/// One forecast day for the `/model/forecast` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastRow {
    pub state: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub yhat: f64,
}

/// Temperature actuals and forecasting, keyed by user-facing display
/// labels that are resolved to historical station names.
#[derive(Clone)]
pub struct TemperatureService {
    repo: TemperatureRepository,
    resolver: Arc<StationResolver>,
    forecast_year: i32,
}

impl TemperatureService {
    pub fn new(repo: TemperatureRepository, forecast_year: i32) -> Self {
        let resolver = Arc::new(StationResolver::new(repo.station_names()));
        Self {
            repo,
            resolver,
            forecast_year,
        }
    }

    pub fn repository(&self) -> &TemperatureRepository {
        &self.repo
    }

    pub fn forecast_year(&self) -> i32 {
        self.forecast_year
    }

    pub fn state_labels(&self) -> Vec<String> {
        STATE_DISPLAY_NAMES.iter().map(|s| s.to_string()).collect()
    }

    pub fn forecast_labels(&self) -> Vec<String> {
        self.resolver.forecast_labels(self.forecast_year)
    }

    /// Selectable years: every historical year plus the forecast year.
    pub fn years(&self) -> Vec<i32> {
        let mut years = self.repo.years();
        if !years.contains(&self.forecast_year) {
            years.push(self.forecast_year);
        }
        years
    }

    /// Whether the year can serve actuals (i.e. is present in the data).
    pub fn is_historical_year(&self, year: i32) -> bool {
        self.repo.years().contains(&year)
    }

    /// Daily actuals for one month across the requested display labels.
    /// Unknown labels contribute nothing; the response carries the
    /// display label, not the internal station name.
    pub fn monthly_actuals(&self, month: u32, year: i32, displays: &[String]) -> Vec<TempRow> {
        let mut station_names: Vec<String> = Vec::new();
        for display in displays {
            station_names.extend(self.resolver.stations_for_display(display).iter().cloned());
        }
        if station_names.is_empty() {
            return Vec::new();
        }

        let mut rows: Vec<TempRow> = self
            .repo
            .find_month(&station_names, year, month)
            .into_iter()
            .filter_map(|obs| {
                let temp = obs.avg_temp?;
                let state = self
                    .resolver
                    .display_for_station(&obs.station_name)
                    .unwrap_or(&obs.station_name)
                    .to_string();
                Some(TempRow {
                    state,
                    day: obs.date.day(),
                    temp,
                })
            })
            .collect();
        rows.sort_by(|a, b| (&a.state, a.day).cmp(&(&b.state, b.day)));
        rows
    }

    /// Forecast a month for each requested label.
    ///
    /// Forecast-year labels are resolved fuzzily back to historical
    /// station names; historical-year requests use the labels as exact
    /// station names. The response keeps the label the caller sent.
    pub fn forecast_month(
        &self,
        month: u32,
        year: i32,
        displays: &[String],
        kind: TemperatureModelKind,
    ) -> Result<Vec<ForecastRow>, ForecastError> {
        let mut results = Vec::new();
        for display in displays {
            let station_name = if year == self.forecast_year {
                self.resolver
                    .resolve(display)
                    .unwrap_or(display.as_str())
                    .to_string()
            } else {
                display.clone()
            };

            let predictions =
                forecast_temperature(self.repo.all(), &station_name, year, month, kind)?;
            results.extend(predictions.into_iter().map(|p| ForecastRow {
                state: display.clone(),
                year,
                month,
                day: p.day,
                yhat: p.predicted_temp,
            }));
        }
        Ok(results)
    }
}
