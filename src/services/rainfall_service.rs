use serde::Serialize;

use crate::forecast::{forecast_rainfall, ForecastError, MonthlyRainfallForecast};
use crate::store::RainfallRepository;

/// One actual monthly total for the `/rainfall/actuals` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RainfallActualRow {
    pub station: String,
    pub year: i32,
    pub month: u32,
    pub rainfall: f64,
}

/// Rainfall actuals and the stacked whole-year forecast.
#[derive(Clone)]
pub struct RainfallService {
    repo: RainfallRepository,
    forecast_year: i32,
}

impl RainfallService {
    pub fn new(repo: RainfallRepository, forecast_year: i32) -> Self {
        Self {
            repo,
            forecast_year,
        }
    }

    pub fn repository(&self) -> &RainfallRepository {
        &self.repo
    }

    pub fn forecast_year(&self) -> i32 {
        self.forecast_year
    }

    pub fn station_ids(&self) -> Vec<String> {
        self.repo.station_ids()
    }

    pub fn actuals(&self, year: i32, station_ids: &[String]) -> Vec<RainfallActualRow> {
        self.repo
            .find_actuals(year, station_ids)
            .into_iter()
            .map(|obs| RainfallActualRow {
                station: obs.station_id.clone(),
                year: obs.year,
                month: obs.month,
                rainfall: obs.rainfall_mm,
            })
            .collect()
    }

    /// Whole-year stacked forecast; only the configured forecast year is
    /// supported. Stations with insufficient history are omitted from the
    /// result, not errors.
    pub fn forecast_year_ahead(
        &self,
        station_ids: &[String],
    ) -> Result<Vec<MonthlyRainfallForecast>, ForecastError> {
        forecast_rainfall(self.repo.all(), station_ids, self.forecast_year)
    }
}
