use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use super::models::{
    CropRainfallRule, CropTemperatureRule, RainfallObservation, TemperatureObservation,
};

/// In-memory temperature dataset, immutable after startup.
#[derive(Debug, Clone)]
pub struct TemperatureRepository {
    observations: Arc<Vec<TemperatureObservation>>,
}

impl TemperatureRepository {
    pub fn new(observations: Vec<TemperatureObservation>) -> Self {
        Self {
            observations: Arc::new(observations),
        }
    }

    pub fn all(&self) -> &[TemperatureObservation] {
        &self.observations
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Distinct station names, sorted.
    pub fn station_names(&self) -> Vec<String> {
        self.observations
            .iter()
            .map(|o| o.station_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct years present in the data, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.observations
            .iter()
            .map(|o| o.date.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn find_by_station_id(&self, station_id: &str) -> Vec<&TemperatureObservation> {
        self.observations
            .iter()
            .filter(|o| o.station_id == station_id)
            .collect()
    }

    pub fn find_by_station_and_date(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> Option<&TemperatureObservation> {
        self.observations
            .iter()
            .find(|o| o.station_id == station_id && o.date == date)
    }

    /// Daily rows for the given station names within one calendar month.
    pub fn find_month(
        &self,
        station_names: &[String],
        year: i32,
        month: u32,
    ) -> Vec<&TemperatureObservation> {
        self.observations
            .iter()
            .filter(|o| {
                o.date.year() == year
                    && o.date.month() == month
                    && station_names.iter().any(|name| name == &o.station_name)
            })
            .collect()
    }
}

/// In-memory monthly rainfall dataset, immutable after startup.
#[derive(Debug, Clone)]
pub struct RainfallRepository {
    observations: Arc<Vec<RainfallObservation>>,
}

impl RainfallRepository {
    pub fn new(observations: Vec<RainfallObservation>) -> Self {
        Self {
            observations: Arc::new(observations),
        }
    }

    pub fn all(&self) -> &[RainfallObservation] {
        &self.observations
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct station identifiers, sorted.
    pub fn station_ids(&self) -> Vec<String> {
        self.observations
            .iter()
            .map(|o| o.station_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn station_count(&self) -> usize {
        self.station_ids().len()
    }

    /// Actual rows for one year across the requested stations, sorted by
    /// (station, year, month).
    pub fn find_actuals(&self, year: i32, station_ids: &[String]) -> Vec<&RainfallObservation> {
        let mut rows: Vec<&RainfallObservation> = self
            .observations
            .iter()
            .filter(|o| o.year == year && station_ids.iter().any(|id| id == &o.station_id))
            .collect();
        rows.sort_by(|a, b| {
            (&a.station_id, a.year, a.month).cmp(&(&b.station_id, b.year, b.month))
        });
        rows
    }
}

/// Crop tolerance tables (temperature + rainfall), immutable after startup.
#[derive(Debug, Clone)]
pub struct CropRepository {
    temperature_rules: Arc<Vec<CropTemperatureRule>>,
    rainfall_rules: Arc<Vec<CropRainfallRule>>,
}

impl CropRepository {
    pub fn new(
        temperature_rules: Vec<CropTemperatureRule>,
        rainfall_rules: Vec<CropRainfallRule>,
    ) -> Self {
        Self {
            temperature_rules: Arc::new(temperature_rules),
            rainfall_rules: Arc::new(rainfall_rules),
        }
    }

    pub fn temperature_rules(&self) -> &[CropTemperatureRule] {
        &self.temperature_rules
    }

    pub fn rainfall_rules(&self) -> &[CropRainfallRule] {
        &self.rainfall_rules
    }

    pub fn temperature_crop_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .temperature_rules
            .iter()
            .map(|r| r.crop.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        names.sort();
        names
    }

    pub fn rainfall_crop_names(&self) -> Vec<String> {
        self.rainfall_rules
            .iter()
            .map(|r| r.crop.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn find_temperature_rule(&self, crop: &str) -> Option<&CropTemperatureRule> {
        let wanted = crop.trim().to_lowercase();
        self.temperature_rules
            .iter()
            .find(|r| r.crop.to_lowercase() == wanted)
    }

    pub fn find_rainfall_rule(&self, crop: &str) -> Option<&CropRainfallRule> {
        let wanted = crop.trim().to_lowercase();
        self.rainfall_rules
            .iter()
            .find(|r| r.crop.to_lowercase() == wanted)
    }
}
