use std::collections::BTreeSet;
use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};

use crate::store::{RainfallObservation, TemperatureObservation};

/// Number of days in a calendar month, leap-year aware.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Sine/cosine encoding of the month, `sin/cos(2π·month/12)`.
///
/// Avoids the false discontinuity between month 12 and month 1 that a raw
/// integer encoding introduces.
pub fn month_cyclical(month: u32) -> (f64, f64) {
    let angle = 2.0 * PI * month as f64 / 12.0;
    (angle.sin(), angle.cos())
}

/// Temperature feature row: `[day_of_year, year, month]`.
pub fn temperature_features(date: NaiveDate) -> Vec<f64> {
    vec![
        date.ordinal() as f64,
        date.year() as f64,
        date.month() as f64,
    ]
}

/// Feature matrix and target vector for a set of temperature
/// observations; rows with a missing temperature are excluded.
pub fn temperature_training_rows(
    observations: &[&TemperatureObservation],
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for obs in observations {
        if let Some(temp) = obs.avg_temp {
            x.push(temperature_features(obs.date));
            y.push(temp);
        }
    }
    (x, y)
}

/// Synthetic future rows for every calendar day of the target month, in
/// day order. `None` when (year, month) is not a valid calendar month.
pub fn future_month_rows(year: i32, month: u32) -> Option<Vec<Vec<f64>>> {
    let n_days = days_in_month(year, month)?;
    let mut rows = Vec::with_capacity(n_days as usize);
    for day in 1..=n_days {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        rows.push(temperature_features(date));
    }
    Some(rows)
}

/// One fully-derived rainfall training row. Only rows where every lag
/// exists are produced; a station's first 12 months never qualify.
#[derive(Debug, Clone)]
pub struct RainfallFeatureRow {
    pub station_id: String,
    pub year: i32,
    pub month: u32,
    pub month_sin: f64,
    pub month_cos: f64,
    pub rainfall_1_month_ago: f64,
    pub rainfall_1_year_ago: f64,
    pub rainfall_3_month_rolling_avg: f64,
    pub target: f64,
}

impl RainfallFeatureRow {
    /// Numeric feature vector, before one-hot columns are appended.
    /// Order is a schema contract shared with prediction-time rows.
    pub fn numeric_features(&self) -> Vec<f64> {
        vec![
            self.year as f64,
            self.month_sin,
            self.month_cos,
            self.rainfall_1_month_ago,
            self.rainfall_1_year_ago,
            self.rainfall_3_month_rolling_avg,
        ]
    }
}

/// Derive lag and rolling features across the whole historical table.
///
/// Rows are ordered by (station, year, month) before derivation; lags are
/// computed within each station's own sequence, never across stations.
/// Rows missing any derived value are dropped, so short histories
/// contribute fewer (possibly zero) training rows.
pub fn rainfall_training_rows(observations: &[RainfallObservation]) -> Vec<RainfallFeatureRow> {
    let mut sorted: Vec<&RainfallObservation> = observations.iter().collect();
    sorted.sort_by(|a, b| (&a.station_id, a.year, a.month).cmp(&(&b.station_id, b.year, b.month)));

    let mut rows = Vec::new();
    let mut start = 0;
    while start < sorted.len() {
        let station = &sorted[start].station_id;
        let mut end = start;
        while end < sorted.len() && &sorted[end].station_id == station {
            end += 1;
        }
        let series = &sorted[start..end];
        for i in 0..series.len() {
            // shift(12) is the binding constraint; shift(1) and the
            // 3-month window are implied once i >= 12.
            if i < 12 {
                continue;
            }
            let current = series[i];
            let rolling: f64 =
                series[i - 3..i].iter().map(|o| o.rainfall_mm).sum::<f64>() / 3.0;
            let (month_sin, month_cos) = month_cyclical(current.month);
            rows.push(RainfallFeatureRow {
                station_id: current.station_id.clone(),
                year: current.year,
                month: current.month,
                month_sin,
                month_cos,
                rainfall_1_month_ago: series[i - 1].rainfall_mm,
                rainfall_1_year_ago: series[i - 12].rainfall_mm,
                rainfall_3_month_rolling_avg: rolling,
                target: current.rainfall_mm,
            });
        }
        start = end;
    }
    rows
}

/// Drop-first one-hot encoding of station identity.
///
/// The category set and its ordering are fixed at fit time and form a
/// schema contract: prediction rows must be encoded against the exact same
/// columns, with stations unseen at training time zero-filled.
#[derive(Debug, Clone)]
pub struct StationEncoder {
    categories: Vec<String>,
}

impl StationEncoder {
    pub fn fit<'a>(station_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let categories: Vec<String> = station_ids
            .into_iter()
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { categories }
    }

    /// Width of the encoded block (one column per non-reference category).
    pub fn width(&self) -> usize {
        self.categories.len().saturating_sub(1)
    }

    /// Encode a station id; unseen stations produce an all-zero block.
    pub fn encode(&self, station_id: &str) -> Vec<f64> {
        let mut columns = vec![0.0_f64; self.width()];
        // The first (reference) category encodes as all zeros.
        if let Some(position) = self.categories.iter().position(|c| c == station_id) {
            if position > 0 {
                columns[position - 1] = 1.0;
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rainfall_series(station: &str, values: &[f64]) -> Vec<RainfallObservation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| RainfallObservation {
                station_id: station.to_string(),
                year: 2023 + (i / 12) as i32,
                month: (i % 12) as u32 + 1,
                rainfall_mm: v,
            })
            .collect()
    }

    #[test]
    fn leap_year_day_counts() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2025, 4), Some(30));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);
    }

    #[test]
    fn thirteen_row_sequence_produces_the_expected_lags() {
        let values: Vec<f64> = (1..=13).map(|v| v as f64).collect();
        let rows = rainfall_training_rows(&rainfall_series("41560", &values));

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.rainfall_1_month_ago, 12.0); // v12
        assert_eq!(row.rainfall_1_year_ago, 1.0); // v1
        assert_eq!(row.rainfall_3_month_rolling_avg, (10.0 + 11.0 + 12.0) / 3.0);
        assert_eq!(row.target, 13.0);
    }

    #[test]
    fn lags_never_cross_station_boundaries() {
        let mut observations = rainfall_series("a", &[1.0; 13]);
        observations.extend(rainfall_series("b", &[2.0; 12]));
        let rows = rainfall_training_rows(&observations);
        // Station b has only 12 rows, so only station a contributes.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].station_id, "a");
    }

    #[test]
    fn cyclical_encoding_wraps_smoothly_at_year_end() {
        let (sin_12, _) = month_cyclical(12);
        let (sin_1, _) = month_cyclical(1);
        // sin(2π) == 0 and sin(2π/12) is close; a raw integer encoding
        // would put months 12 and 1 eleven units apart.
        assert!(sin_12.abs() < 1e-12);
        assert!((sin_1 - sin_12).abs() < 0.51);
        let (_, cos_12) = month_cyclical(12);
        assert!((cos_12 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn encoder_drops_the_first_sorted_category() {
        let encoder = StationEncoder::fit(["b", "a", "c", "a"]);
        assert_eq!(encoder.width(), 2);
        assert_eq!(encoder.encode("a"), vec![0.0, 0.0]); // reference
        assert_eq!(encoder.encode("b"), vec![1.0, 0.0]);
        assert_eq!(encoder.encode("c"), vec![0.0, 1.0]);
        assert_eq!(encoder.encode("unseen"), vec![0.0, 0.0]);
    }

    #[test]
    fn future_rows_cover_every_day_of_a_leap_february() {
        let rows = future_month_rows(2024, 2).unwrap();
        assert_eq!(rows.len(), 29);
        assert_eq!(rows[0], vec![32.0, 2024.0, 2.0]); // Feb 1 is ordinal 32
        assert_eq!(rows[28], vec![60.0, 2024.0, 2.0]); // Feb 29
    }
}
