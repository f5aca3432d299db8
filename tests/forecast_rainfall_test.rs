// Stacked rainfall ensemble tests over synthetic monthly histories.

use seasonal_forecast_service::forecast::{forecast_rainfall, ForecastError};
use seasonal_forecast_service::store::RainfallObservation;

/// Monthly totals with a wet-summer shape for the given years.
fn station_history(station_id: &str, years: &[i32]) -> Vec<RainfallObservation> {
    let mut observations = Vec::new();
    for &year in years {
        for month in 1..=12u32 {
            let seasonal =
                40.0 + 30.0 * (2.0 * std::f64::consts::PI * (month as f64 - 1.0) / 12.0).cos();
            observations.push(RainfallObservation {
                station_id: station_id.to_string(),
                year,
                month,
                rainfall_mm: seasonal + (month as f64) * 0.5,
            });
        }
    }
    observations
}

#[test]
fn two_year_history_produces_a_full_forecast_year() {
    let observations = station_history("41560", &[2023, 2024]);
    let forecasts =
        forecast_rainfall(&observations, &["41560".to_string()], 2025).unwrap();

    assert_eq!(forecasts.len(), 12);
    for (i, f) in forecasts.iter().enumerate() {
        assert_eq!(f.station_id, "41560");
        assert_eq!(f.year, 2025);
        assert_eq!(f.month, i as u32 + 1);
        assert!(f.predicted_rainfall_mm >= 0.0);
    }
}

#[test]
fn short_history_stations_are_skipped_not_errors() {
    let mut observations = station_history("41560", &[2023, 2024]);
    // Eleven months only; one short of the lag requirement.
    let mut short = station_history("9225", &[2024]);
    short.pop();
    observations.extend(short);

    let forecasts = forecast_rainfall(
        &observations,
        &["41560".to_string(), "9225".to_string()],
        2025,
    )
    .unwrap();

    assert!(forecasts.iter().all(|f| f.station_id == "41560"));
    assert_eq!(forecasts.len(), 12);
}

#[test]
fn a_twelve_month_station_gets_a_forecast() {
    // Twelve months is exactly enough history to participate.
    let mut observations = station_history("41560", &[2023, 2024]);
    observations.extend(station_history("9225", &[2024]));

    let forecasts = forecast_rainfall(
        &observations,
        &["41560".to_string(), "9225".to_string()],
        2025,
    )
    .unwrap();

    let perth: Vec<_> = forecasts.iter().filter(|f| f.station_id == "9225").collect();
    assert_eq!(perth.len(), 12);
}

#[test]
fn forecasts_are_deterministic() {
    let observations = station_history("41560", &[2023, 2024]);
    let a = forecast_rainfall(&observations, &["41560".to_string()], 2025).unwrap();
    let b = forecast_rainfall(&observations, &["41560".to_string()], 2025).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.predicted_rainfall_mm, y.predicted_rainfall_mm);
    }
}

#[test]
fn a_window_without_the_target_month_is_a_typed_error() {
    // Twelve January-only rows: the station clears the eligibility bar,
    // but once February comes up its window holds no row for month 2.
    let mut observations = station_history("41560", &[2023, 2024]);
    observations.extend((2013..2025).map(|year| RainfallObservation {
        station_id: "14999".to_string(),
        year,
        month: 1,
        rainfall_mm: 80.0,
    }));

    let result = forecast_rainfall(
        &observations,
        &["41560".to_string(), "14999".to_string()],
        2025,
    );
    assert!(matches!(
        result,
        Err(ForecastError::MissingSeasonalLag { ref station, month: 2 }) if station == "14999"
    ));
}

#[test]
fn stations_outside_the_request_are_ignored() {
    let mut observations = station_history("41560", &[2023, 2024]);
    observations.extend(station_history("9225", &[2023, 2024]));

    let forecasts =
        forecast_rainfall(&observations, &["41560".to_string()], 2025).unwrap();
    assert_eq!(forecasts.len(), 12);
    assert!(forecasts.iter().all(|f| f.station_id == "41560"));
}
