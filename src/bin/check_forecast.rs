use clap::Parser;

use seasonal_forecast_service::forecast::{forecast_temperature, TemperatureModelKind};
use seasonal_forecast_service::store::loader::load_temperature_csv;

#[derive(Parser)]
#[command(name = "check-forecast")]
#[command(about = "Run a temperature forecast against a CSV dataset", long_about = None)]
struct Cli {
    /// Station name as it appears in the dataset
    station: String,

    /// Target year
    year: i32,

    /// Target month (1-12)
    month: u32,

    /// Model: polynomial, decision_tree or random_forest
    #[arg(long, default_value = "random_forest")]
    model: String,

    /// Path to the daily temperature CSV
    #[arg(long, env, default_value = "datasets/temperature_daily_clean.csv")]
    temperature_csv: std::path::PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let kind = TemperatureModelKind::parse(&cli.model)
        .ok_or_else(|| format!("unknown model '{}'", cli.model))?;

    println!("Loading {}...", cli.temperature_csv.display());
    let observations = load_temperature_csv(&cli.temperature_csv)?;
    println!("{} observations loaded\n", observations.len());

    let forecasts = forecast_temperature(&observations, &cli.station, cli.year, cli.month, kind)?;
    if forecasts.is_empty() {
        println!(
            "No forecast produced for '{}' (no usable training rows)",
            cli.station
        );
        return Ok(());
    }

    println!(
        "Forecast for {} in {}/{} ({}):",
        cli.station,
        cli.month,
        cli.year,
        kind.as_str()
    );
    for f in &forecasts {
        println!("  day {:>2}: {:>6.2} C", f.day, f.predicted_temp);
    }
    let mean = forecasts.iter().map(|f| f.predicted_temp).sum::<f64>() / forecasts.len() as f64;
    println!("\nMonthly mean: {:.2} C over {} days", mean, forecasts.len());

    Ok(())
}
