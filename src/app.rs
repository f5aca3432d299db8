use std::sync::{Arc, RwLock};

use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState, RuntimeSettings};
use crate::config::Config;
use crate::services::{CropService, RainfallService, SuitabilityService, TemperatureService};
use crate::store::loader::{
    load_crop_rainfall_csv, load_crop_temperature_csv, load_or_empty, load_rainfall_csv,
    load_temperature_csv,
};
use crate::store::{CropRepository, RainfallRepository, TemperatureRepository};

/// Application with the spawned HTTP server.
///
/// All models are trained either at startup (map temperature) or per
/// request, so beyond the server there are no background tasks to hold.
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Load the datasets, build the services (training the startup map
    /// models), and spawn the HTTP server.
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let temperature_rows = load_or_empty(
            "daily temperature",
            &config.temperature_csv,
            load_temperature_csv,
        );
        let rainfall_rows =
            load_or_empty("monthly rainfall", &config.rainfall_csv, load_rainfall_csv);
        let crop_temperature_rules = load_or_empty(
            "crop temperature rules",
            &config.crop_temperature_csv,
            load_crop_temperature_csv,
        );
        let crop_rainfall_rules = load_or_empty(
            "crop rainfall rules",
            &config.crop_rainfall_csv,
            load_crop_rainfall_csv,
        );

        let temperature_repo = TemperatureRepository::new(temperature_rows);
        let rainfall_repo = RainfallRepository::new(rainfall_rows);
        let crop_repo = CropRepository::new(crop_temperature_rules, crop_rainfall_rules);

        let temperature_service =
            TemperatureService::new(temperature_repo.clone(), config.forecast_year);
        let rainfall_service = RainfallService::new(rainfall_repo, config.forecast_year);
        let crop_service = CropService::new(crop_repo.clone());
        let suitability_service =
            SuitabilityService::new(temperature_repo, crop_repo, config.forecast_year);

        let app_state = AppState {
            temperature_service,
            rainfall_service,
            crop_service,
            suitability_service,
            settings: Arc::new(RwLock::new(RuntimeSettings {
                default_model: config.default_model,
            })),
        };
        let app = create_router(app_state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops (which runs indefinitely unless error)
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
