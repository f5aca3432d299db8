pub mod api;
pub mod app;
pub mod config;
pub mod features;
pub mod forecast;
pub mod model;
pub mod services;
pub mod stations;
pub mod store;
