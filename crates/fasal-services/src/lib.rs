//! # fasal-services
//!
//! Outbound collaborators for FasalMitr.
//!
//! This crate provides:
//! - Nominatim reverse/forward geocoding
//! - OpenWeather current conditions
//! - Analysis service backends (HTTP endpoint, fixed-latency stub)
//! - JPEG compression of uploads
//! - Environment-driven service configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use fasal_core::AnalysisService;
//! use fasal_services::{ServiceConfig, Services};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::from_env()?;
//!     let services = Services::from_config(&config)?;
//!     println!("analysis backend: {}", services.analysis.name());
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod compress;
pub mod config;
pub mod nominatim;
pub mod weather;

use std::sync::Arc;

use fasal_core::{
    AnalysisService, ForwardGeocoder, ImageCompressor, Result, ReverseGeocoder, WeatherProvider,
};

pub use analysis::{canned_result, HttpAnalysisService, StubAnalysisService};
pub use compress::JpegCompressor;
pub use config::{ConfigError, ServiceConfig};
pub use nominatim::NominatimClient;
pub use weather::OpenWeatherClient;

/// Every outbound collaborator, built from one [`ServiceConfig`].
#[derive(Clone)]
pub struct Services {
    pub reverse_geocoder: Arc<dyn ReverseGeocoder>,
    pub forward_geocoder: Arc<dyn ForwardGeocoder>,
    pub weather: Arc<dyn WeatherProvider>,
    pub analysis: Arc<dyn AnalysisService>,
    pub compressor: Arc<dyn ImageCompressor>,
}

impl Services {
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;
        let nominatim = Arc::new(
            NominatimClient::new(config.nominatim_url.clone())?
                .with_timeout_secs(config.http_timeout_secs),
        );
        let weather = OpenWeatherClient::new(
            config.weather_url.clone(),
            config.weather_api_key.clone(),
        )?
        .with_timeout_secs(config.http_timeout_secs);

        Ok(Self {
            reverse_geocoder: nominatim.clone(),
            forward_geocoder: nominatim,
            weather: Arc::new(weather),
            analysis: config.analysis_service()?,
            compressor: Arc::new(JpegCompressor::default()),
        })
    }
}
