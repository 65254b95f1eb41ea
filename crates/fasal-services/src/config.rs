//! Service configuration.
//!
//! Values come from environment variables (`FASAL_*`), falling back to the
//! defaults in [`fasal_core::defaults`]. Hosts that keep settings in a `.env`
//! file load it with `dotenvy` before calling [`ServiceConfig::from_env`].
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FASAL_WEATHER_API_KEY` | (none) | OpenWeather API key |
//! | `FASAL_WEATHER_URL` | `https://api.openweathermap.org` | Weather base URL |
//! | `FASAL_NOMINATIM_URL` | `https://nominatim.openstreetmap.org` | Geocoder base URL |
//! | `FASAL_ANALYSIS_ENDPOINT` | (none) | Analysis backend; stub when unset |
//! | `FASAL_ANALYSIS_LATENCY_MS` | `1200` | Stub analysis latency |
//! | `FASAL_GEOLOCATION_TIMEOUT_SECS` | `10` | Position + reverse geocode budget |
//! | `FASAL_HTTP_TIMEOUT_SECS` | `15` | Per-request HTTP timeout |
//! | `FASAL_COUNTRY_CODES` | `in` | Forward geocode country scope |

use std::sync::Arc;
use std::time::Duration;

use fasal_core::defaults;
use fasal_core::AnalysisService;
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{HttpAnalysisService, StubAnalysisService};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for fasal_core::Error {
    fn from(e: ConfigError) -> Self {
        fasal_core::Error::Config(e.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for every outbound collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub nominatim_url: String,
    pub weather_url: String,
    pub weather_api_key: Option<String>,
    pub analysis_endpoint: Option<String>,
    pub analysis_latency_ms: u64,
    pub geolocation_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub country_codes: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            nominatim_url: defaults::NOMINATIM_URL.to_string(),
            weather_url: defaults::WEATHER_URL.to_string(),
            weather_api_key: None,
            analysis_endpoint: None,
            analysis_latency_ms: defaults::ANALYSIS_STUB_LATENCY_MS,
            geolocation_timeout_secs: defaults::GEOLOCATION_TIMEOUT_SECS,
            http_timeout_secs: defaults::HTTP_TIMEOUT_SECS,
            country_codes: defaults::GEOCODE_COUNTRY_CODES.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let base = Self::default();

        let config = Self {
            nominatim_url: get(defaults::ENV_NOMINATIM_URL).unwrap_or(base.nominatim_url),
            weather_url: get(defaults::ENV_WEATHER_URL).unwrap_or(base.weather_url),
            weather_api_key: get(defaults::ENV_WEATHER_API_KEY),
            analysis_endpoint: get(defaults::ENV_ANALYSIS_ENDPOINT),
            analysis_latency_ms: parse_u64(
                defaults::ENV_ANALYSIS_LATENCY_MS,
                get(defaults::ENV_ANALYSIS_LATENCY_MS),
                base.analysis_latency_ms,
            )?,
            geolocation_timeout_secs: parse_u64(
                defaults::ENV_GEOLOCATION_TIMEOUT_SECS,
                get(defaults::ENV_GEOLOCATION_TIMEOUT_SECS),
                base.geolocation_timeout_secs,
            )?,
            http_timeout_secs: parse_u64(
                defaults::ENV_HTTP_TIMEOUT_SECS,
                get(defaults::ENV_HTTP_TIMEOUT_SECS),
                base.http_timeout_secs,
            )?,
            country_codes: get(defaults::ENV_COUNTRY_CODES).unwrap_or(base.country_codes),
        };
        config.validate()?;

        debug!(
            nominatim_url = %config.nominatim_url,
            weather_key_set = config.weather_api_key.is_some(),
            analysis_endpoint = ?config.analysis_endpoint,
            "Loaded service configuration"
        );
        Ok(config)
    }

    pub fn with_weather_api_key(mut self, key: impl Into<String>) -> Self {
        self.weather_api_key = Some(key.into());
        self
    }

    pub fn with_nominatim_url(mut self, url: impl Into<String>) -> Self {
        self.nominatim_url = url.into();
        self
    }

    pub fn with_weather_url(mut self, url: impl Into<String>) -> Self {
        self.weather_url = url.into();
        self
    }

    pub fn with_analysis_endpoint(mut self, url: impl Into<String>) -> Self {
        self.analysis_endpoint = Some(url.into());
        self
    }

    pub fn with_analysis_latency_ms(mut self, ms: u64) -> Self {
        self.analysis_latency_ms = ms;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_url("nominatim_url", &self.nominatim_url)?;
        validate_url("weather_url", &self.weather_url)?;
        if let Some(endpoint) = &self.analysis_endpoint {
            validate_url("analysis_endpoint", endpoint)?;
        }
        if self.geolocation_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "geolocation_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation_timeout_secs)
    }

    /// The analysis backend this configuration selects: the HTTP client when
    /// an endpoint is configured, otherwise the fixed-latency stub.
    pub fn analysis_service(&self) -> fasal_core::Result<Arc<dyn AnalysisService>> {
        match &self.analysis_endpoint {
            Some(endpoint) => {
                info!(endpoint = %endpoint, "Using HTTP analysis service");
                Ok(Arc::new(HttpAnalysisService::new(endpoint.clone())?))
            }
            None => {
                info!(
                    latency_ms = self.analysis_latency_ms,
                    "No analysis endpoint configured, using stub analysis service"
                );
                Ok(Arc::new(
                    StubAnalysisService::new().with_latency_ms(self.analysis_latency_ms),
                ))
            }
        }
    }
}

fn parse_u64(name: &'static str, raw: Option<String>, default: u64) -> ConfigResult<u64> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn validate_url(name: &str, url: &str) -> ConfigResult<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{} must start with http:// or https://, got: {}",
            name, url
        )));
    }
    Ok(())
}
