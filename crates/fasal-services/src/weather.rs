//! OpenWeather current-conditions client.

use std::time::Duration;

use async_trait::async_trait;
use fasal_core::{defaults, Coordinate, Error, Result, WeatherProvider, WeatherReport};
use serde::Deserialize;
use tracing::{error, instrument};

/// Message shown when no API key is configured.
pub const MISSING_KEY_MESSAGE: &str = "Weather API key is not configured.";

pub struct OpenWeatherClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenWeatherClient {
    /// A client without a key still constructs; lookups report
    /// `Error::Config` until one is supplied.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(defaults::USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
        })
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct ConditionBlock {
    #[serde(default)]
    description: String,
}

impl From<CurrentResponse> for WeatherReport {
    fn from(r: CurrentResponse) -> Self {
        WeatherReport {
            temperature_c: r.main.temp,
            humidity_pct: r.main.humidity,
            condition: r
                .weather
                .into_iter()
                .next()
                .map(|w| w.description)
                .unwrap_or_default(),
            location_name: r.name.filter(|n| !n.is_empty()),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self), fields(component = "openweather"))]
    async fn current(&self, coordinate: Coordinate) -> Result<WeatherReport> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("{}", MISSING_KEY_MESSAGE);
            return Err(Error::Config(MISSING_KEY_MESSAGE.to_string()));
        };

        let url = format!("{}/data/2.5/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Weather API returned {}",
                response.status()
            )));
        }

        let body: CurrentResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("Failed to parse weather response: {}", e)))?;
        Ok(body.into())
    }
}
