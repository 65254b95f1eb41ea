//! Weather by coordinate or by typed place name.

use std::sync::Arc;

use fasal_core::{
    defaults, Coordinate, Error, ForwardGeocoder, InputError, Result, WeatherProvider,
    WeatherReport,
};
use tracing::{debug, instrument};

pub struct WeatherLookup {
    provider: Arc<dyn WeatherProvider>,
    geocoder: Arc<dyn ForwardGeocoder>,
    country_codes: String,
}

impl WeatherLookup {
    pub fn new(provider: Arc<dyn WeatherProvider>, geocoder: Arc<dyn ForwardGeocoder>) -> Self {
        Self {
            provider,
            geocoder,
            country_codes: defaults::GEOCODE_COUNTRY_CODES.to_string(),
        }
    }

    /// Restrict place searches to these ISO country codes (comma separated).
    pub fn with_country_codes(mut self, codes: impl Into<String>) -> Self {
        self.country_codes = codes.into();
        self
    }

    pub async fn by_coordinate(&self, coordinate: Coordinate) -> Result<WeatherReport> {
        self.provider.current(coordinate).await
    }

    /// Geocode `place` within the configured countries, then fetch weather.
    ///
    /// Returns the matched coordinate so callers can adopt it as the current
    /// location.
    #[instrument(skip(self), fields(subsystem = "weather"))]
    pub async fn by_place(&self, place: &str) -> Result<(Coordinate, WeatherReport)> {
        let query = place.trim();
        if query.is_empty() {
            return Err(InputError::EmptyQuery.into());
        }

        let coordinate = self
            .geocoder
            .locate(query, &self.country_codes)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No location found for '{}'", query)))?;
        debug!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            "Place resolved"
        );

        let report = self.provider.current(coordinate).await?;
        Ok((coordinate, report))
    }
}
