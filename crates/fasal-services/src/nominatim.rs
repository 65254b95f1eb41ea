//! Nominatim (OpenStreetMap) geocoding client.

use std::time::Duration;

use async_trait::async_trait;
use fasal_core::{defaults, Coordinate, Error, ForwardGeocoder, Region, Result, ReverseGeocoder};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Reverse and forward geocoder backed by a Nominatim instance.
pub struct NominatimClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl NominatimClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // Nominatim's usage policy requires an identifying User-Agent.
        let client = reqwest::Client::builder()
            .user_agent(defaults::USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
        })
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Geocoding API returned {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Network(format!("Failed to parse geocoding response: {}", e)))
    }
}

#[derive(Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Deserialize)]
struct ReverseAddress {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    #[instrument(skip(self), fields(component = "nominatim", op = "reverse"))]
    async fn region_for(&self, coordinate: Coordinate) -> Result<Option<Region>> {
        let body: ReverseResponse = self
            .get_json(
                "reverse",
                &[
                    ("format", "jsonv2".to_string()),
                    ("lat", coordinate.latitude.to_string()),
                    ("lon", coordinate.longitude.to_string()),
                ],
            )
            .await?;

        let region = body
            .address
            .and_then(|a| a.state)
            .filter(|s| !s.trim().is_empty())
            .map(Region::new);
        debug!(region = ?region, "Reverse geocode complete");
        Ok(region)
    }
}

#[async_trait]
impl ForwardGeocoder for NominatimClient {
    #[instrument(skip(self), fields(component = "nominatim", op = "search"))]
    async fn locate(&self, place: &str, country_codes: &str) -> Result<Option<Coordinate>> {
        let hits: Vec<SearchHit> = self
            .get_json(
                "search",
                &[
                    ("format", "json".to_string()),
                    ("q", place.to_string()),
                    ("countrycodes", country_codes.to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let Some(hit) = hits.into_iter().next() else {
            debug!("No forward geocode match");
            return Ok(None);
        };

        let latitude: f64 = hit
            .lat
            .parse()
            .map_err(|_| Error::Network(format!("Invalid latitude in response: {}", hit.lat)))?;
        let longitude: f64 = hit
            .lon
            .parse()
            .map_err(|_| Error::Network(format!("Invalid longitude in response: {}", hit.lon)))?;
        Ok(Some(Coordinate::new(latitude, longitude)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_response_with_state() {
        let json = r#"{"display_name":"Pune","address":{"state":"Maharashtra","country":"India"}}"#;
        let body: ReverseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.address.unwrap().state.as_deref(), Some("Maharashtra"));
    }

    #[test]
    fn test_reverse_response_without_address() {
        let body: ReverseResponse = serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(body.address.is_none());
    }

    #[test]
    fn test_search_hit_deserialization() {
        let hits: Vec<SearchHit> =
            serde_json::from_str(r#"[{"lat":"12.97","lon":"77.59","display_name":"Bengaluru"}]"#)
                .unwrap();
        assert_eq!(hits[0].lat, "12.97");
        assert_eq!(hits[0].lon, "77.59");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = NominatimClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
