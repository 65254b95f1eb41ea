//! Analysis service backends.
//!
//! [`HttpAnalysisService`] posts the image to a real endpoint.
//! [`StubAnalysisService`] is the stand-in used when no endpoint is
//! configured: it waits a fixed latency and returns canned findings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fasal_core::{defaults, AnalysisResult, AnalysisService, Error, PlantHealthStatus, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// Canned findings returned by the stub.
pub fn canned_result() -> AnalysisResult {
    AnalysisResult {
        soil_type: "Loamy Soil".to_string(),
        plant_health_status: PlantHealthStatus::Healthy,
        disease_alerts: Vec::new(),
        treatments: Vec::new(),
        recommendations: vec![
            "Apply nitrogen fertilizer once every two weeks.".to_string(),
            "Ensure proper irrigation to avoid water stress.".to_string(),
            "Use organic compost to improve soil quality.".to_string(),
        ],
    }
}

// =============================================================================
// STUB
// =============================================================================

#[derive(Debug, Clone)]
struct StubConfig {
    latency_ms: u64,
    default_response: AnalysisResult,
    responses: HashMap<String, AnalysisResult>,
    latencies: HashMap<String, u64>,
    fail: bool,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            latency_ms: defaults::ANALYSIS_STUB_LATENCY_MS,
            default_response: canned_result(),
            responses: HashMap::new(),
            latencies: HashMap::new(),
            fail: false,
        }
    }
}

/// Fixed-latency analysis stand-in.
#[derive(Debug, Clone)]
pub struct StubAnalysisService {
    config: Arc<StubConfig>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubAnalysisService {
    /// Stub with the default latency and canned result.
    pub fn new() -> Self {
        Self {
            config: Arc::new(StubConfig::default()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Return `result` when the payload equals `image`.
    pub fn with_response_for(mut self, image: impl Into<String>, result: AnalysisResult) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(image.into(), result);
        self
    }

    /// Override the latency for one payload.
    pub fn with_latency_for(mut self, image: impl Into<String>, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config)
            .latencies
            .insert(image.into(), latency_ms);
        self
    }

    /// Fail every call after the latency elapses.
    pub fn failing(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// Payloads received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

impl Default for StubAnalysisService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisService for StubAnalysisService {
    async fn analyze(&self, image: &str) -> Result<AnalysisResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(image.to_string());
        }

        let latency = self
            .config
            .latencies
            .get(image)
            .copied()
            .unwrap_or(self.config.latency_ms);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.config.fail {
            return Err(Error::Network("Failed to analyze image".to_string()));
        }

        let result = self
            .config
            .responses
            .get(image)
            .cloned()
            .unwrap_or_else(|| self.config.default_response.clone());
        debug!(latency_ms = latency, soil_type = %result.soil_type, "Stub analysis complete");
        Ok(result)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.config.fail)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

// =============================================================================
// HTTP
// =============================================================================

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    image: &'a str,
}

/// Client for an HTTP analysis endpoint.
///
/// Posts `{"image": "<data uri>"}` and expects an [`AnalysisResult`] body.
pub struct HttpAnalysisService {
    endpoint: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpAnalysisService {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(defaults::USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint,
            client,
            timeout_secs: defaults::ANALYSIS_TIMEOUT_SECS,
        })
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(&self, image: &str) -> Result<AnalysisResult> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { image })
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Analysis request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Analysis service returned an error");
            return Err(Error::Network(format!(
                "Analysis API returned {}: {}",
                status, body
            )));
        }

        response
            .json::<AnalysisResult>()
            .await
            .map_err(|e| Error::Network(format!("Failed to parse analysis response: {}", e)))
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .head(&self.endpoint)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(!resp.status().is_server_error()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stub_waits_fixed_latency() {
        let stub = StubAnalysisService::new();
        let started = tokio::time::Instant::now();

        let result = stub.analyze("data:image/jpeg;base64,AAAA").await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(1200));
        assert_eq!(result, canned_result());
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stub_mapped_response_and_latency() {
        let special = AnalysisResult {
            soil_type: "Clay".to_string(),
            ..canned_result()
        };
        let stub = StubAnalysisService::new()
            .with_response_for("b", special.clone())
            .with_latency_for("b", 10);

        let started = tokio::time::Instant::now();
        assert_eq!(stub.analyze("b").await.unwrap(), special);
        assert_eq!(started.elapsed(), Duration::from_millis(10));
        assert_eq!(stub.analyze("a").await.unwrap(), canned_result());
        assert_eq!(stub.calls(), vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_stub_reports_network_error() {
        let stub = StubAnalysisService::new().failing();
        assert!(matches!(stub.analyze("x").await, Err(Error::Network(_))));
        assert!(!stub.health_check().await.unwrap());
    }

    #[test]
    fn test_analyze_request_serialization() {
        let json = serde_json::to_value(AnalyzeRequest { image: "data:x" }).unwrap();
        assert_eq!(json, serde_json::json!({"image": "data:x"}));
    }

    #[test]
    fn test_canned_result_matches_wire_names() {
        let json = serde_json::to_value(canned_result()).unwrap();
        assert_eq!(json["soilType"], "Loamy Soil");
        assert_eq!(json["plantHealthStatus"], "Healthy");
        assert_eq!(json["recommendations"].as_array().unwrap().len(), 3);
    }
}
