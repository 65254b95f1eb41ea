//! Collaborator traits.
//!
//! The pipelines depend only on these interfaces, so storage, geocoding,
//! weather, analysis and device access can each be swapped (or stubbed in
//! tests) without touching ordering or persistence guarantees.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AnalysisResult, Coordinate, Region, WeatherReport};

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Durable, synchronous, string-keyed store that survives restarts.
///
/// Each key is owned by exactly one component; nothing reads another
/// component's key.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// LOCATION
// =============================================================================

/// Device position sensor. Denial is reported as an error.
#[async_trait]
pub trait LocationSensor: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate>;
}

/// Coordinate → administrative region.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Returns `Ok(None)` when the service answered but had no state-level
    /// area for the coordinate.
    async fn region_for(&self, coordinate: Coordinate) -> Result<Option<Region>>;
}

/// Free-text place name → coordinate.
#[async_trait]
pub trait ForwardGeocoder: Send + Sync {
    /// Returns `Ok(None)` when no place matched.
    async fn locate(&self, place: &str, country_codes: &str) -> Result<Option<Coordinate>>;
}

// =============================================================================
// WEATHER
// =============================================================================

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions. A missing API key is `Error::Config`.
    async fn current(&self, coordinate: Coordinate) -> Result<WeatherReport>;
}

// =============================================================================
// ANALYSIS
// =============================================================================

/// Converts an image into soil/plant-health findings.
///
/// Latency and failure are part of the contract.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Analyze a `data:` URI image payload.
    async fn analyze(&self, image: &str) -> Result<AnalysisResult>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;
}

// =============================================================================
// IMAGES
// =============================================================================

/// Output of an [`ImageCompressor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Bounds and re-encodes an uploaded image.
pub trait ImageCompressor: Send + Sync {
    /// Fails with `InputError::Unreadable` when the bytes do not decode.
    fn compress(&self, bytes: &[u8]) -> Result<CompressedImage>;
}

/// Live camera still grabber.
pub trait FrameGrabber: Send + Sync {
    /// A single encoded still as a `data:` URI, or `None` when the video
    /// source has no frame yet.
    fn grab_frame(&self) -> Option<String>;
}
