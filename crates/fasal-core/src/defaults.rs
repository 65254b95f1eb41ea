//! Centralized default constants for FasalMitr.
//!
//! Shared values live here so the pipelines and the service clients agree on
//! storage keys, image bounds and timeouts.

// =============================================================================
// PERSISTED KEYS
// =============================================================================

/// Key holding the serialized active [`UserProfile`](crate::UserProfile).
pub const SESSION_KEY: &str = "session";

/// Key holding the serialized photo history, newest first.
pub const PHOTO_HISTORY_KEY: &str = "photoHistory";

// =============================================================================
// IMAGE CAPTURE
// =============================================================================

/// Maximum width of a compressed upload.
pub const IMAGE_MAX_WIDTH: u32 = 800;

/// Maximum height of a compressed upload.
pub const IMAGE_MAX_HEIGHT: u32 = 600;

/// JPEG quality for compressed uploads (0-100).
pub const IMAGE_JPEG_QUALITY: u8 = 70;

/// MIME type of every compressed upload.
pub const COMPRESSED_MIME: &str = "image/jpeg";

// =============================================================================
// LOCALE
// =============================================================================

/// Budget for obtaining a position fix and reverse-geocoding it.
pub const GEOLOCATION_TIMEOUT_SECS: u64 = 10;

/// Country scope for forward geocoding of manually entered places.
pub const GEOCODE_COUNTRY_CODES: &str = "in";

// =============================================================================
// SERVICES
// =============================================================================

/// Default Nominatim base URL.
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Default OpenWeather base URL.
pub const WEATHER_URL: &str = "https://api.openweathermap.org";

/// Fixed latency of the stub analysis service, in milliseconds.
pub const ANALYSIS_STUB_LATENCY_MS: u64 = 1200;

/// Per-request HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 15;

/// Timeout for analysis requests against a real backend, in seconds.
pub const ANALYSIS_TIMEOUT_SECS: u64 = 60;

/// User-Agent sent to public geocoding services.
pub const USER_AGENT: &str = concat!("fasalmitr/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// EVENTS
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 64;

// =============================================================================
// ENVIRONMENT VARIABLE NAMES
// =============================================================================

pub const ENV_WEATHER_API_KEY: &str = "FASAL_WEATHER_API_KEY";
pub const ENV_WEATHER_URL: &str = "FASAL_WEATHER_URL";
pub const ENV_NOMINATIM_URL: &str = "FASAL_NOMINATIM_URL";
pub const ENV_ANALYSIS_ENDPOINT: &str = "FASAL_ANALYSIS_ENDPOINT";
pub const ENV_ANALYSIS_LATENCY_MS: &str = "FASAL_ANALYSIS_LATENCY_MS";
pub const ENV_GEOLOCATION_TIMEOUT_SECS: &str = "FASAL_GEOLOCATION_TIMEOUT_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "FASAL_HTTP_TIMEOUT_SECS";
pub const ENV_COUNTRY_CODES: &str = "FASAL_COUNTRY_CODES";
