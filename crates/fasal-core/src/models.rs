//! Data model shared by every FasalMitr crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// =============================================================================
// LANGUAGE
// =============================================================================

/// Language used for rendering and analysis copy.
///
/// Only `en`, `hi` and `ta` ship translated string sets. The remaining codes
/// are produced by the region table and reserved for future locales; the
/// renderer falls back to English strings for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    #[default]
    En,
    Hi,
    Ta,
    Mr,
    Te,
    Kn,
    Gu,
    Bn,
    Pa,
    Or,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 10] = [
        LanguageCode::En,
        LanguageCode::Hi,
        LanguageCode::Ta,
        LanguageCode::Mr,
        LanguageCode::Te,
        LanguageCode::Kn,
        LanguageCode::Gu,
        LanguageCode::Bn,
        LanguageCode::Pa,
        LanguageCode::Or,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Hi => "hi",
            LanguageCode::Ta => "ta",
            LanguageCode::Mr => "mr",
            LanguageCode::Te => "te",
            LanguageCode::Kn => "kn",
            LanguageCode::Gu => "gu",
            LanguageCode::Bn => "bn",
            LanguageCode::Pa => "pa",
            LanguageCode::Or => "or",
        }
    }

    /// Whether a translated string set exists for this code.
    pub fn is_rendered(&self) -> bool {
        matches!(self, LanguageCode::En | LanguageCode::Hi | LanguageCode::Ta)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        // Accept region-qualified tags such as "hi-IN".
        let primary = lower.split(['-', '_']).next().unwrap_or_default();
        LanguageCode::ALL
            .into_iter()
            .find(|code| code.as_str() == primary)
            .ok_or_else(|| Error::Serialization(format!("unsupported language code: {}", s)))
    }
}

// =============================================================================
// USER PROFILE
// =============================================================================

/// Whether the visitor already farms or is just starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FarmerType {
    Existing,
    New,
}

/// Why a new farmer is using the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppPurpose {
    Personal,
    Commercial,
}

/// The single active user. Its presence is the only authentication signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub farmer_type: FarmerType,
    pub years_farming: Option<u32>,
    pub app_purpose: Option<AppPurpose>,
    #[serde(default)]
    pub language: LanguageCode,
}

/// Raw registration form input, exactly as a UI collects it.
///
/// `years_farming` stays a string so that non-numeric entries can be
/// reported as a field error instead of being rejected by a parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub name: String,
    pub farmer_type: Option<FarmerType>,
    #[serde(default)]
    pub years_farming: String,
    pub app_purpose: Option<AppPurpose>,
    pub language: Option<LanguageCode>,
}

impl RegistrationForm {
    pub fn existing(name: impl Into<String>, years: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            farmer_type: Some(FarmerType::Existing),
            years_farming: years.into(),
            ..Default::default()
        }
    }

    pub fn new_farmer(name: impl Into<String>, purpose: AppPurpose) -> Self {
        Self {
            name: name.into(),
            farmer_type: Some(FarmerType::New),
            app_purpose: Some(purpose),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: LanguageCode) -> Self {
        self.language = Some(language);
        self
    }
}

// =============================================================================
// LOCATION
// =============================================================================

/// A position fix. Held in memory for one visit, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Administrative area name as returned by reverse geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased with all whitespace removed, the form every region table
    /// is matched against.
    pub fn normalized(&self) -> String {
        normalize_region(&self.0)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-case `s` and strip every whitespace character.
pub fn normalize_region(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// PHOTOS
// =============================================================================

/// A captured or uploaded image. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// `data:` URI carrying the base64-encoded image.
    #[serde(alias = "base64")]
    pub base64_data: String,
    pub timestamp: DateTime<Utc>,
}

impl Photo {
    pub fn new(base64_data: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            base64_data,
            timestamp,
        }
    }
}

/// Where a photo came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSource {
    File,
    Camera,
}

/// A file chosen through an upload control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// MIME type claimed by the browser/OS. May be empty.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

// =============================================================================
// ANALYSIS
// =============================================================================

/// Plant health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlantHealthStatus {
    #[default]
    Healthy,
    Warning,
    Danger,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PlantHealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlantHealthStatus::Healthy => write!(f, "Healthy"),
            PlantHealthStatus::Warning => write!(f, "Warning"),
            PlantHealthStatus::Danger => write!(f, "Danger"),
            PlantHealthStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Findings returned by the analysis service for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub soil_type: String,
    pub plant_health_status: PlantHealthStatus,
    #[serde(default)]
    pub disease_alerts: Vec<String>,
    #[serde(default)]
    pub treatments: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Soil-health view of one historical photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilRecord {
    pub timestamp: DateTime<Utc>,
    pub soil_type: String,
    pub explanation: String,
    pub recommendations: Vec<String>,
}

/// Plant-health view of one historical photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantRecord {
    pub timestamp: DateTime<Utc>,
    pub health_status: PlantHealthStatus,
    pub disease_alerts: Vec<String>,
    pub treatments: Vec<String>,
    pub preventive_tips: Vec<String>,
}

// =============================================================================
// WEATHER
// =============================================================================

/// Current conditions at a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub condition: String,
    pub location_name: Option<String>,
}
