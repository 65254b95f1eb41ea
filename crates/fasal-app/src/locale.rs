//! Locale resolution: coordinate -> administrative region -> language.
//!
//! Resolution never fails outward. Any collaborator failure leaves the
//! current language in place and is logged; only a committed change is
//! visible to the rest of the app.

use std::sync::Arc;
use std::time::Duration;

use fasal_core::{
    defaults, normalize_region, Coordinate, LanguageCode, LanguageSource, LocationSensor, Region,
    Result, ReverseGeocoder,
};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, instrument, warn};

use crate::session::{CommitOutcome, LanguageTicket, SessionStore};

/// Ordered region-name fragments and their language. First match wins.
const REGION_LANGUAGES: &[(&str, LanguageCode)] = &[
    ("maharashtra", LanguageCode::Mr),
    ("tamil nadu", LanguageCode::Ta),
    ("telangana", LanguageCode::Te),
    ("andhra pradesh", LanguageCode::Te),
    ("karnataka", LanguageCode::Kn),
    ("gujarat", LanguageCode::Gu),
    ("west bengal", LanguageCode::Bn),
    ("bengal", LanguageCode::Bn),
    ("uttar pradesh", LanguageCode::Hi),
    ("haryana", LanguageCode::Hi),
    ("delhi", LanguageCode::Hi),
    ("rajasthan", LanguageCode::Hi),
    ("punjab", LanguageCode::Pa),
    ("kerala", LanguageCode::En),
    ("bihar", LanguageCode::Hi),
    ("odisha", LanguageCode::Or),
    ("assam", LanguageCode::En),
];

/// Language for a region name, or English when no entry matches.
///
/// Both sides are compared lowercased with whitespace removed, so
/// "TamilNadu", "Tamil Nadu" and "tamil  nadu" all resolve to Tamil.
pub fn language_for_region(region: &Region) -> LanguageCode {
    let normalized = region.normalized();
    REGION_LANGUAGES
        .iter()
        .find(|(fragment, _)| normalized.contains(&normalize_region(fragment)))
        .map(|(_, code)| *code)
        .unwrap_or_default()
}

/// Why a detection ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// A language commit was attempted; see the commit's own outcome.
    Committed(CommitOutcome),
    /// Position denied or unavailable.
    PositionUnavailable,
    /// Position or geocode lookup exceeded the geolocation timeout.
    TimedOut,
    /// Reverse geocoder failed.
    GeocodeFailed,
    /// Geocoder answered without a region.
    NoRegion,
    /// The detected language could not be persisted.
    CommitFailed,
}

/// What a detection found.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleDetection {
    pub coordinate: Option<Coordinate>,
    pub region: Option<Region>,
    /// Render language after the detection settled.
    pub language: LanguageCode,
    pub outcome: DetectionOutcome,
}

impl LocaleDetection {
    pub fn applied(&self) -> bool {
        self.outcome == DetectionOutcome::Committed(CommitOutcome::Applied)
    }
}

pub struct LocaleResolver {
    session: Arc<SessionStore>,
    geocoder: Arc<dyn ReverseGeocoder>,
    timeout: Duration,
}

impl LocaleResolver {
    pub fn new(session: Arc<SessionStore>, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self {
            session,
            geocoder,
            timeout: Duration::from_secs(defaults::GEOLOCATION_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the language for `coordinate` and commit it if it differs.
    ///
    /// Returns the render language once the resolution settled: the new
    /// code on success, the current one on any failure or when a later
    /// resolution (e.g. a manual switch) committed first.
    pub async fn resolve_language(&self, coordinate: Coordinate) -> LanguageCode {
        let ticket = self.session.issue_ticket();
        let deadline = Instant::now() + self.timeout;
        self.resolve_with_ticket(coordinate, ticket, deadline)
            .await
            .language
    }

    /// Read the device position from `sensor`, then resolve as
    /// [`resolve_language`](Self::resolve_language) does.
    ///
    /// The ticket is taken before the sensor is queried, so a manual switch
    /// made while waiting for a position wins over the detected language.
    /// One timeout budget covers both the position fix and the geocode.
    #[instrument(skip(self, sensor), fields(subsystem = "locale", op = "detect"))]
    pub async fn detect(&self, sensor: &dyn LocationSensor) -> LocaleDetection {
        let ticket = self.session.issue_ticket();
        let deadline = Instant::now() + self.timeout;

        let coordinate = match timeout_at(deadline, sensor.current_position()).await {
            Ok(Ok(coordinate)) => coordinate,
            Ok(Err(e)) => {
                debug!(error = %e, "Position unavailable, keeping current language");
                return self.unsettled(None, None, DetectionOutcome::PositionUnavailable);
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Position lookup timed out, keeping current language"
                );
                return self.unsettled(None, None, DetectionOutcome::TimedOut);
            }
        };

        self.resolve_with_ticket(coordinate, ticket, deadline).await
    }

    /// Commit a user-chosen language. Supersedes any resolution in flight.
    pub async fn set_language_manually(&self, language: LanguageCode) -> Result<CommitOutcome> {
        let ticket = self.session.issue_ticket();
        self.session
            .commit_language(language, ticket, LanguageSource::Manual)
            .await
    }

    #[instrument(skip(self, ticket, deadline), fields(subsystem = "locale", ticket = ticket.value()))]
    async fn resolve_with_ticket(
        &self,
        coordinate: Coordinate,
        ticket: LanguageTicket,
        deadline: Instant,
    ) -> LocaleDetection {
        let region = match timeout_at(deadline, self.geocoder.region_for(coordinate)).await {
            Ok(Ok(Some(region))) => region,
            Ok(Ok(None)) => {
                debug!("Geocoder returned no region, keeping current language");
                return self.unsettled(Some(coordinate), None, DetectionOutcome::NoRegion);
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Reverse geocode failed, keeping current language");
                return self.unsettled(Some(coordinate), None, DetectionOutcome::GeocodeFailed);
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Reverse geocode timed out, keeping current language"
                );
                return self.unsettled(Some(coordinate), None, DetectionOutcome::TimedOut);
            }
        };

        let language = language_for_region(&region);
        debug!(region = %region, %language, "Resolved region language");

        let outcome = match self
            .session
            .commit_language(language, ticket, LanguageSource::Geolocation)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Failed to commit detected language");
                return self.unsettled(
                    Some(coordinate),
                    Some(region),
                    DetectionOutcome::CommitFailed,
                );
            }
        };

        LocaleDetection {
            coordinate: Some(coordinate),
            region: Some(region),
            language: self.session.render_language(),
            outcome: DetectionOutcome::Committed(outcome),
        }
    }

    fn unsettled(
        &self,
        coordinate: Option<Coordinate>,
        region: Option<Region>,
        outcome: DetectionOutcome,
    ) -> LocaleDetection {
        LocaleDetection {
            coordinate,
            region,
            language: self.session.render_language(),
            outcome,
        }
    }
}
