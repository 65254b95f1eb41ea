//! The dashboard: one visit's wiring of session, locale, weather, regional
//! data and capture.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fasal_core::{
    Coordinate, CropTrends, Error, EventBus, FileStore, FileUpload, FrameGrabber, GovernmentScheme,
    KeyValueStore, LanguageCode, LocationSensor, Region, RegionalCatalog, RegistrationForm,
    Result, StaticCatalog, UserProfile, WeatherReport,
};
use fasal_services::{ServiceConfig, Services};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::capture::{CapturePipeline, CaptureReport};
use crate::locale::{LocaleDetection, LocaleResolver};
use crate::session::{CommitOutcome, SessionStore};
use crate::weather::WeatherLookup;

/// Location known for the current visit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitLocation {
    pub coordinate: Option<Coordinate>,
    pub region: Option<Region>,
}

pub struct Dashboard {
    session: Arc<SessionStore>,
    locale: LocaleResolver,
    weather: WeatherLookup,
    capture: CapturePipeline,
    catalog: Arc<dyn RegionalCatalog>,
    visit: RwLock<VisitLocation>,
    events: EventBus,
}

impl Dashboard {
    /// Load `.env` and `FASAL_*` settings, persist under `data_dir`, and
    /// restore any saved session.
    pub async fn bootstrap(data_dir: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = ServiceConfig::from_env()?;
        let services = Services::from_config(&config)?;
        let store = Arc::new(FileStore::open(data_dir)?);

        let dashboard = Self::new(store, services, &config);
        dashboard.open().await;
        let analysis = dashboard.capture.analysis();
        info!(
            analysis_backend = analysis.backend_name(),
            analysis_healthy = analysis.backend_healthy().await,
            "Dashboard ready"
        );
        Ok(dashboard)
    }

    /// Wire a dashboard from configured services and a key-value store.
    pub fn new(store: Arc<dyn KeyValueStore>, services: Services, config: &ServiceConfig) -> Self {
        Self::with_catalog(store, services, config, Arc::new(StaticCatalog))
    }

    pub fn with_catalog(
        store: Arc<dyn KeyValueStore>,
        services: Services,
        config: &ServiceConfig,
        catalog: Arc<dyn RegionalCatalog>,
    ) -> Self {
        let events = EventBus::default();
        let session = Arc::new(SessionStore::new(store.clone(), events.clone()));
        let locale = LocaleResolver::new(session.clone(), services.reverse_geocoder)
            .with_timeout(config.geolocation_timeout());
        let weather = WeatherLookup::new(services.weather, services.forward_geocoder)
            .with_country_codes(config.country_codes.clone());
        let capture = CapturePipeline::new(
            store,
            services.compressor,
            services.analysis,
            events.clone(),
        );

        Self {
            session,
            locale,
            weather,
            capture,
            catalog,
            visit: RwLock::new(VisitLocation::default()),
            events,
        }
    }

    /// Override the geolocation timeout.
    pub fn with_geolocation_timeout(mut self, timeout: Duration) -> Self {
        self.locale = self.locale.with_timeout(timeout);
        self
    }

    /// Restore any persisted session. Call once at startup.
    pub async fn open(&self) -> Option<UserProfile> {
        let profile = self.session.restore().await;
        self.capture
            .set_owner(profile.as_ref().map(|p| p.name.clone()));
        profile
    }

    pub async fn register(&self, form: RegistrationForm) -> Result<UserProfile> {
        let profile = self.session.register(form).await?;
        self.capture.set_owner(Some(profile.name.clone()));
        Ok(profile)
    }

    /// Detect the device location, remember it for this visit and resolve
    /// the display language from it.
    pub async fn detect_locale(&self, sensor: &dyn LocationSensor) -> LocaleDetection {
        let detection = self.locale.detect(sensor).await;
        if detection.coordinate.is_some() {
            let mut visit = self.visit.write().await;
            visit.coordinate = detection.coordinate;
            if detection.region.is_some() {
                visit.region = detection.region.clone();
            }
        }
        detection
    }

    pub async fn set_language(&self, language: LanguageCode) -> Result<CommitOutcome> {
        self.locale.set_language_manually(language).await
    }

    pub fn language(&self) -> LanguageCode {
        self.session.render_language()
    }

    pub async fn location(&self) -> VisitLocation {
        self.visit.read().await.clone()
    }

    /// Weather at the detected or last searched location.
    pub async fn current_weather(&self) -> Result<WeatherReport> {
        let coordinate = self
            .visit
            .read()
            .await
            .coordinate
            .ok_or_else(|| Error::NotFound("Location not available".to_string()))?;
        self.weather.by_coordinate(coordinate).await
    }

    /// Weather for a typed place. On a match the place becomes the visit's
    /// coordinate; the region used for regional data is kept.
    pub async fn search_weather(&self, place: &str) -> Result<WeatherReport> {
        let (coordinate, report) = self.weather.by_place(place).await?;
        self.visit.write().await.coordinate = Some(coordinate);
        Ok(report)
    }

    pub async fn crop_trends(&self) -> CropTrends {
        let visit = self.visit.read().await;
        self.catalog.crop_trends(visit.region.as_ref())
    }

    pub async fn schemes(&self) -> Vec<GovernmentScheme> {
        let visit = self.visit.read().await;
        self.catalog.schemes(visit.region.as_ref())
    }

    pub async fn upload_photo(&self, upload: FileUpload) -> Result<CaptureReport> {
        self.capture.capture_and_analyze_file(upload).await
    }

    pub async fn snap_photo(&self, camera: &dyn FrameGrabber) -> Result<CaptureReport> {
        self.capture.capture_and_analyze_camera(camera).await
    }

    /// End the session. Pending analysis is discarded and the visit's
    /// location forgotten; photo history is kept.
    #[instrument(skip(self), fields(subsystem = "dashboard", op = "logout"))]
    pub async fn logout(&self) -> Result<()> {
        self.capture.analysis().detach();
        self.capture.set_owner(None);
        *self.visit.write().await = VisitLocation::default();
        self.session.logout().await?;
        info!("Dashboard closed");
        Ok(())
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn capture(&self) -> &CapturePipeline {
        &self.capture
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
