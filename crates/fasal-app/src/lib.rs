//! # fasal-app
//!
//! The stateful pipelines behind FasalMitr.
//!
//! This crate provides:
//! - [`SessionStore`]: the single active profile and the render language
//! - [`LocaleResolver`]: coordinate to region to language, with silent fallback
//! - [`CapturePipeline`]: uploads and camera frames into the photo history
//! - [`AnalysisCoordinator`]: last-submitted-wins analysis dispatch
//! - [`WeatherLookup`] and the [`Dashboard`] that wires everything for a visit
//!
//! ## Example
//!
//! ```rust,no_run
//! use fasal_app::Dashboard;
//! use fasal_core::RegistrationForm;
//!
//! # async fn run() -> fasal_core::Result<()> {
//! let dashboard = Dashboard::bootstrap("./data").await?;
//! if dashboard.session().profile().await.is_none() {
//!     dashboard
//!         .register(RegistrationForm::existing("Asha", "12"))
//!         .await?;
//! }
//! println!("rendering in {}", dashboard.language());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod capture;
pub mod dashboard;
pub mod history;
pub mod locale;
pub mod session;
pub mod weather;

pub use analysis::{AnalysisCoordinator, AnalysisState};
pub use capture::{CapturePipeline, CaptureReport};
pub use dashboard::{Dashboard, VisitLocation};
pub use locale::{language_for_region, DetectionOutcome, LocaleDetection, LocaleResolver};
pub use session::{validate_registration, CommitOutcome, LanguageTicket, SessionStore};
pub use weather::WeatherLookup;
