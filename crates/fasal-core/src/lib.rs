//! # fasal-core
//!
//! Core types, traits, and storage abstractions for FasalMitr.
//!
//! This crate provides the data model, the error taxonomy, the collaborator
//! traits the pipelines depend on, and the persistent key-value store
//! adapters.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded state that needs operator attention (missing config) |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Session lifecycle, committed language changes, captures |
//! | DEBUG | Decision points, dropped stale results, config choices |
//! | TRACE | Per-entry iteration |

pub mod catalog;
pub mod defaults;
pub mod error;
pub mod events;
pub mod models;
pub mod storage;
pub mod traits;

// Re-export commonly used types at crate root
pub use catalog::{CropPrice, CropTrends, GovernmentScheme, RegionalCatalog, StaticCatalog};
pub use error::{Error, Field, FieldError, FieldErrorKind, InputError, Result, ValidationErrors};
pub use events::{AnalysisOutcome, AppEvent, EventBus, EventEnvelope, LanguageSource};
pub use models::*;
pub use storage::{load_json, save_json, FileStore, MemoryStore};
pub use traits::*;
