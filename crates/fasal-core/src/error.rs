//! Error types for FasalMitr.
//!
//! Every fault that can reach presentation is one of these kinds. Pipelines
//! convert collaborator failures at their boundary, so nothing raw crosses
//! into the UI layer and nothing here is fatal.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using FasalMitr's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for FasalMitr operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Registration form failed validation (one entry per offending field)
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Capture input was rejected
    #[error("Input rejected: {0}")]
    Input(InputError),

    /// An outbound call (geocode, weather, analysis) failed
    #[error("Network error: {0}")]
    Network(String),

    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted state failed to parse
    #[error("Persisted state corrupted: {0}")]
    PersistenceCorruption(String),

    /// Lookup returned no match
    #[error("Not found: {0}")]
    NotFound(String),

    /// The key-value store itself failed a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the user can fix this by re-entering input or retrying.
    ///
    /// Configuration problems need an operator; everything else is
    /// something the person at the screen can act on.
    pub fn is_recoverable_by_user(&self) -> bool {
        !matches!(self, Error::Config(_) | Error::Internal(_))
    }

    /// Short message suitable for a transient UI notice.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(errs) => format!("Please correct: {}", errs),
            Error::Input(input) => input.user_message().to_string(),
            Error::Network(_) => "Could not reach the service. Please try again.".to_string(),
            Error::NotFound(msg) | Error::Config(msg) => msg.clone(),
            Error::PersistenceCorruption(_) | Error::Storage(_) => {
                "Saved data could not be read; starting fresh.".to_string()
            }
            Error::Serialization(_) | Error::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<ValidationErrors> for Error {
    fn from(e: ValidationErrors) -> Self {
        Error::Validation(e)
    }
}

impl From<InputError> for Error {
    fn from(e: InputError) -> Self {
        Error::Input(e)
    }
}

// =============================================================================
// INPUT ERRORS
// =============================================================================

/// Bad capture or lookup input. The user retries with different input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("not-an-image")]
    NotAnImage,
    #[error("no-frame")]
    NoFrame,
    #[error("unreadable-image")]
    Unreadable,
    #[error("empty-query")]
    EmptyQuery,
}

impl InputError {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            InputError::NotAnImage => "not-an-image",
            InputError::NoFrame => "no-frame",
            InputError::Unreadable => "unreadable-image",
            InputError::EmptyQuery => "empty-query",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            InputError::NotAnImage => "Please upload a valid image file.",
            InputError::NoFrame => "The camera did not return a picture. Please try again.",
            InputError::Unreadable => "The image could not be read. Please try another photo.",
            InputError::EmptyQuery => "Please enter a location.",
        }
    }
}

// =============================================================================
// VALIDATION ERRORS
// =============================================================================

/// Registration form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    FarmerType,
    YearsFarming,
    AppPurpose,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::FarmerType => write!(f, "farmerType"),
            Field::YearsFarming => write!(f, "yearsFarming"),
            Field::AppPurpose => write!(f, "appPurpose"),
        }
    }
}

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldErrorKind {
    Required,
    PositiveNumber,
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub kind: FieldErrorKind,
}

/// All validation failures for one submission, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, kind: FieldErrorKind) {
        self.errors.push(FieldError { field, kind });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// The failure recorded for `field`, if any.
    pub fn get(&self, field: Field) -> Option<FieldErrorKind> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.kind)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| match e.kind {
                FieldErrorKind::Required => format!("{} is required", e.field),
                FieldErrorKind::PositiveNumber => {
                    format!("{} must be a positive number", e.field)
                }
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
