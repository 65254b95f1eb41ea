//! Read-only projections of the photo history into soil and plant records.
//!
//! Stored photos carry no analysis, so every record is rebuilt from one
//! fixed set of characteristics keyed only by the photo's timestamp.

use fasal_core::{Photo, PlantHealthStatus, PlantRecord, SoilRecord};

pub const HISTORY_SOIL_TYPE: &str = "Loamy Soil";
pub const HISTORY_SOIL_EXPLANATION: &str =
    "Loamy soil is fertile and drains well, good for most crops.";
pub const HISTORY_SOIL_RECOMMENDATIONS: &[&str] =
    &["Add organic compost annually.", "Maintain soil moisture."];
pub const HISTORY_PREVENTIVE_TIPS: &[&str] = &[
    "Maintain good spacing between plants.",
    "Inspect plants weekly for pests.",
    "Use balanced fertilizers.",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn soil_record(photo: &Photo) -> SoilRecord {
    SoilRecord {
        timestamp: photo.timestamp,
        soil_type: HISTORY_SOIL_TYPE.to_string(),
        explanation: HISTORY_SOIL_EXPLANATION.to_string(),
        recommendations: owned(HISTORY_SOIL_RECOMMENDATIONS),
    }
}

pub fn plant_record(photo: &Photo) -> PlantRecord {
    PlantRecord {
        timestamp: photo.timestamp,
        health_status: PlantHealthStatus::Healthy,
        disease_alerts: Vec::new(),
        treatments: Vec::new(),
        preventive_tips: owned(HISTORY_PREVENTIVE_TIPS),
    }
}

/// One soil record per photo, newest first.
pub fn soil_history(photos: &[Photo]) -> Vec<SoilRecord> {
    photos.iter().map(soil_record).collect()
}

/// One plant record per photo, newest first.
pub fn plant_history(photos: &[Photo]) -> Vec<PlantRecord> {
    photos.iter().map(plant_record).collect()
}
