//! Read-only regional lookup tables (crop trends, government schemes).
//!
//! The core queries these by region and receives a list back; the content is
//! static reference data.

use serde::Serialize;

use crate::models::Region;

/// A trending crop and its indicative market price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropPrice {
    pub crop: &'static str,
    pub price: &'static str,
}

/// Trending crops and advisory notes for a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropTrends {
    pub trending_crops: Vec<CropPrice>,
    pub advisory_news: Vec<&'static str>,
}

/// A state agricultural support scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GovernmentScheme {
    pub name: &'static str,
    pub summary: &'static str,
    pub url: &'static str,
}

/// Region-keyed reference data.
pub trait RegionalCatalog: Send + Sync {
    /// Trends for `region`, or the national default.
    fn crop_trends(&self, region: Option<&Region>) -> CropTrends;

    /// Schemes for `region`; empty when none are listed.
    fn schemes(&self, region: Option<&Region>) -> Vec<GovernmentScheme>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogRegion {
    Maharashtra,
    TamilNadu,
}

fn catalog_region(region: Option<&Region>) -> Option<CatalogRegion> {
    let normalized = region?.normalized();
    if normalized.contains("maharashtra") {
        Some(CatalogRegion::Maharashtra)
    } else if normalized.contains("tamilnadu") {
        Some(CatalogRegion::TamilNadu)
    } else {
        None
    }
}

/// Built-in tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl RegionalCatalog for StaticCatalog {
    fn crop_trends(&self, region: Option<&Region>) -> CropTrends {
        match catalog_region(region) {
            Some(CatalogRegion::Maharashtra) => CropTrends {
                trending_crops: vec![
                    CropPrice {
                        crop: "Sugarcane",
                        price: "₹3000/quintal",
                    },
                    CropPrice {
                        crop: "Cotton",
                        price: "₹3500/quintal",
                    },
                    CropPrice {
                        crop: "Soybean",
                        price: "₹3200/quintal",
                    },
                ],
                advisory_news: vec![
                    "Irrigate sugarcane fields weekly.",
                    "Cotton harvesting expected to rise this year.",
                ],
            },
            Some(CatalogRegion::TamilNadu) => CropTrends {
                trending_crops: vec![
                    CropPrice {
                        crop: "Banana",
                        price: "₹1500/quintal",
                    },
                    CropPrice {
                        crop: "Coconut",
                        price: "₹2500/quintal",
                    },
                    CropPrice {
                        crop: "Rice",
                        price: "₹2100/quintal",
                    },
                ],
                advisory_news: vec![
                    "Apply mulch to conserve soil moisture.",
                    "Use resistant rice varieties against pests.",
                ],
            },
            None => CropTrends {
                trending_crops: vec![
                    CropPrice {
                        crop: "Wheat",
                        price: "₹2000/quintal",
                    },
                    CropPrice {
                        crop: "Rice",
                        price: "₹2200/quintal",
                    },
                    CropPrice {
                        crop: "Maize",
                        price: "₹1800/quintal",
                    },
                ],
                advisory_news: vec![
                    "Use organic fertilizers for better yield.",
                    "Monitor pest infestation closely this season.",
                ],
            },
        }
    }

    fn schemes(&self, region: Option<&Region>) -> Vec<GovernmentScheme> {
        match catalog_region(region) {
            Some(CatalogRegion::Maharashtra) => vec![
                GovernmentScheme {
                    name: "Dr. Panjabrao Deshmukh Krishi Sanjivani Yojana",
                    summary: "Provides assistance to farmers for sustainable agriculture practices.",
                    url: "https://agri.maharashtra.gov.in/",
                },
                GovernmentScheme {
                    name: "Maharashtra Chief Minister Kisan Support Scheme",
                    summary: "Financial aid to farmers affected by natural calamities.",
                    url: "https://mahaagri.gov.in/",
                },
            ],
            Some(CatalogRegion::TamilNadu) => vec![
                GovernmentScheme {
                    name: "Tamil Nadu Agriculture Loan Waiver Scheme",
                    summary: "Loan waiver for eligible farmers to reduce debt burden.",
                    url: "https://www.tn.gov.in/",
                },
                GovernmentScheme {
                    name: "Krishi Sinchithan India Scheme",
                    summary: "Promotion of drip irrigation and water saving techniques.",
                    url: "https://agritech.tnau.ac.in/",
                },
            ],
            None => Vec::new(),
        }
    }
}
