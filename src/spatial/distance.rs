use std::fmt;

use geo::GeodesicDistance;
use serde::{Deserialize, Serialize};

use super::element::{GeoElement, GeoPoint};

/// Distance reported when no element of a category is in range. The model
/// was trained with this as an ordinary numeric value, never a null.
pub const SENTINEL_DISTANCE_M: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// LandUse – the three distance categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandUse {
    Road,
    Industrial,
    Residential,
}

impl LandUse {
    pub const ALL: [LandUse; 3] = [LandUse::Road, LandUse::Industrial, LandUse::Residential];

    pub fn name(self) -> &'static str {
        match self {
            LandUse::Road => "road",
            LandUse::Industrial => "industrial",
            LandUse::Residential => "residential",
        }
    }

    /// Tag value that marks an element as belonging to this category.
    ///
    /// `Road` matches "residential", not a `highway` tag: the shipped model
    /// was fit on features extracted with this mapping, so changing it
    /// requires retraining.
    pub fn keyword(self) -> &'static str {
        match self {
            LandUse::Road => "residential",
            LandUse::Industrial => "industrial",
            LandUse::Residential => "residential",
        }
    }
}

impl fmt::Display for LandUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Distance extraction
// ---------------------------------------------------------------------------

/// Ellipsoidal (WGS84) surface distance in meters.
pub fn geodesic_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    a.to_geo().geodesic_distance(&b.to_geo())
}

/// Minimum geodesic distance from `point` to any element that carries
/// `keyword` as a tag value and has a center. Returns
/// [`SENTINEL_DISTANCE_M`] when nothing qualifies.
///
/// Centers come straight from the geodata response, so out-of-range
/// coordinates are skipped with a warning rather than measured.
pub fn nearest_distance(point: GeoPoint, elements: &[GeoElement], keyword: &str) -> f64 {
    elements
        .iter()
        .filter(|el| el.has_tag_value(keyword))
        .filter_map(|el| {
            let center = el.center?;
            match GeoPoint::new(center.lat, center.lon) {
                Ok(center) => Some(center),
                Err(e) => {
                    log::warn!("skipping element {:?} with bad center: {e}", el.id);
                    None
                }
            }
        })
        .map(|center| geodesic_distance_m(point, center))
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(SENTINEL_DISTANCE_M)
}

/// Per-category nearest distances for one point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryDistances {
    pub road: f64,
    pub industrial: f64,
    pub residential: f64,
}

impl Default for CategoryDistances {
    fn default() -> Self {
        Self::unknown()
    }
}

impl CategoryDistances {
    /// Every category at the sentinel distance.
    pub fn unknown() -> Self {
        Self {
            road: SENTINEL_DISTANCE_M,
            industrial: SENTINEL_DISTANCE_M,
            residential: SENTINEL_DISTANCE_M,
        }
    }

    pub fn extract(point: GeoPoint, elements: &[GeoElement]) -> Self {
        let mut out = Self::unknown();
        for category in LandUse::ALL {
            let d = nearest_distance(point, elements, category.keyword());
            out.set(category, d);
        }
        log::debug!(
            "distances from ({}, {}) over {} elements: road={:.1} industrial={:.1} residential={:.1}",
            point.lat,
            point.lon,
            elements.len(),
            out.road,
            out.industrial,
            out.residential
        );
        out
    }

    pub fn get(&self, category: LandUse) -> f64 {
        match category {
            LandUse::Road => self.road,
            LandUse::Industrial => self.industrial,
            LandUse::Residential => self.residential,
        }
    }

    pub fn set(&mut self, category: LandUse, meters: f64) {
        match category {
            LandUse::Road => self.road = meters,
            LandUse::Industrial => self.industrial = meters,
            LandUse::Residential => self.residential = meters,
        }
    }
}
