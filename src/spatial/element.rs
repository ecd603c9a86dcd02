use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};

// ---------------------------------------------------------------------------
// GeoPoint – a WGS84 coordinate in degrees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Validating constructor: lat in [-90, 90], lon in [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(SourceError::invalid("lat", format!("{lat} is outside [-90, 90]")));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(SourceError::invalid("lon", format!("{lon} is outside [-180, 180]")));
        }
        Ok(Self { lat, lon })
    }

    /// `geo` uses x = longitude, y = latitude.
    pub fn to_geo(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

// ---------------------------------------------------------------------------
// GeoElement – one tagged feature from the geodata service
// ---------------------------------------------------------------------------

/// An Overpass element as returned by `out center;`. Only `center` and
/// `tags` feed the features; `kind`/`id` are kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoElement {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub center: Option<GeoPoint>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl GeoElement {
    pub fn new(center: Option<GeoPoint>, tags: BTreeMap<String, String>) -> Self {
        Self {
            kind: "way".to_string(),
            id: None,
            center,
            tags,
        }
    }

    /// Whether any tag *value* equals `keyword`. Tag keys are not consulted.
    pub fn has_tag_value(&self, keyword: &str) -> bool {
        self.tags.values().any(|v| v == keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_range_checks() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());

        let err = GeoPoint::new(90.5, 0.0).unwrap_err();
        assert!(matches!(err, SourceError::InvalidField { ref field, .. } if field == "lat"));

        let err = GeoPoint::new(0.0, -181.0).unwrap_err();
        assert!(matches!(err, SourceError::InvalidField { ref field, .. } if field == "lon"));

        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn element_parses_overpass_way() {
        let json = r#"{
            "type": "way",
            "id": 4242,
            "center": { "lat": 40.001, "lon": -74.002 },
            "nodes": [1, 2, 3],
            "tags": { "landuse": "industrial", "name": "Port Yard" }
        }"#;
        let el: GeoElement = serde_json::from_str(json).unwrap();
        assert_eq!(el.kind, "way");
        assert_eq!(el.id, Some(4242));
        assert_eq!(el.center, Some(GeoPoint { lat: 40.001, lon: -74.002 }));
        assert!(el.has_tag_value("industrial"));
        assert!(!el.has_tag_value("landuse"));
    }

    #[test]
    fn element_without_tags_or_center() {
        let el: GeoElement = serde_json::from_str(r#"{ "type": "node", "id": 7 }"#).unwrap();
        assert!(el.center.is_none());
        assert!(el.tags.is_empty());
        assert!(!el.has_tag_value("residential"));
    }
}
