use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::element::{GeoElement, GeoPoint};
use crate::error::{Result, SourceError};

pub const DEFAULT_OVERPASS_URL: &str = "http://overpass-api.de/api/interpreter";

/// Search radius around the request point, meters.
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 1000.0;

// ---------------------------------------------------------------------------
// GeodataSource – where land-use elements come from
// ---------------------------------------------------------------------------

/// Supplies the tagged elements around a point. An empty result is valid.
pub trait GeodataSource {
    fn fetch(&self, point: GeoPoint, radius_m: f64) -> Result<Vec<GeoElement>>;
}

/// Body of an Overpass `[out:json]` response. Only `elements` is used.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<GeoElement>,
}

/// Overpass QL selecting roads, industrial and residential land use around
/// `point`, with a center computed for every way.
pub fn build_query(point: GeoPoint, radius_m: f64) -> String {
    let around = format!("around:{},{},{}", radius_m, point.lat, point.lon);
    format!(
        "[out:json];\n\
         (\n  \
           way[\"highway\"]({around});\n  \
           way[\"landuse\"=\"industrial\"]({around});\n  \
           way[\"landuse\"=\"residential\"]({around});\n\
         );\n\
         out center;\n"
    )
}

// ---------------------------------------------------------------------------
// OverpassClient – blocking HTTP collaborator
// ---------------------------------------------------------------------------

pub struct OverpassClient {
    url: String,
    http: reqwest::blocking::Client,
}

impl OverpassClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::GeodataUnavailable(format!("building HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl GeodataSource for OverpassClient {
    fn fetch(&self, point: GeoPoint, radius_m: f64) -> Result<Vec<GeoElement>> {
        let query = build_query(point, radius_m);
        log::debug!("POST {} ({} byte query)", self.url, query.len());

        let response = self
            .http
            .post(&self.url)
            .form(&[("data", query.as_str())])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| SourceError::GeodataUnavailable(e.to_string()))?;

        let body: OverpassResponse = response
            .json()
            .map_err(|e| SourceError::GeodataUnavailable(format!("decoding response: {e}")))?;

        log::info!(
            "overpass returned {} elements within {radius_m} m",
            body.elements.len()
        );
        Ok(body.elements)
    }
}

// ---------------------------------------------------------------------------
// StaticGeodata – fixed element set (offline runs, tests)
// ---------------------------------------------------------------------------

/// Returns the same elements for every point, ignoring the radius.
#[derive(Debug, Clone, Default)]
pub struct StaticGeodata {
    elements: Vec<GeoElement>,
}

impl StaticGeodata {
    pub fn new(elements: Vec<GeoElement>) -> Self {
        Self { elements }
    }

    /// Read a saved Overpass response body.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SourceError::io(format!("reading {}", path.display()), e))?;
        let body: OverpassResponse = serde_json::from_str(&text).map_err(|e| {
            SourceError::GeodataUnavailable(format!("parsing {}: {e}", path.display()))
        })?;
        Ok(Self::new(body.elements))
    }
}

impl GeodataSource for StaticGeodata {
    fn fetch(&self, _point: GeoPoint, _radius_m: f64) -> Result<Vec<GeoElement>> {
        Ok(self.elements.clone())
    }
}
