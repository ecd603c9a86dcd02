//! One request in, one label out.
//!
//! ```text
//!  {"lat","lon","pollutants"} ─► validate ─► GeodataSource ─► CategoryDistances
//!                                                              │
//!                          {"source"} ◄─ SourcePredictor ◄─ build_vector
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::classifier::SourcePredictor;
use crate::data::features::build_vector;
use crate::data::model::{FeatureVector, PollutantReading, SourceLabel};
use crate::error::{Result, SourceError};
use crate::spatial::{CategoryDistances, GeoPoint, GeodataSource};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body as sent by the caller. Fields are optional here so that a
/// missing one is reported by name rather than as a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub pollutants: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub source: SourceLabel,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRequest {
    pub point: GeoPoint,
    pub reading: PollutantReading,
}

impl ClassifyRequest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SourceError::MalformedRequest(e.to_string()))
    }

    pub fn validate(self) -> Result<ValidRequest> {
        let lat = self.lat.ok_or_else(|| SourceError::MissingField("lat".into()))?;
        let lon = self.lon.ok_or_else(|| SourceError::MissingField("lon".into()))?;
        let pollutants = self
            .pollutants
            .ok_or_else(|| SourceError::MissingField("pollutants".into()))?;

        let point = GeoPoint::new(lat, lon)?;
        let reading = PollutantReading::new(pollutants)?;
        if reading.get("pm2_5").is_none() {
            return Err(SourceError::MissingField("pm2_5".into()));
        }
        Ok(ValidRequest { point, reading })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// What to do when the geodata fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeodataPolicy {
    /// Fail the request.
    #[default]
    Propagate,
    /// Continue with every category at the sentinel distance.
    Degrade,
}

pub struct Pipeline<'a> {
    geodata: &'a dyn GeodataSource,
    model: &'a dyn SourcePredictor,
    radius_m: f64,
    policy: GeodataPolicy,
}

impl<'a> Pipeline<'a> {
    pub fn new(geodata: &'a dyn GeodataSource, model: &'a dyn SourcePredictor, radius_m: f64) -> Self {
        Self {
            geodata,
            model,
            radius_m,
            policy: GeodataPolicy::Propagate,
        }
    }

    pub fn with_policy(mut self, policy: GeodataPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Spatial context for `point` under the configured failure policy.
    pub fn distances(&self, point: GeoPoint) -> Result<CategoryDistances> {
        match self.geodata.fetch(point, self.radius_m) {
            Ok(elements) => Ok(CategoryDistances::extract(point, &elements)),
            Err(e) if self.policy == GeodataPolicy::Degrade => {
                log::warn!("{e}; continuing with sentinel distances");
                Ok(CategoryDistances::unknown())
            }
            Err(e) => Err(e),
        }
    }

    pub fn features(&self, request: &ValidRequest) -> Result<FeatureVector> {
        let distances = self.distances(request.point)?;
        build_vector(&request.reading, &distances)
    }

    pub fn classify(&self, request: ClassifyRequest) -> Result<ClassifyResponse> {
        let request = request.validate()?;
        let features = self.features(&request)?;
        log::debug!("features {features}");

        let source = self.model.predict(features.as_slice())?;
        log::info!(
            "({}, {}) classified as {source}",
            request.point.lat,
            request.point.lon
        );
        Ok(ClassifyResponse { source })
    }

    /// Read one JSON request from `input`, write one JSON response line to
    /// `output`.
    pub fn run(&self, mut input: impl Read, mut output: impl Write) -> Result<ClassifyResponse> {
        let mut text = String::new();
        input
            .read_to_string(&mut text)
            .map_err(|e| SourceError::io("reading request", e))?;

        let response = self.classify(ClassifyRequest::from_json(&text)?)?;

        serde_json::to_writer(&mut output, &response)
            .map_err(|e| SourceError::io("writing response", e.into()))?;
        writeln!(output)
            .and_then(|_| output.flush())
            .map_err(|e| SourceError::io("writing response", e))?;
        Ok(response)
    }
}
