//! Pollution source classification.
//!
//! Turns a pollutant reading and nearby land use into the fixed feature
//! vector `[pm2_5, no2, so2, road, industrial, residential]` and predicts
//! whether the pollution is mostly Traffic, Industrial or Residential.
//!
//! - [`spatial`]: geodata elements, Overpass client, geodesic distances
//! - [`data`]: feature vectors, synthetic training data, dataset files
//! - [`classifier`]: tree ensemble fit/load/predict and evaluation
//! - [`pipeline`]: single request → response boundary

pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod spatial;

pub use classifier::{ForestParams, SourceClassifier, SourcePredictor};
pub use data::{FeatureVector, PollutantReading, SourceLabel, FEATURE_NAMES};
pub use error::{Result, SourceError};
pub use pipeline::{ClassifyRequest, ClassifyResponse, GeodataPolicy, Pipeline};
