use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};

// ---------------------------------------------------------------------------
// SourceLabel – the closed set of pollution sources
// ---------------------------------------------------------------------------

/// Predicted pollution source. The declaration order is the class index
/// order used by the classifier, so do not reorder variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceLabel {
    Traffic,
    Industrial,
    Residential,
}

impl SourceLabel {
    pub const ALL: [SourceLabel; 3] = [
        SourceLabel::Traffic,
        SourceLabel::Industrial,
        SourceLabel::Residential,
    ];

    /// Class index as stored in the trained model.
    pub fn index(self) -> usize {
        match self {
            SourceLabel::Traffic => 0,
            SourceLabel::Industrial => 1,
            SourceLabel::Residential => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceLabel::Traffic => "Traffic",
            SourceLabel::Industrial => "Industrial",
            SourceLabel::Residential => "Residential",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceLabel {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s.trim())
            .ok_or_else(|| SourceError::Dataset(format!("unknown label '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// PollutantReading – one request's concentrations
// ---------------------------------------------------------------------------

/// Pollutant name → concentration. Values are finite and non-negative;
/// which names are required is decided by the vector builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollutantReading {
    values: BTreeMap<String, f64>,
}

impl PollutantReading {
    pub fn new(values: BTreeMap<String, f64>) -> Result<Self> {
        for (name, value) in &values {
            if !value.is_finite() {
                return Err(SourceError::invalid(
                    format!("pollutants.{name}"),
                    "not a finite number",
                ));
            }
            if *value < 0.0 {
                return Err(SourceError::invalid(
                    format!("pollutants.{name}"),
                    format!("negative concentration {value}"),
                ));
            }
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// FeatureVector – the model's input contract
// ---------------------------------------------------------------------------

/// Column names in the exact order the model was trained with.
pub const FEATURE_NAMES: [&str; 6] = ["pm2_5", "no2", "so2", "road", "industrial", "residential"];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Fixed-order numeric features:
/// `[pm2_5, no2, so2, road, industrial, residential]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    /// Look up a feature by column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }

    /// `(name, value)` pairs in column order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.named().map(|(n, v)| format!("{n}={v:.3}")).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// LabeledExample / LabeledDataset – training-time rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledExample {
    pub features: FeatureVector,
    pub label: SourceLabel,
}

/// Ordered training table.
#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    pub examples: Vec<LabeledExample>,
}

impl LabeledDataset {
    pub fn from_examples(examples: Vec<LabeledExample>) -> Self {
        Self { examples }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Row count per label, in label order.
    pub fn class_counts(&self) -> BTreeMap<SourceLabel, usize> {
        let mut counts = BTreeMap::new();
        for ex in &self.examples {
            *counts.entry(ex.label).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct labels present in the table.
    pub fn labels(&self) -> BTreeSet<SourceLabel> {
        self.examples.iter().map(|ex| ex.label).collect()
    }
}
