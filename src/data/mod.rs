/// Data layer: core types, feature assembly, synthesis and table I/O.
///
/// Architecture:
/// ```text
///   PollutantReading + CategoryDistances          DatasetSynthesizer (seeded)
///        │                                              │
///        ▼                                              ▼
///   ┌──────────┐                                 ┌──────────────┐
///   │ features  │  → FeatureVector               │ LabeledDataset│
///   └──────────┘                                 └──────────────┘
///                                                  │          │
///                                                  ▼          ▼
///                                             ┌────────┐ ┌────────┐
///                                             │ loader  │ │ split   │
///                                             └────────┘ └────────┘
///                                          .csv / .json / .parquet
/// ```

pub mod features;
pub mod loader;
pub mod model;
pub mod split;
pub mod synth;

pub use features::build_vector;
pub use model::{
    FeatureVector, LabeledDataset, LabeledExample, PollutantReading, SourceLabel, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use synth::DatasetSynthesizer;
