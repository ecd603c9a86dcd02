use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::model::{FeatureVector, LabeledDataset, LabeledExample, SourceLabel};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_PER_CLASS: usize = 100;

// ---------------------------------------------------------------------------
// ClassProfile – per-label generating distributions
// ---------------------------------------------------------------------------

/// `(mean, std_dev)` of a normal draw.
pub type Gauss = (f64, f64);
/// `[min, max)` of a uniform draw.
pub type Span = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProfile {
    pub pm2_5: Gauss,
    pub no2: Gauss,
    pub so2: Gauss,
    pub road: Span,
    pub industrial: Span,
    pub residential: Span,
}

impl ClassProfile {
    pub fn for_label(label: SourceLabel) -> Self {
        match label {
            // close to roads, away from industry, NO2-heavy
            SourceLabel::Traffic => ClassProfile {
                pm2_5: (35.0, 5.0),
                no2: (60.0, 10.0),
                so2: (10.0, 2.0),
                road: (10.0, 200.0),
                industrial: (300.0, 1000.0),
                residential: (100.0, 500.0),
            },
            // SO2-heavy, near industrial land use
            SourceLabel::Industrial => ClassProfile {
                pm2_5: (40.0, 5.0),
                no2: (30.0, 10.0),
                so2: (40.0, 8.0),
                road: (300.0, 1000.0),
                industrial: (10.0, 300.0),
                residential: (100.0, 500.0),
            },
            SourceLabel::Residential => ClassProfile {
                pm2_5: (30.0, 5.0),
                no2: (20.0, 5.0),
                so2: (5.0, 2.0),
                road: (200.0, 600.0),
                industrial: (500.0, 1000.0),
                residential: (10.0, 300.0),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetSynthesizer
// ---------------------------------------------------------------------------

/// Seeded generator of labeled examples. Two synthesizers built with the
/// same seed emit the same sequence.
pub struct DatasetSynthesizer {
    rng: StdRng,
}

impl DatasetSynthesizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate_example(&mut self, label: SourceLabel) -> LabeledExample {
        let p = ClassProfile::for_label(label);
        let features = FeatureVector::from_values([
            self.gauss(p.pm2_5),
            self.gauss(p.no2),
            self.gauss(p.so2),
            self.uniform(p.road),
            self.uniform(p.industrial),
            self.uniform(p.residential),
        ]);
        LabeledExample { features, label }
    }

    /// `per_class` rows for each label, in blocks of Traffic, Industrial,
    /// Residential.
    pub fn generate_dataset(&mut self, per_class: usize) -> LabeledDataset {
        let mut examples = Vec::with_capacity(per_class * SourceLabel::ALL.len());
        for label in SourceLabel::ALL {
            for _ in 0..per_class {
                examples.push(self.generate_example(label));
            }
        }
        LabeledDataset::from_examples(examples)
    }

    fn gauss(&mut self, (mean, std_dev): Gauss) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + std_dev * z
    }

    fn uniform(&mut self, (min, max): Span) -> f64 {
        self.rng.gen_range(min..max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let a = DatasetSynthesizer::new(7).generate_dataset(20);
        let b = DatasetSynthesizer::new(7).generate_dataset(20);
        assert_eq!(a.examples, b.examples);
    }

    #[test]
    fn different_seed_different_rows() {
        let a = DatasetSynthesizer::new(1).generate_dataset(5);
        let b = DatasetSynthesizer::new(2).generate_dataset(5);
        assert_ne!(a.examples, b.examples);
    }

    #[test]
    fn balanced_blocks_in_label_order() {
        let ds = DatasetSynthesizer::new(DEFAULT_SEED).generate_dataset(DEFAULT_PER_CLASS);
        assert_eq!(ds.len(), 3 * DEFAULT_PER_CLASS);
        for (label, n) in ds.class_counts() {
            assert_eq!(n, DEFAULT_PER_CLASS, "{label}");
        }
        assert_eq!(ds.examples[0].label, SourceLabel::Traffic);
        assert_eq!(ds.examples[DEFAULT_PER_CLASS].label, SourceLabel::Industrial);
        assert_eq!(ds.examples[2 * DEFAULT_PER_CLASS].label, SourceLabel::Residential);
    }

    #[test]
    fn distances_stay_inside_class_ranges() {
        let mut synth = DatasetSynthesizer::new(3);
        for label in SourceLabel::ALL {
            let p = ClassProfile::for_label(label);
            for _ in 0..200 {
                let ex = synth.generate_example(label);
                let v = ex.features.values();
                assert!(v[3] >= p.road.0 && v[3] < p.road.1);
                assert!(v[4] >= p.industrial.0 && v[4] < p.industrial.1);
                assert!(v[5] >= p.residential.0 && v[5] < p.residential.1);
            }
        }
    }

    #[test]
    fn pollutant_means_track_profiles() {
        let mut synth = DatasetSynthesizer::new(11);
        let n = 2000;
        let mean_no2: f64 = (0..n)
            .map(|_| synth.generate_example(SourceLabel::Traffic).features.values()[1])
            .sum::<f64>()
            / n as f64;
        assert!((mean_no2 - 60.0).abs() < 1.5, "mean no2 {mean_no2}");
    }
}
