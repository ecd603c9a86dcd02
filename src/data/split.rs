use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::model::LabeledDataset;
use crate::error::{Result, SourceError};

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Shuffle rows with `seed` and cut off `ceil(n * test_fraction)` rows as
/// the test partition. Both partitions must end up non-empty.
pub fn train_test_split(
    dataset: &LabeledDataset,
    test_fraction: f64,
    seed: u64,
) -> Result<(LabeledDataset, LabeledDataset)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SourceError::Dataset(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n = dataset.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(SourceError::Dataset(format!(
            "cannot split {n} rows with test fraction {test_fraction}"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let pick = |idx: &[usize]| {
        LabeledDataset::from_examples(idx.iter().map(|&i| dataset.examples[i]).collect())
    };
    let (test_idx, train_idx) = order.split_at(n_test);
    Ok((pick(train_idx), pick(test_idx)))
}
