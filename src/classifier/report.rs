use std::fmt;

use crate::data::model::SourceLabel;
use crate::error::{Result, SourceError};

const N: usize = SourceLabel::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out quality of a fitted classifier.
///
/// `confusion[truth][predicted]` counts rows, indexed by
/// [`SourceLabel::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub confusion: [[usize; N]; N],
    pub per_class: [ClassMetrics; N],
    pub accuracy: f64,
    pub total: usize,
}

impl ClassificationReport {
    pub fn new(truth: &[SourceLabel], predicted: &[SourceLabel]) -> Result<Self> {
        if truth.len() != predicted.len() {
            return Err(SourceError::Dataset(format!(
                "{} true labels but {} predictions",
                truth.len(),
                predicted.len()
            )));
        }

        let mut confusion = [[0usize; N]; N];
        for (t, p) in truth.iter().zip(predicted) {
            confusion[t.index()][p.index()] += 1;
        }

        let total = truth.len();
        let correct: usize = (0..N).map(|i| confusion[i][i]).sum();
        let accuracy = ratio(correct, total);

        let per_class = std::array::from_fn(|c| {
            let tp = confusion[c][c];
            let predicted_c: usize = (0..N).map(|t| confusion[t][c]).sum();
            let support: usize = confusion[c].iter().sum();
            let precision = ratio(tp, predicted_c);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                precision,
                recall,
                f1,
                support,
            }
        });

        Ok(Self {
            confusion,
            per_class,
            accuracy,
            total,
        })
    }

    pub fn metrics(&self, label: SourceLabel) -> ClassMetrics {
        self.per_class[label.index()]
    }

    /// Unweighted mean F1 over classes.
    pub fn macro_f1(&self) -> f64 {
        self.per_class.iter().map(|m| m.f1).sum::<f64>() / N as f64
    }
}

/// 0 when the denominator is 0, as scikit-learn reports undefined metrics.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for label in SourceLabel::ALL {
            let m = self.metrics(label);
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>14} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.total)?;
        writeln!(f, "{:>14} {:>10} {:>10} {:>10.2} {:>10}", "macro avg f1", "", "", self.macro_f1(), self.total)?;
        writeln!(f)?;
        writeln!(f, "confusion (rows = true, cols = predicted):")?;
        for label in SourceLabel::ALL {
            let row: Vec<String> = self.confusion[label.index()]
                .iter()
                .map(|c| format!("{c:>6}"))
                .collect();
            writeln!(f, "{:>14} {}", label.as_str(), row.join(""))?;
        }
        Ok(())
    }
}
