//! Per-class counts of truth against prediction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::knn::Prediction;
use crate::record::{Label, NUM_CLASSES};

/// Counts of (truth, predicted) label pairs over the ten classes.
///
/// Row = ground truth, column = prediction.
///
/// # Example
///
/// ```
/// use cifar_knn::knn::Prediction;
/// use cifar_knn::metrics::ConfusionMatrix;
///
/// let predictions = [
///     Prediction { index: 0, label: 1, confidence: 1.0, truth: 1 },
///     Prediction { index: 1, label: 2, confidence: 0.6, truth: 1 },
/// ];
/// let cm = ConfusionMatrix::from_predictions(&predictions);
/// assert_eq!(cm.get(1, 1), 1);
/// assert_eq!(cm.get(1, 2), 1);
/// assert_eq!(cm.recall(1), Some(0.5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[usize; NUM_CLASSES]; NUM_CLASSES],
}

impl ConfusionMatrix {
    /// Tallies `predictions`.
    ///
    /// # Panics
    ///
    /// Panics if a prediction carries a label or truth outside `0..=9`, which
    /// only happens for values built or deserialized by hand.
    #[must_use]
    pub fn from_predictions(predictions: &[Prediction]) -> Self {
        let mut counts = [[0usize; NUM_CLASSES]; NUM_CLASSES];
        for p in predictions {
            assert!(
                usize::from(p.truth) < NUM_CLASSES && usize::from(p.label) < NUM_CLASSES,
                "prediction {} has label {} / truth {}, expected 0..=9",
                p.index,
                p.label,
                p.truth
            );
            counts[usize::from(p.truth)][usize::from(p.label)] += 1;
        }
        Self { counts }
    }

    /// Images of class `truth` predicted as `predicted`.
    #[must_use]
    pub fn get(&self, truth: Label, predicted: Label) -> usize {
        self.counts[usize::from(truth)][usize::from(predicted)]
    }

    /// Number of tallied images.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Number of correctly classified images (the diagonal).
    #[must_use]
    pub fn correct(&self) -> usize {
        (0..NUM_CLASSES).map(|i| self.counts[i][i]).sum()
    }

    /// Images whose ground truth is `truth`.
    #[must_use]
    pub fn support(&self, truth: Label) -> usize {
        self.counts[usize::from(truth)].iter().sum()
    }

    /// Fraction of class `truth` predicted correctly, `None` without support.
    #[must_use]
    pub fn recall(&self, truth: Label) -> Option<f64> {
        let support = self.support(truth);
        (support > 0).then(|| self.get(truth, truth) as f64 / support as f64)
    }

    /// Fraction of predictions of `predicted` that were right, `None` if the
    /// label was never predicted.
    #[must_use]
    pub fn precision(&self, predicted: Label) -> Option<f64> {
        let column = usize::from(predicted);
        let predicted_total: usize = self.counts.iter().map(|row| row[column]).sum();
        (predicted_total > 0).then(|| self.get(predicted, predicted) as f64 / predicted_total as f64)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "truth\\pred")?;
        for label in 0..NUM_CLASSES {
            write!(f, "{label:>6}")?;
        }
        writeln!(f)?;
        for (truth, row) in self.counts.iter().enumerate() {
            write!(f, "{truth:>10}")?;
            for count in row {
                write!(f, "{count:>6}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
