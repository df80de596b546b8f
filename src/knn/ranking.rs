//! Candidate ranking and majority voting.

use std::hash::{Hash, Hasher};

use crate::record::{Label, NUM_CLASSES};

/// Distance from one test image to one training image, with that training
/// image's label.
///
/// Equality and hashing look at the label only, so two entries "match" when
/// they vote for the same class regardless of how far away they are.
#[derive(Debug, Clone, Copy)]
pub struct RankingEntry {
    /// Euclidean distance in packed-pixel space
    pub distance: f64,
    /// Label of the training image
    pub label: Label,
}

impl RankingEntry {
    /// Creates an entry.
    ///
    /// # Panics
    ///
    /// Panics if `label` is outside `0..=9`.
    #[must_use]
    pub fn new(distance: f64, label: Label) -> Self {
        assert!(usize::from(label) < NUM_CLASSES, "label {label} out of range");
        Self { distance, label }
    }
}

impl PartialEq for RankingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for RankingEntry {}

impl Hash for RankingEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

impl std::fmt::Display for RankingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.distance, self.label)
    }
}

/// Occurrences of each label among a set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelCounts([usize; NUM_CLASSES]);

impl LabelCounts {
    /// Tallies the labels of `entries`.
    ///
    /// # Panics
    ///
    /// Panics if an entry built through its public fields carries a label
    /// outside `0..=9`.
    #[must_use]
    pub fn tally(entries: &[RankingEntry]) -> Self {
        let mut counts = [0usize; NUM_CLASSES];
        for entry in entries {
            assert!(
                usize::from(entry.label) < NUM_CLASSES,
                "label {} out of range",
                entry.label
            );
            counts[usize::from(entry.label)] += 1;
        }
        Self(counts)
    }

    /// Occurrences of `label`.
    ///
    /// # Panics
    ///
    /// Panics if `label` is outside `0..=9`.
    #[must_use]
    pub fn get(&self, label: Label) -> usize {
        self.0[usize::from(label)]
    }

    /// Highest count of any label.
    #[must_use]
    pub fn max(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

/// Outcome of voting among the k nearest entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote {
    /// Winning label
    pub label: Label,
    /// Entries carrying the winning label
    pub votes: usize,
    /// `votes / k`
    pub confidence: f64,
}

/// Sorts `entries` by ascending distance and keeps the first `k`.
///
/// The sort is stable: equal distances keep training-set order.
#[must_use]
pub fn select_nearest(mut entries: Vec<RankingEntry>, k: usize) -> Vec<RankingEntry> {
    entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    entries.truncate(k);
    entries
}

/// Majority vote over distance-sorted `nearest` entries.
///
/// The winner is the most frequent label. Among labels tied on frequency,
/// the one whose first entry comes earliest in `nearest` wins, which is
/// what a stable re-sort by descending frequency would put first.
///
/// Returns `None` for an empty slice.
///
/// # Panics
///
/// As [`LabelCounts::tally`].
///
/// # Example
///
/// ```
/// use cifar_knn::knn::ranking::{vote, RankingEntry};
///
/// let nearest = [
///     RankingEntry::new(1.0, 4),
///     RankingEntry::new(2.0, 7),
///     RankingEntry::new(3.0, 7),
///     RankingEntry::new(4.0, 4),
///     RankingEntry::new(5.0, 2),
/// ];
/// let vote = vote(&nearest).expect("non-empty");
/// assert_eq!(vote.label, 4);
/// assert_eq!(vote.votes, 2);
/// assert!((vote.confidence - 0.4).abs() < 1e-12);
/// ```
#[must_use]
pub fn vote(nearest: &[RankingEntry]) -> Option<Vote> {
    let counts = LabelCounts::tally(nearest);
    let votes = counts.max();
    let winner = nearest.iter().find(|entry| counts.get(entry.label) == votes)?;
    Some(Vote {
        label: winner.label,
        votes,
        confidence: votes as f64 / nearest.len() as f64,
    })
}
