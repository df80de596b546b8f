//! Brute-force k-nearest-neighbor classifier.
//!
//! Every test image is compared with every training image. The `k` closest
//! training images vote on the label, and the fraction of votes for the
//! winner is the confidence.

use std::sync::atomic::{AtomicU8, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::progress::{FnObserver, ProgressObserver, ProgressTracker, RunState, StopFlag};
use super::ranking::{select_nearest, vote, RankingEntry};
use crate::config::{ExecutionMode, KnnConfig};
use crate::error::ClassifierError;
use crate::metrics::ConfusionMatrix;
use crate::record::{ImageRecord, Label};

/// Classification of one test image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Position of the image in the test set
    pub index: usize,
    /// Voted label
    pub label: Label,
    /// Fraction of the k nearest neighbors carrying `label`
    pub confidence: f64,
    /// Ground-truth label of the test image
    pub truth: Label,
}

impl Prediction {
    /// Whether the vote matched the ground truth.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.label == self.truth
    }
}

/// Outcome of a run.
///
/// `predictions` holds every test image whose vote finished, in test-set
/// order. After a cancellation it is a subset of the test set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// `Completed` or `Cancelled`
    pub state: RunState,
    /// Number of neighbors that voted
    pub k: usize,
    /// Per-image results
    pub predictions: Vec<Prediction>,
    /// Size of the test set given to the run
    pub total_test_images: usize,
}

impl ClassificationResult {
    /// Test images actually classified.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.predictions.len()
    }

    /// Correctly classified test images.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.predictions.iter().filter(|p| p.is_correct()).count()
    }

    /// Percentage of processed images classified correctly.
    ///
    /// Images skipped by a cancellation are not counted. `None` if no image
    /// was processed.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let processed = self.processed();
        if processed == 0 {
            return None;
        }
        Some(self.correct() as f64 * 100.0 / processed as f64)
    }

    /// [`accuracy`](Self::accuracy) rounded to a whole percentage.
    #[must_use]
    pub fn accuracy_percent(&self) -> Option<u32> {
        self.accuracy().map(|a| a.round() as u32)
    }

    /// Whether the test set held exactly one image.
    #[must_use]
    pub fn is_single_test(&self) -> bool {
        self.total_test_images == 1
    }

    /// Estimated label and confidence of a single-image test set.
    #[must_use]
    pub fn single(&self) -> Option<&Prediction> {
        if self.is_single_test() {
            self.predictions.first()
        } else {
            None
        }
    }

    /// Whether the run stopped early.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state == RunState::Cancelled
    }

    /// Confusion matrix over the processed images.
    #[must_use]
    pub fn confusion_matrix(&self) -> ConfusionMatrix {
        ConfusionMatrix::from_predictions(&self.predictions)
    }
}

/// K-nearest-neighbor classifier over [`ImageRecord`]s.
///
/// State machine: `Idle -> Running -> {Completed | Cancelled}`.
/// [`request_stop`](Self::request_stop) latches until [`reset`](Self::reset),
/// so a run started after a stop ends immediately as `Cancelled`.
///
/// # Example
///
/// ```
/// use cifar_knn::knn::{KnnClassifier, NoProgress, RunState};
/// use cifar_knn::record::ImageRecord;
///
/// let train = vec![
///     ImageRecord::filled(0x000010, 3),
///     ImageRecord::filled(0x100000, 7),
/// ];
/// let test = vec![ImageRecord::filled(0x000010, 3)];
///
/// let knn = KnnClassifier::new(1);
/// let result = knn.run(&train, &test, &NoProgress).expect("valid input");
/// assert_eq!(result.state, RunState::Completed);
/// let single = result.single().expect("one test image");
/// assert_eq!(single.label, 3);
/// assert_eq!(single.confidence, 1.0);
/// ```
#[derive(Debug)]
pub struct KnnClassifier {
    config: KnnConfig,
    stop: StopFlag,
    state: AtomicU8,
}

impl KnnClassifier {
    /// Classifier with `k` neighbors and sequential execution.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self::from_config(KnnConfig::default().with_k(k))
    }

    /// Classifier with the given settings.
    #[must_use]
    pub fn from_config(config: KnnConfig) -> Self {
        Self {
            config,
            stop: StopFlag::new(),
            state: AtomicU8::new(RunState::Idle.as_u8()),
        }
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.config.execution = execution;
        self
    }

    /// Number of neighbors.
    #[must_use]
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> &KnnConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Handle to the stop flag, for callers on other threads.
    #[must_use]
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Asks a running classification to stop before its next comparison.
    /// Idempotent.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// Returns to `Idle` and clears the stop flag.
    ///
    /// # Errors
    ///
    /// [`ClassifierError::AlreadyRunning`] while a run is in progress.
    pub fn reset(&self) -> Result<(), ClassifierError> {
        let current = self.state.load(Ordering::Acquire);
        if current == RunState::Running.as_u8() {
            return Err(ClassifierError::AlreadyRunning);
        }
        self.state
            .compare_exchange(
                current,
                RunState::Idle.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| ClassifierError::AlreadyRunning)?;
        self.stop.clear();
        Ok(())
    }

    /// Checks `k` and both datasets before any comparison.
    ///
    /// # Errors
    ///
    /// [`ClassifierError::EmptyDataset`] if either set is empty,
    /// [`ClassifierError::InvalidArgument`] if `k` is zero or larger than the
    /// training set.
    pub fn validate(&self, train: &[ImageRecord], test: &[ImageRecord]) -> Result<(), ClassifierError> {
        if train.is_empty() {
            return Err(ClassifierError::empty("training set"));
        }
        if test.is_empty() {
            return Err(ClassifierError::empty("test set"));
        }
        self.validate_k(train.len())
    }

    fn validate_k(&self, n_train: usize) -> Result<(), ClassifierError> {
        if self.config.k == 0 || self.config.k > n_train {
            return Err(ClassifierError::invalid_k(self.config.k, n_train));
        }
        Ok(())
    }

    /// Classifies a single image without progress reporting or cancellation.
    ///
    /// # Errors
    ///
    /// As [`validate`](Self::validate) for a one-image test set.
    pub fn predict(&self, train: &[ImageRecord], image: &ImageRecord) -> Result<Prediction, ClassifierError> {
        if train.is_empty() {
            return Err(ClassifierError::empty("training set"));
        }
        self.validate_k(train.len())?;

        let ranking = train
            .iter()
            .map(|t| RankingEntry::new(t.distance(image), t.label()))
            .collect();
        Ok(self.decide(ranking, 0, image))
    }

    /// Classifies every test image, reporting to `observer`.
    ///
    /// # Errors
    ///
    /// Validation errors (see [`validate`](Self::validate)) and
    /// [`ClassifierError::AlreadyRunning`]. Cancellation is not an error: the
    /// result then has state `Cancelled`.
    pub fn run<O>(
        &self,
        train: &[ImageRecord],
        test: &[ImageRecord],
        observer: &O,
    ) -> Result<ClassificationResult, ClassifierError>
    where
        O: ProgressObserver + ?Sized,
    {
        self.run_with_cancel(train, test, observer, || false)
    }

    /// Like [`run`](Self::run), with an extra cancellation check consulted
    /// alongside the stop flag before every comparison.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run).
    pub fn run_with_cancel<O, C>(
        &self,
        train: &[ImageRecord],
        test: &[ImageRecord],
        observer: &O,
        should_cancel: C,
    ) -> Result<ClassificationResult, ClassifierError>
    where
        O: ProgressObserver + ?Sized,
        C: Fn() -> bool + Sync,
    {
        self.validate(train, test)?;
        self.begin_run()?;
        Ok(self.execute(train, test, observer, should_cancel))
    }

    /// Claims the classifier for a run: any non-running state moves to
    /// `Running` in one atomic step.
    pub(crate) fn begin_run(&self) -> Result<(), ClassifierError> {
        let running = RunState::Running.as_u8();
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == running {
                return Err(ClassifierError::AlreadyRunning);
            }
            match self.state.compare_exchange_weak(
                current,
                running,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Returns to `Idle` after a run claimed by [`begin_run`](Self::begin_run)
    /// that never produced a result.
    pub(crate) fn abandon_run(&self) {
        self.state.store(RunState::Idle.as_u8(), Ordering::Release);
    }

    /// Run body for a classifier already in `Running` with validated input.
    pub(crate) fn execute<O, C>(
        &self,
        train: &[ImageRecord],
        test: &[ImageRecord],
        observer: &O,
        should_cancel: C,
    ) -> ClassificationResult
    where
        O: ProgressObserver + ?Sized,
        C: Fn() -> bool + Sync,
    {
        debug_assert_eq!(self.state(), RunState::Running);
        info!(
            k = self.config.k,
            train = train.len(),
            test = test.len(),
            execution = ?self.config.execution,
            "starting knn classification"
        );
        observer.on_state(RunState::Running);

        let tracker = ProgressTracker::new(observer, train.len() * test.len());
        tracker.start();
        let is_cancelled = || self.stop.is_set() || should_cancel();

        let predictions: Vec<Prediction> = match self.config.execution {
            ExecutionMode::Sequential => {
                let mut predictions = Vec::with_capacity(test.len());
                for (index, image) in test.iter().enumerate() {
                    match self.evaluate(train, index, image, &tracker, &is_cancelled) {
                        Some(prediction) => predictions.push(prediction),
                        None => break,
                    }
                }
                predictions
            }
            ExecutionMode::Parallel => test
                .par_iter()
                .enumerate()
                .map(|(index, image)| self.evaluate(train, index, image, &tracker, &is_cancelled))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect(),
        };

        let state = if predictions.len() == test.len() {
            RunState::Completed
        } else {
            RunState::Cancelled
        };
        self.state.store(state.as_u8(), Ordering::Release);

        let result = ClassificationResult {
            state,
            k: self.config.k,
            predictions,
            total_test_images: test.len(),
        };
        match state {
            RunState::Cancelled => warn!(
                processed = result.processed(),
                total = test.len(),
                comparisons = tracker.completed(),
                "knn classification cancelled"
            ),
            _ => info!(
                correct = result.correct(),
                total = test.len(),
                accuracy = ?result.accuracy(),
                "knn classification completed"
            ),
        }
        observer.on_state(state);
        result
    }

    /// Compares one test image with the whole training set and votes.
    /// Returns `None` if cancelled before the last comparison.
    fn evaluate<O, C>(
        &self,
        train: &[ImageRecord],
        index: usize,
        image: &ImageRecord,
        tracker: &ProgressTracker<'_, O>,
        is_cancelled: &C,
    ) -> Option<Prediction>
    where
        O: ProgressObserver + ?Sized,
        C: Fn() -> bool,
    {
        let mut ranking = Vec::with_capacity(train.len());
        for candidate in train {
            if is_cancelled() {
                return None;
            }
            ranking.push(RankingEntry::new(candidate.distance(image), candidate.label()));
            tracker.advance();
        }

        let prediction = self.decide(ranking, index, image);
        debug!(
            index,
            label = prediction.label,
            truth = prediction.truth,
            confidence = prediction.confidence,
            "classified test image"
        );
        Some(prediction)
    }

    fn decide(&self, ranking: Vec<RankingEntry>, index: usize, image: &ImageRecord) -> Prediction {
        let nearest = select_nearest(ranking, self.config.k);
        let vote = vote(&nearest).expect("Neighbors slice is non-empty (1 <= k <= train size)");
        Prediction {
            index,
            label: vote.label,
            confidence: vote.confidence,
            truth: image.label(),
        }
    }
}

/// One-shot classification with closures for progress and cancellation.
///
/// `on_progress` receives non-decreasing percentages ending at 100 when the
/// run completes. `should_cancel` is polled before every comparison.
///
/// # Errors
///
/// As [`KnnClassifier::run`].
///
/// # Example
///
/// ```
/// use cifar_knn::knn::classify;
/// use cifar_knn::record::ImageRecord;
///
/// let train = vec![ImageRecord::filled(1, 0), ImageRecord::filled(900, 1)];
/// let test = vec![ImageRecord::filled(2, 0), ImageRecord::filled(880, 1)];
///
/// let mut last = 0;
/// let result = classify(1, &train, &test, |p| last = p, || false).expect("valid");
/// assert_eq!(last, 100);
/// assert_eq!(result.accuracy(), Some(100.0));
/// ```
pub fn classify<F, C>(
    k: usize,
    train: &[ImageRecord],
    test: &[ImageRecord],
    on_progress: F,
    should_cancel: C,
) -> Result<ClassificationResult, ClassifierError>
where
    F: FnMut(u8) + Send,
    C: Fn() -> bool + Sync,
{
    let observer = FnObserver::new(on_progress);
    KnnClassifier::new(k).run_with_cancel(train, test, &observer, should_cancel)
}

/// Classifies a single image with `k` neighbors.
///
/// # Errors
///
/// As [`KnnClassifier::predict`].
pub fn predict_one(k: usize, train: &[ImageRecord], image: &ImageRecord) -> Result<Prediction, ClassifierError> {
    KnnClassifier::new(k).predict(train, image)
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::from_config(KnnConfig::default())
    }
}

