//! Background classification on a dedicated thread.
//!
//! [`spawn`] validates the input, starts the run on a `knn-worker` thread and
//! hands back a [`ClassificationHandle`]. The caller polls or drains the
//! event stream, may request a stop at any time, and joins for the result.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use super::classifier::{ClassificationResult, KnnClassifier};
use super::progress::{ChannelObserver, ProgressEvent, RunState};
use crate::error::ClassifierError;
use crate::record::ImageRecord;

/// Name given to worker threads.
pub const WORKER_THREAD_NAME: &str = "knn-worker";

/// Handle to a classification running on a worker thread.
///
/// Each handle owns the event stream of exactly one run.
#[derive(Debug)]
pub struct ClassificationHandle {
    classifier: Arc<KnnClassifier>,
    events: Receiver<ProgressEvent>,
    latest: Arc<AtomicU8>,
    thread: JoinHandle<ClassificationResult>,
}

impl ClassificationHandle {
    /// Asks the worker to stop before its next comparison. Idempotent.
    pub fn request_stop(&self) {
        self.classifier.request_stop();
    }

    /// Latest published percentage.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.latest.load(Ordering::Acquire)
    }

    /// Shared cell behind [`progress`](Self::progress), readable after
    /// [`join`](Self::join) consumes the handle.
    pub(crate) fn progress_cell(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.latest)
    }

    /// Classifier state as seen right now.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.classifier.state()
    }

    /// Whether the worker thread has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Event stream of this run. Iterating blocks until the worker finishes.
    #[must_use]
    pub fn events(&self) -> &Receiver<ProgressEvent> {
        &self.events
    }

    /// Events published since the last drain, without blocking.
    #[must_use]
    pub fn drain_events(&self) -> Vec<ProgressEvent> {
        let mut drained = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => drained.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return drained,
            }
        }
    }

    /// Waits for the worker and returns its result.
    ///
    /// # Errors
    ///
    /// [`ClassifierError::WorkerPanicked`] if the worker panicked. The
    /// classifier is then back in `Idle`.
    pub fn join(self) -> Result<ClassificationResult, ClassifierError> {
        self.thread.join().map_err(|_| {
            self.classifier.abandon_run();
            ClassifierError::WorkerPanicked
        })
    }
}

/// Starts `classifier` on a new worker thread.
///
/// Input is validated and the classifier switched to `Running` on the calling
/// thread, so bad `k`, empty datasets or a classifier already in use fail
/// here before any work is scheduled.
///
/// # Errors
///
/// Validation errors from [`KnnClassifier::validate`],
/// [`ClassifierError::AlreadyRunning`] if the classifier is mid-run, and
/// [`ClassifierError::WorkerSpawn`] if the thread cannot be created.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use cifar_knn::knn::{spawn, KnnClassifier, RunState};
/// use cifar_knn::record::ImageRecord;
///
/// let train: Arc<[ImageRecord]> = vec![ImageRecord::filled(5, 2)].into();
/// let test: Arc<[ImageRecord]> = vec![ImageRecord::filled(6, 2)].into();
///
/// let handle = spawn(Arc::new(KnnClassifier::new(1)), train, test).expect("valid input");
/// let result = handle.join().expect("worker finished");
/// assert_eq!(result.state, RunState::Completed);
/// assert_eq!(result.correct(), 1);
/// ```
pub fn spawn(
    classifier: Arc<KnnClassifier>,
    train: Arc<[ImageRecord]>,
    test: Arc<[ImageRecord]>,
) -> Result<ClassificationHandle, ClassifierError> {
    classifier.validate(&train, &test)?;
    classifier.begin_run()?;

    let (sender, events) = mpsc::channel();
    let observer = ChannelObserver::new(sender);
    let latest = observer.latest();

    let worker_classifier = Arc::clone(&classifier);
    let spawned = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            debug!("worker started");
            worker_classifier.execute(&train, &test, &observer, || false)
        });
    let thread = match spawned {
        Ok(thread) => thread,
        Err(e) => {
            classifier.abandon_run();
            return Err(ClassifierError::WorkerSpawn(e.to_string()));
        }
    };

    Ok(ClassificationHandle {
        classifier,
        events,
        latest,
        thread,
    })
}
