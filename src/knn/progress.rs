//! Run state, progress observers and cooperative cancellation.
//!
//! A run reports through a [`ProgressObserver`]: first
//! [`RunState::Running`], then progress percentages that never decrease and
//! end at 100 on normal completion, then the terminal state.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Lifecycle of a classifier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Constructed or reset, no run yet.
    Idle,
    /// Comparisons in progress.
    Running,
    /// Every test image was classified.
    Completed,
    /// Stopped on request; the result holds the images finished before that.
    Cancelled,
}

impl RunState {
    /// Whether the run has ended, normally or not.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Cancelled,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Item of the event stream produced by [`ChannelObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Percentage of pairwise comparisons done.
    Progress(u8),
    /// State transition.
    State(RunState),
}

/// Receives progress and state notifications from a run.
///
/// Implementations are called from the thread doing the comparisons (or from
/// rayon workers in parallel mode), so they must be `Send + Sync`.
pub trait ProgressObserver: Send + Sync {
    /// Called whenever the integer percentage increases.
    fn on_progress(&self, percent: u8);

    /// Called on entering `Running` and on reaching a terminal state.
    fn on_state(&self, _state: RunState) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _percent: u8) {}
}

/// Adapts a `FnMut(u8)` progress callback.
#[derive(Debug)]
pub struct FnObserver<F> {
    callback: Mutex<F>,
}

impl<F: FnMut(u8) + Send> FnObserver<F> {
    /// Wraps `callback`.
    pub fn new(callback: F) -> Self {
        Self {
            callback: Mutex::new(callback),
        }
    }
}

impl<F: FnMut(u8) + Send> ProgressObserver for FnObserver<F> {
    fn on_progress(&self, percent: u8) {
        let mut callback = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
        (*callback)(percent);
    }
}

/// Forwards events over an mpsc channel and remembers the latest percentage.
#[derive(Debug)]
pub struct ChannelObserver {
    sender: Sender<ProgressEvent>,
    latest: Arc<AtomicU8>,
}

impl ChannelObserver {
    /// Creates an observer sending to `sender`.
    #[must_use]
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self {
            sender,
            latest: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Shared cell holding the most recent percentage.
    #[must_use]
    pub fn latest(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.latest)
    }

    fn send(&self, event: ProgressEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.sender.send(event);
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, percent: u8) {
        self.latest.store(percent, Ordering::Release);
        self.send(ProgressEvent::Progress(percent));
    }

    fn on_state(&self, state: RunState) {
        self.send(ProgressEvent::State(state));
    }
}

/// Shared cancellation flag.
///
/// Cloning shares the flag. [`StopFlag::request_stop`] is idempotent and may
/// be called from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    stopped: Arc<AtomicBool>,
}

impl StopFlag {
    /// A flag that is not set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the run to stop before its next comparison.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Clears the flag so a new run may proceed.
    pub fn clear(&self) {
        self.stopped.store(false, Ordering::Release);
    }
}

/// Counts comparisons against a fixed total and publishes each new
/// percentage exactly once, in increasing order.
pub(crate) struct ProgressTracker<'a, O: ProgressObserver + ?Sized> {
    observer: &'a O,
    total: usize,
    completed: AtomicUsize,
    published: AtomicU8,
    publish_lock: Mutex<()>,
}

impl<'a, O: ProgressObserver + ?Sized> ProgressTracker<'a, O> {
    pub(crate) fn new(observer: &'a O, total: usize) -> Self {
        debug_assert!(total > 0);
        Self {
            observer,
            total,
            completed: AtomicUsize::new(0),
            published: AtomicU8::new(0),
            publish_lock: Mutex::new(()),
        }
    }

    /// Publishes the starting 0%.
    pub(crate) fn start(&self) {
        self.observer.on_progress(0);
    }

    /// Records one finished comparison.
    pub(crate) fn advance(&self) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        let percent = (done.saturating_mul(100) / self.total).min(100) as u8;
        if percent <= self.published.load(Ordering::Acquire) {
            return;
        }

        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if percent > self.published.load(Ordering::Acquire) {
            self.published.store(percent, Ordering::Release);
            self.observer.on_progress(percent);
        }
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}
