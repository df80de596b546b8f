//! Session controller for interactive front ends.
//!
//! A [`Session`] holds the user's choices (training files, test input, `k`),
//! validates them, runs the classification on a worker thread and keeps the
//! last result. It has no UI of its own: a front end calls these methods and
//! polls [`Session::progress`] / [`Session::state`].
//!
//! # Example
//!
//! ```no_run
//! use cifar_knn::session::Session;
//!
//! let mut session = Session::new();
//! session.set_training_inputs(vec!["data_batch_1.bin".into()]).expect(".bin input");
//! session.set_test_input("test_images".into()).expect("directory of .png files");
//! session.set_k(3).expect("k in 1..=10");
//! session.start().expect("inputs decode");
//! let result = session.wait().expect("run finished");
//! println!("accuracy: {:?}", result.accuracy_percent());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::info;

use crate::config::{KnnConfig, DEFAULT_K, MAX_SESSION_K};
use crate::dataset::{has_extension, load_dataset, PACKED_EXTENSION, RASTER_EXTENSION};
use crate::error::{ClassifierError, KnnError, SessionError};
use crate::knn::{spawn, ClassificationHandle, ClassificationResult, KnnClassifier, RunState};

/// Inputs, settings and the current run of one user session.
#[derive(Debug, Default)]
pub struct Session {
    training_inputs: Vec<PathBuf>,
    test_input: Option<PathBuf>,
    config: KnnConfig,
    handle: Option<ClassificationHandle>,
    result: Option<ClassificationResult>,
    last_progress: u8,
    single_test: bool,
}

impl Session {
    /// Session with default settings and no inputs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session starting from `config`.
    #[must_use]
    pub fn with_config(config: KnnConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Sets the training files; every one must be a `.bin` container.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidTrainingInput`] naming the first bad path. The
    /// previous inputs are kept.
    pub fn set_training_inputs(&mut self, paths: Vec<PathBuf>) -> Result<(), SessionError> {
        if let Some(bad) = paths.iter().find(|p| !has_extension(p, PACKED_EXTENSION)) {
            return Err(SessionError::InvalidTrainingInput(bad.clone()));
        }
        self.training_inputs = paths;
        Ok(())
    }

    /// Sets the test input: a `.png` file or a directory holding only `.png`
    /// files.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidTestInput`]. The previous input is kept.
    pub fn set_test_input(&mut self, path: PathBuf) -> Result<(), SessionError> {
        if !is_valid_test_input(&path) {
            return Err(SessionError::InvalidTestInput(path));
        }
        self.test_input = Some(path);
        Ok(())
    }

    /// Sets `k` for the next run.
    ///
    /// # Errors
    ///
    /// [`ClassifierError::InvalidArgument`] outside `1..=10`.
    pub fn set_k(&mut self, k: usize) -> Result<(), ClassifierError> {
        if !(1..=MAX_SESSION_K).contains(&k) {
            return Err(ClassifierError::InvalidArgument {
                param: "k".to_string(),
                value: k.to_string(),
                constraint: format!("1..={MAX_SESSION_K}"),
            });
        }
        self.config.k = k;
        Ok(())
    }

    /// `k` for the next run.
    #[must_use]
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Selected training files.
    #[must_use]
    pub fn training_inputs(&self) -> &[PathBuf] {
        &self.training_inputs
    }

    /// Selected test input.
    #[must_use]
    pub fn test_input(&self) -> Option<&Path> {
        self.test_input.as_deref()
    }

    /// Short label for the training selection: the first file name, with
    /// `", ..."` appended when more files follow.
    #[must_use]
    pub fn training_summary(&self) -> String {
        let Some(first) = self.training_inputs.first() else {
            return String::new();
        };
        let mut summary = file_name(first);
        if self.training_inputs.len() > 1 {
            summary.push_str(", ...");
        }
        summary
    }

    /// File name of the test input, empty if none is set.
    #[must_use]
    pub fn test_summary(&self) -> String {
        self.test_input.as_deref().map(file_name).unwrap_or_default()
    }

    /// Decodes both inputs and starts classification on a worker thread.
    ///
    /// The test input is decoded first, then the training files. On success
    /// [`state`](Self::state) already reports `Running`.
    ///
    /// # Errors
    ///
    /// [`ClassifierError::AlreadyRunning`] while a previous run is still
    /// going, [`SessionError::MissingInput`], any
    /// [`DecodeError`](crate::error::DecodeError), and classifier validation
    /// errors. Nothing is left running on error.
    pub fn start(&mut self) -> Result<(), KnnError> {
        if self.state() == RunState::Running {
            return Err(ClassifierError::AlreadyRunning.into());
        }
        if self.training_inputs.is_empty() {
            return Err(SessionError::MissingInput("training").into());
        }
        let test_input = self
            .test_input
            .clone()
            .ok_or(SessionError::MissingInput("test"))?;

        let test = load_dataset(&[test_input])?;
        let train = load_dataset(&self.training_inputs)?;
        self.single_test = test.len() == 1;
        info!(
            train = train.len(),
            test = test.len(),
            k = self.config.k,
            "session starting classification"
        );

        let classifier = Arc::new(KnnClassifier::from_config(self.config));
        self.result = None;
        self.last_progress = 0;
        self.handle = Some(spawn(classifier, train.into(), test.into())?);
        Ok(())
    }

    /// Requests the running classification to stop.
    pub fn stop(&self) {
        if let Some(handle) = &self.handle {
            handle.request_stop();
        }
    }

    /// Latest progress percentage.
    ///
    /// 0 before any run. After [`wait`](Self::wait) it stays at the last
    /// published value, so a stopped run keeps showing how far it got.
    #[must_use]
    pub fn progress(&self) -> u8 {
        match &self.handle {
            Some(handle) => handle.progress(),
            None => self.last_progress,
        }
    }

    /// State of the current or last run.
    #[must_use]
    pub fn state(&self) -> RunState {
        match (&self.handle, &self.result) {
            (Some(handle), _) => handle.state(),
            (None, Some(result)) => result.state,
            (None, None) => RunState::Idle,
        }
    }

    /// Whether the last started run had exactly one test image.
    #[must_use]
    pub fn is_single_test(&self) -> bool {
        self.single_test
    }

    /// Blocks until the current run ends and returns its result.
    ///
    /// After the first call the result is cached and returned again.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotStarted`] if nothing was started, or the worker's
    /// error.
    pub fn wait(&mut self) -> Result<&ClassificationResult, KnnError> {
        if let Some(handle) = self.handle.take() {
            let progress = handle.progress_cell();
            let joined = handle.join();
            self.last_progress = progress.load(Ordering::Acquire);
            self.result = Some(joined?);
        }
        self.result
            .as_ref()
            .ok_or_else(|| SessionError::NotStarted.into())
    }

    /// Result of the last finished run, if collected with [`wait`](Self::wait).
    #[must_use]
    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    /// Stops any run and returns to the initial state: no inputs, default
    /// `k`, no result.
    pub fn reset(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.request_stop();
            // Only the side effect of waiting matters here.
            let _ = handle.join();
        }
        self.training_inputs.clear();
        self.test_input = None;
        self.config.k = DEFAULT_K;
        self.result = None;
        self.last_progress = 0;
        self.single_test = false;
    }
}

fn is_valid_test_input(path: &Path) -> bool {
    if path.is_dir() {
        return match std::fs::read_dir(path) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .all(|entry| has_extension(&entry.path(), RASTER_EXTENSION)),
            Err(_) => false,
        };
    }
    has_extension(path, RASTER_EXTENSION)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
